//! Scalar extraction from untyped JSON values.
//!
//! Only the waypoint time field goes through the required path; every other
//! numeric field is optional and degrades to `None` on null or a wrong type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::TypeMismatch;

/// Read a JSON number as whole epoch seconds, truncating toward zero.
///
/// Integers are taken as-is so large values don't lose precision through
/// `f64`. Anything that isn't a number, null included, is a `TypeMismatch`.
pub fn number_to_epoch_seconds(value: &Value) -> Result<i64, TypeMismatch> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
        .ok_or_else(|| TypeMismatch {
            value: value.clone(),
        })
}

/// `Some` for any JSON number, `None` for null or any other type.
pub fn optional_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Whole-second epoch to UTC. `None` outside chrono's range.
pub fn epoch_to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Deserialize a field, reading null as the type's default.
///
/// Pair with `#[serde(default)]` so a missing key behaves the same way.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_epoch_seconds_from_integer() {
        assert_eq!(number_to_epoch_seconds(&json!(1600000000)), Ok(1600000000));
    }

    #[test]
    fn test_epoch_seconds_truncates_fraction() {
        assert_eq!(number_to_epoch_seconds(&json!(1600000000.9)), Ok(1600000000));
        assert_eq!(number_to_epoch_seconds(&json!(-1.5)), Ok(-1));
    }

    #[test]
    fn test_epoch_seconds_rejects_non_numbers() {
        for value in [json!("1600000000"), json!(true), json!(null), json!([1])] {
            let err = number_to_epoch_seconds(&value).unwrap_err();
            assert_eq!(err.value, value);
        }
    }

    #[test]
    fn test_type_mismatch_names_value() {
        let err = number_to_epoch_seconds(&json!("noon")).unwrap_err();
        assert_eq!(err.to_string(), "couldn't parse \"noon\" as number");
    }

    #[test]
    fn test_optional_f64() {
        assert_eq!(optional_f64(&json!(46.1)), Some(46.1));
        assert_eq!(optional_f64(&json!(12)), Some(12.0));
        assert_eq!(optional_f64(&json!(null)), None);
        assert_eq!(optional_f64(&json!("46.1")), None);
        assert_eq!(optional_f64(&json!(false)), None);
    }

    #[test]
    fn test_epoch_to_datetime() {
        let t = epoch_to_datetime(1600000000).unwrap();
        assert_eq!(t.timestamp(), 1600000000);
        assert!(epoch_to_datetime(i64::MAX).is_none());
    }
}

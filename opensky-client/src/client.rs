//! HTTP client for the OpenSky historical REST API.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, Request, StatusCode,
};
use thiserror::Error;

use opensky_core::config::{Config, DEFAULT_TIMEOUT_SECS};
use opensky_core::decode::{parse_flights, parse_track_response};
use opensky_core::query::{Query, TimeWindow, BASE_URL};
use opensky_core::types::{ErrorResponse, Flight, OpenSkyError, TrackResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    #[error("invalid response: {0}")]
    Decode(#[from] OpenSkyError),
}

/// Configuration for the OpenSky client.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Applies to every request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Basic auth is only sent when both parts are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        ClientConfig::new()
            .with_base_url(config.api.base_url.clone())
            .with_credentials(
                config.credentials.username.clone(),
                config.credentials.password.clone(),
            )
            .with_timeout(Duration::from_secs(config.api.timeout_secs))
    }
}

/// Client for the historical flights and tracks endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    client: Client,
    config: ClientConfig,
}

impl OpenSkyClient {
    /// Create a new OpenSky client.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// All flights within `[begin, end]`.
    ///
    /// The service answers 404 when nothing matched.
    pub async fn get_flights(&self, window: TimeWindow) -> Result<Vec<Flight>, ClientError> {
        self.fetch_flights(Query::AllFlights { window }).await
    }

    /// Flights of one aircraft, identified by its icao24 address.
    pub async fn get_flights_by_aircraft(
        &self,
        icao24: &str,
        window: TimeWindow,
    ) -> Result<Vec<Flight>, ClientError> {
        self.fetch_flights(Query::FlightsByAircraft {
            icao24: icao24.to_string(),
            window,
        })
        .await
    }

    /// Flights that arrived at `airport` (ICAO code) within the window.
    pub async fn get_arrivals_by_airport(
        &self,
        airport: &str,
        window: TimeWindow,
    ) -> Result<Vec<Flight>, ClientError> {
        self.fetch_flights(Query::Arrivals {
            airport: airport.to_string(),
            window,
        })
        .await
    }

    /// Flights that departed from `airport` (ICAO code) within the window.
    pub async fn get_departures_by_airport(
        &self,
        airport: &str,
        window: TimeWindow,
    ) -> Result<Vec<Flight>, ClientError> {
        self.fetch_flights(Query::Departures {
            airport: airport.to_string(),
            window,
        })
        .await
    }

    /// Trajectory of one aircraft at `time`.
    ///
    /// A single malformed waypoint fails the whole call.
    pub async fn get_track_by_aircraft(
        &self,
        icao24: &str,
        time: Option<DateTime<Utc>>,
    ) -> Result<TrackResponse, ClientError> {
        let body = self
            .fetch(&Query::Track {
                icao24: icao24.to_string(),
                time,
            })
            .await?;

        parse_track_response(&body).map_err(|e| {
            tracing::debug!("Track for {} rejected: {}", icao24, e);
            ClientError::Decode(e)
        })
    }

    async fn fetch_flights(&self, query: Query) -> Result<Vec<Flight>, ClientError> {
        let body = self.fetch(&query).await?;
        Ok(parse_flights(&body)?)
    }

    /// Build the HTTP request for a query without sending it.
    pub fn build_request(&self, query: &Query) -> Result<Request, ClientError> {
        let url = format!("{}{}", self.config.base_url, query.endpoint());
        let mut builder = self.client.get(url).query(&query.params());

        if self.config.has_credentials() {
            builder = builder.basic_auth(&self.config.username, Some(&self.config.password));
        }

        Ok(builder.build()?)
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<u8>, ClientError> {
        let request = self.build_request(query)?;
        tracing::debug!("Fetching: {}", request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            let message = upstream_message(status, &body);
            tracing::warn!("OpenSky returned {}: {}", status, message);
            return Err(ClientError::Upstream { status, message });
        }

        Ok(body.to_vec())
    }
}

/// Error text for a non-200 response: the body's `message` if it has one,
/// otherwise a generic line naming the status code.
fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            message: Some(message),
            ..
        }) if !message.is_empty() => message,
        _ => format!("unknown error, status code: {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn anonymous() -> OpenSkyClient {
        OpenSkyClient::new(ClientConfig::new()).unwrap()
    }

    /// Serve one canned HTTP response; the request head is sent back on the channel.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }
            let _ = tx.send(String::from_utf8_lossy(&buf[..read]).into_owned());

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}/api"), rx)
    }

    fn client_for(base_url: String) -> OpenSkyClient {
        OpenSkyClient::new(ClientConfig::new().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_url_without_bounds() {
        let client = anonymous();
        let request = client
            .build_request(&Query::AllFlights {
                window: TimeWindow::unbounded(),
            })
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://opensky-network.org/api/flights/all"
        );
        assert!(request.url().query().is_none());
    }

    #[test]
    fn test_url_with_bounds() {
        let client = anonymous();
        let request = client
            .build_request(&Query::FlightsByAircraft {
                icao24: "3c675a".into(),
                window: TimeWindow::new(at(1517184000), at(1517270400)),
            })
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://opensky-network.org/api/flights/aircraft?begin=1517184000&end=1517270400&icao24=3c675a"
        );
    }

    #[test]
    fn test_url_empty_airport_omitted() {
        let client = anonymous();
        let request = client
            .build_request(&Query::Arrivals {
                airport: String::new(),
                window: TimeWindow::new(at(1517227200), at(1517230800)),
            })
            .unwrap();
        assert_eq!(request.url().query(), Some("begin=1517227200&end=1517230800"));
    }

    #[test]
    fn test_url_live_track() {
        let request = anonymous()
            .build_request(&Query::Track {
                icao24: "3c4b26".into(),
                time: None,
            })
            .unwrap();
        assert_eq!(request.url().path(), "/api/tracks/all");
        assert_eq!(request.url().query(), Some("icao24=3c4b26"));
    }

    #[test]
    fn test_basic_auth_requires_both_parts() {
        let query = Query::AllFlights {
            window: TimeWindow::unbounded(),
        };

        let full = OpenSkyClient::new(
            ClientConfig::new().with_credentials("alice".into(), "secret".into()),
        )
        .unwrap();
        let request = full.build_request(&query).unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Basic YWxpY2U6c2VjcmV0"
        );

        let no_password =
            OpenSkyClient::new(ClientConfig::new().with_credentials("alice".into(), String::new()))
                .unwrap();
        let request = no_password.build_request(&query).unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());

        let request = anonymous().build_request(&query).unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_config_from_file_config() {
        let mut file = Config::default();
        file.credentials.username = "alice".into();
        file.credentials.password = "secret".into();
        file.api.base_url = "http://localhost:9000/api/".into();
        file.api.timeout_secs = 5;

        let config = ClientConfig::from(&file);
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.has_credentials());
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_upstream_message_from_body() {
        let body = br#"{"timestamp": 1600000000000, "status": 404, "error": "Not Found",
            "exception": null, "message": "No flights found", "path": "/api/flights/all"}"#;
        assert_eq!(
            upstream_message(StatusCode::NOT_FOUND, body),
            "No flights found"
        );
    }

    #[test]
    fn test_upstream_message_fallback() {
        assert_eq!(
            upstream_message(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>"),
            "unknown error, status code: 500"
        );
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, br#"{"status": 400}"#),
            "unknown error, status code: 400"
        );
        assert_eq!(
            upstream_message(StatusCode::FORBIDDEN, b""),
            "unknown error, status code: 403"
        );
    }

    #[tokio::test]
    async fn test_get_flights_roundtrip() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"[{"icao24": "3c675a", "firstSeen": 1517227000, "lastSeen": 1517230000,
                 "estDepartureAirport": "EDDF", "estArrivalAirport": null,
                 "callsign": "DLH4AB  ", "departureAirportCandidatesCount": 1,
                 "arrivalAirportCandidatesCount": 0}]"#,
        )
        .await;
        let client = OpenSkyClient::new(
            ClientConfig::new()
                .with_base_url(base_url)
                .with_credentials("alice".into(), "secret".into()),
        )
        .unwrap();

        let flights = client
            .get_departures_by_airport("EDDF", TimeWindow::new(at(1517227200), at(1517230800)))
            .await
            .unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].callsign.as_deref(), Some("DLH4AB"));

        let head = request.await.unwrap().to_lowercase();
        assert!(head.starts_with(
            "get /api/flights/departure?airport=eddf&begin=1517227200&end=1517230800 http/1.1"
        ));
        assert!(head.contains("authorization: basic ywxpy2u6c2vjcmv0"));
        assert!(head.contains("accept: application/json; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_get_track_roundtrip() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"{"icao24": "3c4b26", "callsign": " \"DLH9LF \" ",
                "startTime": 1600000000.4, "endTime": 1600000500.9,
                "path": [[1600000000, 50.03, 8.57, 0.0, 250.0, true],
                         [1600000060, null, null, null, null, false]]}"#,
        )
        .await;
        let client = client_for(base_url);

        let track = client
            .get_track_by_aircraft("3c4b26", Some(at(1600000000)))
            .await
            .unwrap();
        assert_eq!(track.callsign, "DLH9LF");
        assert_eq!(track.end_time.timestamp(), 1600000500);
        assert_eq!(track.path.len(), 2);
        assert_eq!(track.path[1].latitude, None);

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /api/tracks/all?icao24=3c4b26&time=1600000000 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_get_track_bad_waypoint() {
        let (base_url, _request) = serve_once(
            "200 OK",
            r#"{"icao24": "3c4b26", "callsign": "DLH9LF", "startTime": 0, "endTime": 0,
                "path": [[1600000000, 50.03, 8.57, 0.0, 250.0, true],
                         [1600000060, 50.04, 8.58, 10.0, 250.0, "yes"]]}"#,
        )
        .await;

        let err = client_for(base_url)
            .get_track_by_aircraft("3c4b26", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode(OpenSkyError::InvalidWaypoint { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_upstream_error_with_message() {
        let (base_url, _request) = serve_once(
            "404 Not Found",
            r#"{"status": 404, "error": "Not Found", "message": "No flights found"}"#,
        )
        .await;

        let err = client_for(base_url)
            .get_flights(TimeWindow::unbounded())
            .await
            .unwrap_err();
        match err {
            ClientError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "No flights found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_unparseable_body() {
        let (base_url, _request) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;

        let err = client_for(base_url)
            .get_arrivals_by_airport("KJFK", TimeWindow::unbounded())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown error, status code: 502");
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let (base_url, _request) = serve_once("200 OK", r#"{"not": "a list"}"#).await;

        let err = client_for(base_url)
            .get_flights_by_aircraft("3c675a", TimeWindow::unbounded())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(OpenSkyError::Json(_))));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{addr}/api"))
            .get_flights(TimeWindow::unbounded())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}

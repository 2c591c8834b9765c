use std::time::Duration;

use reqwest::{blocking::Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{into_records, QueryRequest, ResourceQuery};
use crate::errors::StationRefErr;

/// Path of the station reference service below the host.
const SERVICE_PATH: &str = "mechanisms/object-storage-distribution/station-reference";

/// Blocking HTTP client for the station reference service.
///
/// Requests are sent one at a time and never retried. The only timeout is the one of the
/// underlying connection.
#[derive(Debug)]
pub struct HttpQueryClient {
    base: String,
    client: Client,
}

impl HttpQueryClient {
    /// Host used when none is given.
    pub const DEFAULT_HOST: &'static str = "localhost:8080";

    /// Default connect and read timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for the service on `hostname`, e.g. `localhost:8080`. A scheme is added
    /// if the host name does not have one.
    pub fn new(hostname: &str) -> Result<Self, StationRefErr> {
        HttpQueryClient::with_timeout(hostname, HttpQueryClient::DEFAULT_TIMEOUT)
    }

    /// Same as [`HttpQueryClient::new`] with a custom timeout.
    pub fn with_timeout(hostname: &str, timeout: Duration) -> Result<Self, StationRefErr> {
        if hostname.trim().is_empty() {
            return Err(StationRefErr::InvalidArgument("empty host name".to_owned()));
        }

        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| StationRefErr::GeneralError(err.to_string()))?;

        Ok(HttpQueryClient {
            base: HttpQueryClient::base_url(hostname),
            client,
        })
    }

    /// The service root on `hostname`.
    pub fn base_url(hostname: &str) -> String {
        let hostname = hostname.trim_end_matches('/');
        if hostname.starts_with("http://") || hostname.starts_with("https://") {
            format!("{}/{}", hostname, SERVICE_PATH)
        } else {
            format!("http://{}/{}", hostname, SERVICE_PATH)
        }
    }

    /// The full URL of a request, without its query parameters.
    pub fn url(&self, request: &QueryRequest) -> String {
        format!("{}/{}", self.base, request.path())
    }
}

impl ResourceQuery for HttpQueryClient {
    fn query(&self, request: &QueryRequest) -> Result<Vec<Value>, StationRefErr> {
        let transport = |cause: String| StationRefErr::Transport {
            kind: request.kind,
            target: request.target(),
            cause,
        };

        let url = self.url(request);
        let params = request.params();
        debug!(url = %url, params = ?params, "requesting");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|err| transport(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(vec![]),
            status if !status.is_success() => {
                return Err(transport(format!("{} returned {}", url, status)));
            }
            _ => {}
        }

        let text = response.text().map_err(|err| transport(err.to_string()))?;
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|err| transport(format!("invalid JSON: {}", err)))?;

        into_records(request, body)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use crate::{resources::ResourceKind, time::TimeWindow};

    #[test]
    fn test_base_url_adds_scheme() {
        assert_eq!(
            HttpQueryClient::base_url("localhost:8080"),
            "http://localhost:8080/mechanisms/object-storage-distribution/station-reference"
        );
        assert_eq!(
            HttpQueryClient::base_url("https://gms.example.org/"),
            "https://gms.example.org/mechanisms/object-storage-distribution/station-reference"
        );
    }

    #[test]
    fn test_empty_host_is_rejected() {
        match HttpQueryClient::new("  ") {
            Err(StationRefErr::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_request_url() {
        let client = HttpQueryClient::new(HttpQueryClient::DEFAULT_HOST).unwrap();
        let request = QueryRequest::by_id(ResourceKind::Networks, "abc", TimeWindow::unbounded());

        assert_eq!(
            client.url(&request),
            "http://localhost:8080/mechanisms/object-storage-distribution/station-reference/networks/id/abc"
        );
    }

    #[test]
    fn test_connection_refused_is_a_transport_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client =
            HttpQueryClient::with_timeout("127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let request = QueryRequest::all(ResourceKind::Networks, TimeWindow::unbounded());

        match client.query(&request) {
            Err(StationRefErr::Transport { kind, target, .. }) => {
                assert_eq!(kind, ResourceKind::Networks);
                assert_eq!(target, "all");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

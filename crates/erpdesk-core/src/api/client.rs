//! HTTP implementation of the profile gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use tracing::{debug, error, info, warn};

use crate::models::UserRecord;

use super::wire::{parse_profile, parse_profile_object, parse_roster};
use super::{ApiError, ProfileGateway, RawProfile};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the profile service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const LIST_PATH: &str = "/api/user-profiles/all";
const UPDATE_PATH: &str = "/api/user-profiles/update";
const SUBMIT_PATH: &str = "/api/user-profiles/submit";

/// API client for the user-profile service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ProfileClient {
    client: Client,
    base_url: String,
}

impl ProfileClient {
    /// Create a client for `base_url`. Without a timeout the transport
    /// default applies.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn json_headers(request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
    }

    /// Send the request and return the body text of a 2xx response.
    /// Any other status becomes `ApiError::Status` carrying the body text.
    async fn send_for_text(request: RequestBuilder, what: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "{} failed", what);
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl ProfileGateway for ProfileClient {
    async fn list_all(&self) -> Result<Vec<UserRecord>, ApiError> {
        let url = self.url(LIST_PATH);
        debug!(url = %url, "Fetching user profiles");

        let body = Self::send_for_text(self.client.get(&url).header(header::ACCEPT, "application/json"), "List profiles").await?;
        let profiles = parse_roster(&body)?;

        info!(count = profiles.len(), "User profiles fetched");
        Ok(profiles)
    }

    async fn update_one(&self, id: &str, record: &UserRecord) -> Result<UserRecord, ApiError> {
        let url = format!("{}/{}", self.url(UPDATE_PATH), id);
        debug!(url = %url, "Updating user profile");

        let request = Self::json_headers(self.client.put(&url)).json(record);
        let body = Self::send_for_text(request, "Update profile").await?;

        info!(id = %id, "User profile updated");

        // A 2xx is success whatever the body holds; some servers answer 204
        // or plain text
        if body.trim().is_empty() {
            return Ok(record.clone());
        }
        match parse_profile(&body) {
            Ok(updated) => Ok(updated.into()),
            Err(e) => {
                warn!(id = %id, error = %e, "Unreadable update response; keeping the sent profile");
                Ok(record.clone())
            }
        }
    }

    async fn create_one(&self, record: &UserRecord) -> Result<RawProfile, ApiError> {
        let url = self.url(SUBMIT_PATH);
        debug!(url = %url, placeholder_id = %record.id, "Submitting new user profile");

        let request = Self::json_headers(self.client.post(&url)).json(record);
        let body = Self::send_for_text(request, "Submit profile").await?;

        let created = parse_profile_object(&body)?;
        info!("User profile created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
                    let content_length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ProfileClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url(LIST_PATH), "http://localhost:8080/api/user-profiles/all");
    }

    #[tokio::test]
    async fn test_list_all_wrapped() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data": [{"id": "1", "name": {"first": "A", "last": "B"}, "blood_group": "O+"}]}"#,
        )
        .await;

        let client = ProfileClient::new(&base, None).unwrap();
        let profiles = client.list_all().await.expect("list succeeds");

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].blood_group.as_deref(), Some("O+"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/user-profiles/all "));
    }

    #[tokio::test]
    async fn test_update_one_sends_camel_blood_group() {
        let (base, server) = serve_once("200 OK", r#"{"id": "123456", "bloodGroup": "AB+"}"#).await;

        let client = ProfileClient::new(&base, None).unwrap();
        let mut record = crate::models::seed_profiles().remove(0);
        record.blood_group = Some("AB+".to_string());

        let updated = client.update_one(&record.id, &record).await.expect("update succeeds");
        assert_eq!(updated.blood_group.as_deref(), Some("AB+"));

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /api/user-profiles/update/123456 "));
        assert!(request.contains(r#""bloodGroup":"AB+""#));
        assert!(!request.contains("Blood-group"));
    }

    #[tokio::test]
    async fn test_update_one_no_content_is_success() {
        let (base, server) = serve_once("204 No Content", "").await;

        let client = ProfileClient::new(&base, None).unwrap();
        let record = crate::models::seed_profiles().remove(1);

        let updated = client.update_one(&record.id, &record).await.expect("204 is a successful update");
        assert_eq!(updated, record);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_one_plain_text_body_is_success() {
        let (base, server) = serve_once("200 OK", "OK").await;

        let client = ProfileClient::new(&base, None).unwrap();
        let record = crate::models::seed_profiles().remove(0);

        let updated = client.update_one(&record.id, &record).await.expect("2xx is a successful update");
        assert_eq!(updated, record);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_one_error_carries_body() {
        let (base, server) = serve_once("400 Bad Request", "username already exists").await;

        let client = ProfileClient::new(&base, None).unwrap();
        let result = client.create_one(&UserRecord::blank_template()).await;

        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "username already exists");
            }
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/user-profiles/submit "));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ProfileClient::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
        let result = client.list_all().await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}

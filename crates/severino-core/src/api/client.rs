//! HTTP transport for the Facilita Ponto portal.
//!
//! `PortalClient` is the production `Portal`: it posts `multipart/form-data`
//! bodies with `reqwest` (the encoding the portal's own web form uses) and
//! hands back status, `Set-Cookie` headers and body text without
//! interpreting them. Deciding what a status means is the job of the
//! session manager and the clock-in protocol.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::config::Settings;

use super::TransportError;

/// Authentication endpoint (form body `emp`, `cpf`)
pub const AUTH_PATH: &str = "/registrar/auth";

/// Clock-in endpoint (form body `mydata`, `latitude`, `longitude`, `utmp`, `registro`)
pub const CLOCK_IN_PATH: &str = "/registrar/grava";

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, Default)]
pub struct PortalResponse {
    pub status: u16,
    pub status_text: String,
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl PortalResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401/403 are the portal's only signal that the session expired.
    pub fn is_session_rejected(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// Form fields of a clock-in submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockInForm {
    pub timestamp: String,
    pub registro: String,
}

impl ClockInForm {
    fn multipart(&self) -> Form {
        self.fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value.to_string()))
    }

    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("mydata", ""),
            ("latitude", ""),
            ("longitude", ""),
            ("utmp", self.timestamp.as_str()),
            ("registro", self.registro.as_str()),
        ]
    }
}

#[async_trait]
pub trait Portal: Send + Sync {
    /// POST the company code and tax id to the authentication endpoint
    async fn authenticate(
        &self,
        company_code: &str,
        tax_id: &str,
    ) -> Result<PortalResponse, TransportError>;

    /// POST a clock-in carrying `cookie_header` as the session
    async fn submit_clock_in(
        &self,
        cookie_header: &str,
        form: &ClockInForm,
    ) -> Result<PortalResponse, TransportError>;
}

/// Portal client backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.portal_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Collect everything the callers need before the body is consumed.
    ///
    /// Once a status has arrived the exchange counts as completed; a body
    /// that fails to read is treated as empty.
    async fn read_response(response: reqwest::Response) -> PortalResponse {
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect();
        let body = response.text().await.unwrap_or_else(|e| {
            warn!(status = status.as_u16(), error = %e, "Failed to read response body");
            String::new()
        });

        PortalResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            set_cookies,
            body,
        }
    }
}

#[async_trait]
impl Portal for PortalClient {
    async fn authenticate(
        &self,
        company_code: &str,
        tax_id: &str,
    ) -> Result<PortalResponse, TransportError> {
        let url = self.url(AUTH_PATH);
        debug!(url = %url, "Sending authentication request");

        let response = self
            .client
            .post(&url)
            .multipart(
                Form::new()
                    .text("emp", company_code.to_string())
                    .text("cpf", tax_id.to_string()),
            )
            .send()
            .await?;

        Ok(Self::read_response(response).await)
    }

    async fn submit_clock_in(
        &self,
        cookie_header: &str,
        form: &ClockInForm,
    ) -> Result<PortalResponse, TransportError> {
        let url = self.url(CLOCK_IN_PATH);
        debug!(url = %url, utmp = %form.timestamp, "Sending clock-in request");

        let response = self
            .client
            .post(&url)
            .header(header::COOKIE, cookie_header)
            .multipart(form.multipart())
            .send()
            .await?;

        Ok(Self::read_response(response).await)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    use super::*;

    /// Serve one canned HTTP response on localhost and hand back the raw request.
    fn serve_once(reply: &'static str) -> (String, std::thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_millis(500)))
                .unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        // multipart bodies end with the closing boundary
                        if request.ends_with(b"--\r\n") {
                            break;
                        }
                    }
                }
            }

            stream.write_all(reply.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn client_for(url: String) -> PortalClient {
        let mut settings = Settings::with_config_dir(std::path::PathBuf::from("/tmp"));
        settings.portal_url = url;
        settings.request_timeout = Duration::from_secs(5);
        PortalClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_truncated_body_keeps_status() {
        // Content-Length promises more than is sent before the connection closes
        let (url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nSet-Cookie: s=1; path=/\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
        );
        let client = client_for(url);

        let response = client.authenticate("1", "000").await.unwrap();
        server.join().unwrap();

        assert_eq!(response.status, 401);
        assert!(response.is_session_rejected());
        assert_eq!(response.set_cookies, vec!["s=1; path=/"]);
    }

    #[tokio::test]
    async fn test_clock_in_is_sent_as_multipart() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        );
        let client = client_for(url);
        let form = ClockInForm {
            timestamp: "2024-01-01 08:00:00".to_string(),
            registro: "abc=".to_string(),
        };

        let response = client.submit_clock_in("s=1; t=2", &form).await.unwrap();
        let request = server.join().unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, "ok");
        assert!(request.starts_with("POST /registrar/grava "));
        assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
        assert!(request.to_ascii_lowercase().contains("cookie: s=1; t=2"));
        for name in ["mydata", "latitude", "longitude", "utmp", "registro"] {
            assert!(request.contains(&format!("name=\"{}\"", name)), "missing {}", name);
        }
        assert!(request.contains("2024-01-01 08:00:00"));
    }

    #[test]
    fn test_response_classification() {
        let ok = PortalResponse {
            status: 200,
            ..Default::default()
        };
        assert!(ok.is_success());
        assert!(!ok.is_session_rejected());

        for status in [401, 403] {
            let rejected = PortalResponse {
                status,
                ..Default::default()
            };
            assert!(!rejected.is_success());
            assert!(rejected.is_session_rejected());
        }

        let server_error = PortalResponse {
            status: 500,
            ..Default::default()
        };
        assert!(!server_error.is_success());
        assert!(!server_error.is_session_rejected());
    }

    #[test]
    fn test_clock_in_form_fields() {
        let form = ClockInForm {
            timestamp: "2024-01-01 08:00:00".to_string(),
            registro: "abc=".to_string(),
        };
        assert_eq!(
            form.fields(),
            [
                ("mydata", ""),
                ("latitude", ""),
                ("longitude", ""),
                ("utmp", "2024-01-01 08:00:00"),
                ("registro", "abc="),
            ]
        );
    }

    #[test]
    fn test_client_joins_base_url() {
        let mut settings = Settings::with_config_dir(std::path::PathBuf::from("/tmp"));
        settings.portal_url = "http://localhost:9000".to_string();
        let client = PortalClient::new(&settings).unwrap();
        assert_eq!(client.url(AUTH_PATH), "http://localhost:9000/registrar/auth");
        assert_eq!(client.url(CLOCK_IN_PATH), "http://localhost:9000/registrar/grava");
    }
}

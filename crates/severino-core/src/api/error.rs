use std::path::PathBuf;

use thiserror::Error;

/// Failure to complete an HTTP exchange (no response received).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure writing local state to disk.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum PontoError {
    #[error("Could not read credentials. Run 'ponto setup' first.")]
    LocalCredentialsMissing,

    #[error("Credentials incomplete. Run 'ponto setup' to configure them.")]
    CredentialsIncomplete,

    #[error("Could not reach the authentication endpoint: {0}")]
    AuthTransport(#[source] TransportError),

    #[error("Authentication with Facilita Ponto failed. Check your credentials.")]
    AuthRejected { status: u16, status_text: String },

    #[error("Registration token not found in the authentication response.")]
    RegistrationTokenNotFound,

    #[error("Invalid registration token: {0}")]
    InvalidRegistrationToken(String),

    #[error("Failed to encode clock-in payload: {0}")]
    PayloadEncoding(#[source] serde_json::Error),

    #[error("Could not submit the clock-in request: {0}")]
    ClockInTransport(#[source] TransportError),

    #[error("Failed to record clock-in.")]
    ClockInRejected {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Failed to save local state: {0}")]
    Storage(#[from] StorageError),
}

/// Maximum length for response bodies quoted in log lines
const MAX_LOGGED_BODY_LENGTH: usize = 500;

impl PontoError {
    /// Expected failures the user can fix; anything else deserves a full trace.
    pub fn is_operational(&self) -> bool {
        !matches!(self, PontoError::Storage(_) | PontoError::PayloadEncoding(_))
    }

    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Extra diagnostic lines shown under the main message
    pub fn details(&self) -> Vec<String> {
        match self {
            PontoError::AuthRejected {
                status,
                status_text,
            } => vec![status_line(*status, status_text)],
            PontoError::ClockInRejected {
                status,
                status_text,
                body,
            } => {
                let mut lines = vec![status_line(*status, status_text)];
                if !body.is_empty() {
                    lines.push(format!("Response: {}", body));
                }
                lines
            }
            _ => Vec::new(),
        }
    }
}

fn status_line(status: u16, status_text: &str) -> String {
    format!("Details: {} {}", status, status_text).trim().to_string()
}

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

// ============================================================================
// Tests
// ============================================================================

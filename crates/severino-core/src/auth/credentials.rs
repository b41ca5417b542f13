use std::path::{Path, PathBuf};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{PontoError, StorageError};
use crate::storage::write_atomic;

/// Identity used to authenticate against the portal.
///
/// Stored as `{"emp", "cpf", "funcionario"}`; `funcionario` only exists
/// after a successful setup handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "emp", default)]
    pub company_code: String,
    #[serde(rename = "cpf", default)]
    pub tax_id: String,
    #[serde(
        rename = "funcionario",
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub employee_id: Option<String>,
}

/// Older setups wrote the decoded id as a JSON number
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "funcionario must be a string or number, got {}",
            other
        ))),
    }
}

impl Credentials {
    pub fn new(company_code: String, tax_id: String, employee_id: Option<String>) -> Self {
        Self {
            company_code,
            tax_id,
            employee_id,
        }
    }

    /// Company code and tax id are both needed to authenticate
    pub fn require_login_fields(&self) -> Result<(), PontoError> {
        if self.company_code.trim().is_empty() || self.tax_id.trim().is_empty() {
            return Err(PontoError::CredentialsIncomplete);
        }
        Ok(())
    }

    /// The employee id is needed to build a clock-in payload
    pub fn require_employee_id(&self) -> Result<&str, PontoError> {
        self.employee_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(PontoError::CredentialsIncomplete)
    }
}

/// Strip everything but digits from a CPF ("123.456.789-00" -> "12345678900")
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_company_code(raw: &str) -> String {
    raw.trim().to_string()
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials from disk. A missing or unreadable file is `None`.
    pub fn load(&self) -> Option<Credentials> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No credentials file");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Malformed credentials file");
                None
            }
        }
    }

    /// Replace the credentials file with `credentials`
    pub fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string_pretty(credentials).map_err(|source| StorageError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        write_atomic(&self.path, &contents)
    }
}

// ============================================================================
// Tests
// ============================================================================

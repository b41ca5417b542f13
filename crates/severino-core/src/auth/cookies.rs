use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::api::StorageError;
use crate::storage::write_atomic;

/// Session cookies issued together by one authentication response.
///
/// Stored and sent in the same `name=value; name=value` form as an HTTP
/// `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: BTreeMap<String, String>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header value. Pairs without a name or value are skipped.
    pub fn parse_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(split_pair)
            .collect();
        Self { cookies }
    }

    /// Build a set from `Set-Cookie` response headers.
    ///
    /// Only the leading `name=value` segment of each header is used;
    /// attributes like `Path` or `HttpOnly` are dropped, and so is any
    /// header whose first segment is not a usable pair.
    pub fn from_set_cookie_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cookies = headers
            .into_iter()
            .filter_map(|header| header.as_ref().split(';').next().and_then(split_pair))
            .collect();
        Self { cookies }
    }

    pub fn to_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Split at the first `=`; values may themselves contain `=`.
fn split_pair(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.trim().split_once('=')?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. Missing or unreadable files give an empty set.
    pub fn load(&self) -> CookieSet {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => CookieSet::parse_header(contents.trim()),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No stored cookies");
                CookieSet::new()
            }
        }
    }

    pub fn save(&self, cookies: &CookieSet) -> Result<(), StorageError> {
        write_atomic(&self.path, &cookies.to_header())
    }

    /// Forget the stored session so the next `load` sees none.
    ///
    /// Failures are logged and swallowed.
    pub fn clear(&self) {
        if let Err(e) = write_atomic(&self.path, "") {
            warn!(path = %self.path.display(), error = %e, "Failed to clear stored cookies");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

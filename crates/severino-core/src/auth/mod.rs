//! Authentication module for managing portal sessions and credentials.
//!
//! This module provides:
//! - `CredentialStore`: Company code, tax id and employee id on disk
//! - `CookieStore`: The current session cookies on disk
//! - `SessionManager`: Reuses the cached session or authenticates for a new one
//!
//! The portal gives no expiry for its cookies. A session is assumed valid
//! until a request using it is rejected with 401/403.

pub mod cookies;
pub mod credentials;
pub mod session;

pub use cookies::{CookieSet, CookieStore};
pub use credentials::{normalize_company_code, normalize_tax_id, CredentialStore, Credentials};
pub use session::SessionManager;

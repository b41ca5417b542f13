use tracing::{debug, info, warn};

use crate::api::error::truncate_body;
use crate::api::{Portal, PontoError};
use crate::codec::{decode_employee_id, extract_registration_token};
use crate::config::Settings;

use super::{CookieSet, CookieStore, CredentialStore};

/// Hands out a portal session, authenticating only when there is none.
///
/// The session is either absent (empty cookie file) or a complete cookie
/// set from one authentication response. It is always replaced wholesale.
pub struct SessionManager<P> {
    portal: P,
    credentials: CredentialStore,
    cookies: CookieStore,
}

impl<P: Portal> SessionManager<P> {
    pub fn new(portal: P, credentials: CredentialStore, cookies: CookieStore) -> Self {
        Self {
            portal,
            credentials,
            cookies,
        }
    }

    /// Stores at the locations given by `settings`
    pub fn from_settings(portal: P, settings: &Settings) -> Self {
        Self::new(
            portal,
            CredentialStore::new(settings.credentials_path()),
            CookieStore::new(settings.cookies_path()),
        )
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Return the cached session, or authenticate for a new one.
    ///
    /// With `force_refresh` the cache is ignored and the portal is always
    /// called. A fresh cookie set is persisted before it is returned.
    pub async fn get_session(&self, force_refresh: bool) -> Result<CookieSet, PontoError> {
        if !force_refresh {
            let cached = self.cookies.load();
            if !cached.is_empty() {
                debug!(cookies = cached.len(), "Using cached session");
                return Ok(cached);
            }
        }

        let credentials = self
            .credentials
            .load()
            .ok_or(PontoError::LocalCredentialsMissing)?;
        credentials.require_login_fields()?;

        info!(force_refresh, "Authenticating with portal");

        let response = self
            .portal
            .authenticate(&credentials.company_code, &credentials.tax_id)
            .await
            .map_err(PontoError::AuthTransport)?;

        if !response.is_success() {
            warn!(status = response.status, "Authentication rejected");
            return Err(PontoError::AuthRejected {
                status: response.status,
                status_text: response.status_text,
            });
        }

        let cookies = CookieSet::from_set_cookie_headers(&response.set_cookies);
        if cookies.is_empty() {
            warn!("Authentication succeeded but no cookies were issued");
        }

        self.cookies.save(&cookies)?;
        debug!(cookies = cookies.len(), "Stored new session");

        Ok(cookies)
    }

    /// Drop the stored session. Never fails; see `CookieStore::clear`.
    pub fn invalidate(&self) {
        debug!("Invalidating stored session");
        self.cookies.clear();
    }

    /// One-time setup handshake: authenticate and read the employee id
    /// from the registration token in the response page.
    ///
    /// Cookies issued by this call are not kept.
    pub async fn fetch_employee_id(
        &self,
        company_code: &str,
        tax_id: &str,
    ) -> Result<String, PontoError> {
        let response = self
            .portal
            .authenticate(company_code, tax_id)
            .await
            .map_err(PontoError::AuthTransport)?;

        if !response.is_success() {
            warn!(
                status = response.status,
                body = %truncate_body(&response.body),
                "Registration handshake rejected"
            );
            return Err(PontoError::AuthRejected {
                status: response.status,
                status_text: response.status_text,
            });
        }

        let token = extract_registration_token(&response.body)?;
        decode_employee_id(&token)
    }
}

// ============================================================================
// Tests
// ============================================================================

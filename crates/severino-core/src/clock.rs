//! Clock-in protocol.
//!
//! A clock-in is one form POST carrying the session cookies and a freshly
//! stamped payload. When the portal answers 401/403 the session is taken
//! as expired: the stored cookies are cleared, a new session is obtained
//! and the same request is sent exactly once more.

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use crate::api::error::truncate_body;
use crate::api::{ClockInForm, Portal, PortalResponse, PontoError};
use crate::auth::{CookieSet, SessionManager};
use crate::codec::encode_clock_in_token;

/// Timestamp layout expected by the portal's `utmp` and `data_hora` fields
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a recorded clock-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockInReceipt {
    /// Local time stamped on the request
    pub timestamp: String,
    /// Whether the first attempt was rejected and a new session was used
    pub retried: bool,
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time in portal format
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

/// Record a clock-in, re-authenticating once if the session was rejected.
///
/// Stored credentials are checked before any request is made, so an
/// incomplete setup never reaches the network.
pub async fn clock_in<P: Portal>(
    session: &SessionManager<P>,
    force_refresh: bool,
) -> Result<ClockInReceipt, PontoError> {
    let credentials = session
        .credentials()
        .load()
        .ok_or(PontoError::LocalCredentialsMissing)?;
    credentials.require_login_fields()?;
    let employee_id = credentials.require_employee_id()?;

    let cookies = session.get_session(force_refresh).await?;

    let timestamp = timestamp_now();
    let form = ClockInForm {
        registro: encode_clock_in_token(&timestamp, &credentials.company_code, employee_id)?,
        timestamp,
    };

    let response = submit(session.portal(), &cookies, &form).await?;

    if response.is_success() {
        info!(utmp = %form.timestamp, "Clock-in recorded");
        return Ok(ClockInReceipt {
            timestamp: form.timestamp,
            retried: false,
        });
    }

    if !response.is_session_rejected() {
        return Err(rejected(response));
    }

    warn!(status = response.status, "Session rejected, re-authenticating");
    session.invalidate();
    let cookies = session.get_session(true).await?;

    let retry = submit(session.portal(), &cookies, &form).await?;
    if !retry.is_success() {
        return Err(rejected(retry));
    }

    info!(utmp = %form.timestamp, "Clock-in recorded after re-authentication");
    Ok(ClockInReceipt {
        timestamp: form.timestamp,
        retried: true,
    })
}

async fn submit<P: Portal>(
    portal: &P,
    cookies: &CookieSet,
    form: &ClockInForm,
) -> Result<PortalResponse, PontoError> {
    portal
        .submit_clock_in(&cookies.to_header(), form)
        .await
        .map_err(PontoError::ClockInTransport)
}

fn rejected(response: PortalResponse) -> PontoError {
    warn!(
        status = response.status,
        body = %truncate_body(&response.body),
        "Clock-in rejected"
    );
    PontoError::ClockInRejected {
        status: response.status,
        status_text: response.status_text,
        body: response.body,
    }
}

// ============================================================================
// Tests
// ============================================================================

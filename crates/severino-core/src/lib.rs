//! Core library for severino - clocking in on Facilita Ponto.
//!
//! This crate provides:
//! - `config`: Settings and per-user file locations
//! - `auth`: Credential and cookie stores plus the `SessionManager`
//! - `api`: The portal transport (`Portal` trait, `PortalClient`) and errors
//! - `codec`: Registration token and clock-in payload encoding
//! - `clock`: The clock-in protocol with its single re-authentication retry
//!
//! Nothing in here prints or exits; that is left to the binary.

pub mod api;
pub mod auth;
pub mod clock;
pub mod codec;
pub mod config;
pub mod storage;

pub use api::{Portal, PortalClient, PontoError, StorageError, TransportError};
pub use auth::{CookieSet, CookieStore, CredentialStore, Credentials, SessionManager};
pub use clock::{clock_in, ClockInReceipt};
pub use config::Settings;

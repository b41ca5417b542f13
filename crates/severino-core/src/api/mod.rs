//! Portal transport and error types.
//!
//! The Facilita Ponto portal exposes two form endpoints: `/registrar/auth`,
//! which answers with session cookies (and, during setup, an HTML page
//! holding the registration token), and `/registrar/grava`, which records
//! a clock-in for the session in the `Cookie` header.
//!
//! All network access goes through the `Portal` trait so the session and
//! clock-in logic can run against an in-memory portal in tests.

pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ClockInForm, Portal, PortalClient, PortalResponse};
pub use error::{PontoError, StorageError, TransportError};

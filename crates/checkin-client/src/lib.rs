//! Async HTTP client for the wellness backend.
//!
//! [`HttpBackend`] implements [`checkin_core::backend::WellnessBackend`] over
//! the backend's JSON REST API.

mod client;

pub mod error;

pub use client::{ClientConfig, HttpBackend};
pub use error::{Error, Result};

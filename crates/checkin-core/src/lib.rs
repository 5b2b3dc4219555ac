//! Core types and trait definitions for the wellness check-in client.
//!
//! This crate is deliberately free of HTTP, database and runtime
//! dependencies. Every other crate depends on it.

pub mod backend;
pub mod checkin;
pub mod error;
pub mod identity;
pub mod store;
pub mod view;

pub use error::{BackendError, Error, Result, ViewError};

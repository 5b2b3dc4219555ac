//! The `FactStore` trait — durable key/value facts kept on the client.
//!
//! Implemented by storage backends (e.g. `checkin-store-sqlite`). Higher
//! layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

/// A small durable map of string facts.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read one fact. `None` if it was never set or has been cleared.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write every `(key, value)` pair or none of them.
  fn set_all<'a>(
    &'a self,
    facts: &'a [(&'a str, &'a str)],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the given keys. Removing a key that is not present is not an
  /// error.
  fn clear_all<'a>(
    &'a self,
    keys: &'a [&'a str],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

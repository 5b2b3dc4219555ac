//! [`AuthFacts`] — the three durable facts that make up a signed-in session.
//!
//! Best effort by design of the surrounding flow: a fact that cannot be
//! read or written is logged and treated as absent, and the user signs in
//! again.

use checkin_core::{identity::Identity, store::FactStore};
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "jwt";
pub const EMPLOYEE_ID_KEY: &str = "employee_id";
pub const EMPLOYEE_NAME_KEY: &str = "employee_name";

const ALL_KEYS: [&str; 3] = [TOKEN_KEY, EMPLOYEE_ID_KEY, EMPLOYEE_NAME_KEY];

pub struct AuthFacts<S: FactStore> {
  store: S,
}

impl<S: FactStore> AuthFacts<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The persisted identity, or `None` unless all three facts are present
  /// and non-empty.
  pub async fn restore(&self) -> Option<Identity> {
    let identity = Identity {
      token:        self.read(TOKEN_KEY).await?,
      employee_id:  self.read(EMPLOYEE_ID_KEY).await?,
      display_name: self.read(EMPLOYEE_NAME_KEY).await?,
    };
    if identity.is_complete() {
      debug!(employee_id = %identity.employee_id, "session restored");
      Some(identity)
    } else {
      None
    }
  }

  /// Persist all three facts together.
  pub async fn commit(&self, identity: &Identity) {
    let facts = [
      (TOKEN_KEY, identity.token.as_str()),
      (EMPLOYEE_ID_KEY, identity.employee_id.as_str()),
      (EMPLOYEE_NAME_KEY, identity.display_name.as_str()),
    ];
    if let Err(error) = self.store.set_all(&facts).await {
      warn!(%error, "could not persist sign-in; it will not survive a restart");
    }
  }

  /// Forget the session. Safe to call when nothing is stored.
  pub async fn clear(&self) {
    if let Err(error) = self.store.clear_all(&ALL_KEYS).await {
      warn!(%error, "could not clear persisted sign-in");
    }
  }

  async fn read(&self, key: &str) -> Option<String> {
    match self.store.get(key).await {
      Ok(value) => value,
      Err(error) => {
        warn!(key, %error, "could not read persisted sign-in");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use checkin_store_sqlite::SqliteStore;

  use super::*;
  use crate::testing::identity;

  async fn facts() -> (SqliteStore, AuthFacts<SqliteStore>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    (store.clone(), AuthFacts::new(store))
  }

  #[tokio::test]
  async fn empty_store_restores_nothing() {
    let (_, auth) = facts().await;
    assert_eq!(auth.restore().await, None);
  }

  #[tokio::test]
  async fn commit_then_restore() {
    let (_, auth) = facts().await;
    auth.commit(&identity()).await;
    assert_eq!(auth.restore().await, Some(identity()));
  }

  #[tokio::test]
  async fn partial_facts_are_not_an_identity() {
    let (store, auth) = facts().await;
    store
      .set_all(&[(TOKEN_KEY, "tok"), (EMPLOYEE_ID_KEY, "emp")])
      .await
      .unwrap();
    assert_eq!(auth.restore().await, None);

    store.set_all(&[(EMPLOYEE_NAME_KEY, "")]).await.unwrap();
    assert_eq!(auth.restore().await, None);
  }

  #[tokio::test]
  async fn clear_is_idempotent() {
    let (_, auth) = facts().await;
    auth.commit(&identity()).await;
    auth.clear().await;
    auth.clear().await;
    assert_eq!(auth.restore().await, None);
  }

  // A store whose every operation fails.
  struct BrokenStore;

  impl FactStore for BrokenStore {
    type Error = std::io::Error;

    async fn get(&self, _: &str) -> Result<Option<String>, Self::Error> {
      Err(std::io::Error::other("disk gone"))
    }

    async fn set_all(&self, _: &[(&str, &str)]) -> Result<(), Self::Error> {
      Err(std::io::Error::other("disk gone"))
    }

    async fn clear_all(&self, _: &[&str]) -> Result<(), Self::Error> {
      Err(std::io::Error::other("disk gone"))
    }
  }

  #[tokio::test]
  async fn persistence_failures_are_swallowed() {
    let auth = AuthFacts::new(BrokenStore);
    auth.commit(&identity()).await;
    auth.clear().await;
    assert_eq!(auth.restore().await, None);
  }
}

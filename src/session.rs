//! Session
//!
//! Application state for one shopper: the auth record, if signed in, and the
//! cart store. Both are rehydrated from the same storage when the session is
//! opened.

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    auth::AuthRecord,
    cart::{CartStore, MergePolicy},
    storage::{AUTH_KEY, Storage, StorageError},
};

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The auth record could not be serialised
    #[error("failed to encode auth record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The auth record could not be written or removed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Auth record and cart store sharing one storage backend.
#[derive(Debug)]
pub struct Session<S> {
    auth: Option<AuthRecord>,
    cart: CartStore<S>,
}

impl<S: Storage> Session<S> {
    /// Open a session over `storage`.
    ///
    /// A stored auth record that cannot be read is ignored, leaving the
    /// session signed out.
    pub fn open(storage: S, currency: &'static Currency, policy: MergePolicy) -> Self {
        let auth = match storage.get(AUTH_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<AuthRecord>(&text) {
                Ok(auth) => Some(auth),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable auth record");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read auth record");
                None
            }
        };

        debug!(authenticated = auth.is_some(), "opened session");

        Session {
            auth,
            cart: CartStore::open(storage, currency, policy),
        }
    }

    /// Sign in, persisting `auth` and replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the record cannot be stored. The session
    /// stays in its previous state in that case.
    pub fn login(&mut self, auth: AuthRecord) -> Result<(), SessionError> {
        let text = serde_json::to_string(&auth)?;

        self.cart.storage_mut().set(AUTH_KEY, &text)?;

        info!(email = %auth.user.email, admin = auth.user.is_admin(), "logged in");

        self.auth = Some(auth);

        Ok(())
    }

    /// Sign out. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the stored record cannot be removed; the
    /// in-memory record is cleared regardless.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(auth) = self.auth.take() {
            info!(email = %auth.user.email, "logged out");
        }

        self.cart.storage_mut().remove(AUTH_KEY)?;

        Ok(())
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.auth.as_ref().is_some_and(|auth| !auth.token.is_empty())
    }

    /// Whether the signed-in user is an admin.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.auth.as_ref().is_some_and(|auth| auth.user.is_admin())
    }

    /// Current auth record.
    pub fn auth(&self) -> Option<&AuthRecord> {
        self.auth.as_ref()
    }

    /// Cart store.
    pub fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    /// Mutable cart store.
    pub fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Consume the session, returning its storage.
    pub fn into_storage(self) -> S {
        self.cart.into_storage()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::INR};
    use testresult::TestResult;

    use crate::{auth::User, products::Product, storage::MemoryStorage, variants::Variant};

    use super::*;

    fn admin() -> AuthRecord {
        AuthRecord::new(
            User {
                id: Some("u-1".to_string()),
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                role: 1,
                ..User::default()
            },
            "jwt",
        )
    }

    #[test]
    fn login_is_restored_on_reopen() -> TestResult {
        let mut session = Session::open(MemoryStorage::new(), INR, MergePolicy::default());

        session.login(admin())?;

        let session = Session::open(session.into_storage(), INR, MergePolicy::default());

        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert_eq!(session.auth(), Some(&admin()));

        Ok(())
    }

    #[test]
    fn logout_keeps_cart() -> TestResult {
        let mut session = Session::open(MemoryStorage::new(), INR, MergePolicy::default());
        let product = Product::new("p-1", "Glasses", Money::from_major(100, INR));

        session.login(admin())?;
        session.cart_mut().add_line(&product, &Variant::single())?;
        session.logout()?;

        assert!(!session.is_authenticated());
        assert!(!session.is_admin());

        let storage = session.into_storage();
        assert_eq!(storage.get(AUTH_KEY)?, None);

        let session = Session::open(storage, INR, MergePolicy::default());
        assert!(session.auth().is_none());
        assert_eq!(session.cart().cart().len(), 1);

        Ok(())
    }

    #[test]
    fn corrupt_auth_record_opens_signed_out() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.set(AUTH_KEY, "[1, 2")?;

        let session = Session::open(storage, INR, MergePolicy::default());

        assert!(!session.is_authenticated());

        Ok(())
    }

    #[test]
    fn empty_token_is_not_authenticated() -> TestResult {
        let mut session = Session::open(MemoryStorage::new(), INR, MergePolicy::default());

        session.login(AuthRecord::new(User::default(), ""))?;

        assert!(!session.is_authenticated());

        Ok(())
    }
}

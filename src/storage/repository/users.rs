// SPDX-License-Identifier: AGPL-3.0-or-later

//! User repository over the flat-file store.

use chrono::Utc;

use crate::models::{round_cents, User, UserUpdate};

use super::super::{Collection, JsonStore, StorageResult};

/// Result of attempting to create a user.
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created {
        user: User,
        /// True when this account was auto-promoted as the bootstrap admin.
        promoted_to_admin: bool,
    },
    /// Another user already owns this email (case-insensitive).
    DuplicateEmail,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Insert a new user, enforcing email uniqueness.
    ///
    /// With `promote_first_admin` set, the user is promoted to admin when no
    /// admin exists yet. The duplicate check, promotion decision and insert
    /// run under one collection lock.
    pub async fn create(
        &self,
        mut user: User,
        promote_first_admin: bool,
    ) -> StorageResult<CreateUserOutcome> {
        let guard = self.store.collection(Collection::Users).await;
        let mut users: Vec<User> = guard.read()?;

        if users.iter().any(|u| u.email == user.email) {
            return Ok(CreateUserOutcome::DuplicateEmail);
        }

        let mut promoted_to_admin = false;
        if promote_first_admin && !users.iter().any(|u| u.role.is_admin()) {
            user.role = crate::auth::Role::Admin;
            promoted_to_admin = true;
        }

        users.push(user.clone());
        guard.write(&users)?;

        Ok(CreateUserOutcome::Created {
            user,
            promoted_to_admin,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> StorageResult<Option<User>> {
        let guard = self.store.collection(Collection::Users).await;
        let users: Vec<User> = guard.read()?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    /// Lookup by email, case-insensitive.
    pub async fn get_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let guard = self.store.collection(Collection::Users).await;
        let users: Vec<User> = guard.read()?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    /// Find the user holding an unconsumed verification token.
    pub async fn find_by_verification_token(&self, token: &str) -> StorageResult<Option<User>> {
        let guard = self.store.collection(Collection::Users).await;
        let users: Vec<User> = guard.read()?;
        Ok(users
            .into_iter()
            .find(|u| u.verification_token.as_deref() == Some(token)))
    }

    /// Apply a [`UserUpdate`] to one user. Returns the updated user, or
    /// `None` when the id is unknown.
    pub async fn update(&self, id: &str, update: UserUpdate) -> StorageResult<Option<User>> {
        let guard = self.store.collection(Collection::Users).await;
        let mut users: Vec<User> = guard.read()?;

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        update.apply(user);
        let updated = user.clone();

        guard.write(&users)?;
        Ok(Some(updated))
    }

    /// Overwrite a user's balance. Returns the new balance, or `None` when
    /// the id is unknown.
    pub async fn set_balance(&self, id: &str, amount: f64) -> StorageResult<Option<f64>> {
        let guard = self.store.collection(Collection::Users).await;
        let mut users: Vec<User> = guard.read()?;

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.balance = round_cents(amount);
        user.updated_at = Utc::now();
        let balance = user.balance;

        guard.write(&users)?;
        Ok(Some(balance))
    }

    /// Add `delta` euros to a user's balance, rounding to cents. Returns the
    /// new balance, or `None` when the id is unknown.
    pub async fn increment_balance(&self, id: &str, delta: f64) -> StorageResult<Option<f64>> {
        let guard = self.store.collection(Collection::Users).await;
        let mut users: Vec<User> = guard.read()?;

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.balance = round_cents(user.balance + delta);
        user.updated_at = Utc::now();
        let balance = user.balance;

        guard.write(&users)?;
        Ok(Some(balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::security::hash_password;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_store() -> (JsonStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (store, dir)
    }

    fn password_user(email: &str, name: &str) -> User {
        let cred = hash_password("pw12345678").unwrap();
        User::new_with_password(email, name, cred, format!("tok-{email}"))
    }

    #[tokio::test]
    async fn first_registered_user_becomes_admin() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        let outcome = repo.create(password_user("a@x.com", "Ann"), true).await.unwrap();
        match outcome {
            CreateUserOutcome::Created {
                user,
                promoted_to_admin,
            } => {
                assert!(promoted_to_admin);
                assert_eq!(user.role, Role::Admin);
            }
            CreateUserOutcome::DuplicateEmail => panic!("unexpected duplicate"),
        }

        let outcome = repo.create(password_user("b@x.com", "Bob"), true).await.unwrap();
        match outcome {
            CreateUserOutcome::Created {
                user,
                promoted_to_admin,
            } => {
                assert!(!promoted_to_admin);
                assert_eq!(user.role, Role::User);
            }
            CreateUserOutcome::DuplicateEmail => panic!("unexpected duplicate"),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(password_user("a@x.com", "Ann"), true).await.unwrap();
        let outcome = repo.create(password_user("A@X.COM", "Imposter"), true).await.unwrap();
        assert!(matches!(outcome, CreateUserOutcome::DuplicateEmail));
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(password_user("ann@x.com", "Ann"), false).await.unwrap();
        let found = repo.get_by_email("ANN@x.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn update_unknown_user_returns_none() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        let updated = repo
            .update("nope", UserUpdate::default())
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn increment_balance_rounds_to_cents() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        let outcome = repo.create(password_user("a@x.com", "Ann"), false).await.unwrap();
        let CreateUserOutcome::Created { user, .. } = outcome else {
            panic!("create failed");
        };

        let after_first = repo.increment_balance(&user.id, 5.00).await.unwrap();
        assert_eq!(after_first, Some(5.00));

        let after_second = repo.increment_balance(&user.id, 2.50).await.unwrap();
        assert_eq!(after_second, Some(7.50));

        assert!(repo.increment_balance("nope", 1.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn verification_token_lookup_finds_exact_holder() {
        let (store, _dir) = test_store();
        let repo = UserRepository::new(&store);

        repo.create(password_user("a@x.com", "Ann"), false).await.unwrap();
        let found = repo
            .find_by_verification_token("tok-a@x.com")
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(repo
            .find_by_verification_token("other")
            .await
            .unwrap()
            .is_none());
    }
}

//! In-memory user store

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use contracts::{User, UserInput, ValidationError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("user not found")]
    NotFound(u64),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Users keyed by id; ids start at 1 and are never reused (until `clear`)
#[derive(Debug)]
pub struct UserStore {
    users: RwLock<BTreeMap<u64, User>>,
    next_id: AtomicU64,
}

impl Default for UserStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, mut input: UserInput) -> Result<User, StoreError> {
        input.sanitize();
        input.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = input.into_user(id);
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, user.clone());
        Ok(user)
    }

    pub fn get(&self, id: u64) -> Result<User, StoreError> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// All users ordered by id
    pub fn list(&self) -> Vec<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Replace name and email, keeping the id
    ///
    /// Input is validated before the id is looked up.
    pub fn update(&self, id: u64, mut input: UserInput) -> Result<User, StoreError> {
        input.sanitize();
        input.validate()?;
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let slot = users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *slot = input.into_user(id);
        Ok(slot.clone())
    }

    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    pub fn count(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every user and restart ids at 1
    pub fn clear(&self) {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        users.clear();
        self.next_id.store(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> UserInput {
        UserInput::new(" Ada Lovelace ", "ADA@example.com")
    }

    #[test]
    fn test_create_assigns_ids_and_sanitizes() {
        let store = UserStore::new();
        let first = store.create(ada()).unwrap();
        let second = store
            .create(UserInput::new("Grace", "grace@example.com"))
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.name, "Ada Lovelace");
        assert_eq!(first.email, "ada@example.com");
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let store = UserStore::new();
        let err = store.create(UserInput::new("A", "a@b.co")).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::NameTooShort));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_update_keeps_id() {
        let store = UserStore::new();
        let user = store.create(ada()).unwrap();
        let updated = store
            .update(user.id, UserInput::new("Ada King", "ada@king.org"))
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(store.get(user.id).unwrap().name, "Ada King");
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let store = UserStore::new();
        assert_eq!(store.get(9), Err(StoreError::NotFound(9)));
        assert_eq!(
            store.update(9, UserInput::new("Ada", "ada@example.com")),
            Err(StoreError::NotFound(9))
        );
        assert_eq!(store.delete(9), Err(StoreError::NotFound(9)));
        assert_eq!(StoreError::NotFound(9).to_string(), "user not found");
    }

    #[test]
    fn test_list_ordered_and_clear_resets_ids() {
        let store = UserStore::new();
        for name in ["Ada", "Grace", "Edsger"] {
            store
                .create(UserInput::new(name, format!("{}@example.com", name.to_lowercase())))
                .unwrap();
        }
        store.delete(2).unwrap();
        let ids: Vec<u64> = store.list().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);

        store.clear();
        assert_eq!(store.count(), 0);
        assert_eq!(store.create(ada()).unwrap().id, 1);
    }
}

//! Read-through lookup of user records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::application::repos::{RepoError, UsersRepo};
use crate::cache::{CacheClient, CacheKey, CacheLookup};
use crate::domain::entities::User;

#[derive(Clone)]
pub struct UserLookup {
    users: Arc<dyn UsersRepo>,
    cache: CacheClient,
    ttl: Duration,
}

impl UserLookup {
    pub fn new(users: Arc<dyn UsersRepo>, cache: CacheClient, ttl: Duration) -> Self {
        Self { users, cache, ttl }
    }

    /// Returns the user by id, consulting the cache first.
    ///
    /// Concurrent misses for the same id each load and repopulate; they write identical payloads.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, RepoError> {
        let key = CacheKey::User(id);
        if let CacheLookup::Hit(user) = self.cache.lookup::<User>(&key).await
            && user.is_present()
        {
            return Ok(Some(user));
        }

        let Some(user) = self.users.find_user(id).await? else {
            return Ok(None);
        };
        self.cache.store(&key, &user, self.ttl).await;
        Ok(Some(user))
    }

    /// Resolves a set of ids with one store query covering every cache miss.
    ///
    /// Ids without a row are absent from the returned map.
    pub async fn get_users(&self, ids: &[i64]) -> Result<HashMap<i64, User>, RepoError> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::with_capacity(ids.len());

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.cache.lookup::<User>(&CacheKey::User(id)).await {
                CacheLookup::Hit(user) if user.is_present() => {
                    resolved.insert(id, user);
                }
                _ => missing.push(id),
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        for user in self.users.find_users(&missing).await? {
            self.cache
                .store(&CacheKey::User(user.id), &user, self.ttl)
                .await;
            resolved.insert(user.id, user);
        }
        Ok(resolved)
    }
}

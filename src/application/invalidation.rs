//! Cache eviction after writes.
//!
//! Hooks run after the triggering write has committed. Every step is best effort: a key
//! that cannot be resolved is skipped and the write still succeeds.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::repos::PostsRepo;
use crate::application::users::UserLookup;
use crate::cache::{CacheClient, CacheKey};

const TARGET: &str = "photofeed::invalidation";

#[derive(Clone)]
pub struct Invalidator {
    cache: CacheClient,
    users: UserLookup,
    posts: Arc<dyn PostsRepo>,
}

impl Invalidator {
    pub fn new(cache: CacheClient, users: UserLookup, posts: Arc<dyn PostsRepo>) -> Self {
        Self {
            cache,
            users,
            posts,
        }
    }

    /// Evicts the feed and the author's profile.
    pub async fn on_post_created(&self, author_id: i64) {
        self.cache.evict(&CacheKey::Feed).await;
        self.evict_profile_of(author_id).await;
        debug!(target: TARGET, user_id = author_id, "post creation invalidated");
    }

    /// Evicts the feed, the commenter's profile and the profile of the post's owner.
    pub async fn on_comment_created(&self, commenter_id: i64, post_id: i64) {
        self.cache.evict(&CacheKey::Feed).await;
        self.evict_profile_of(commenter_id).await;

        match self.posts.find_owner_account_name(post_id).await {
            Ok(Some(account_name)) => self.cache.evict(&CacheKey::Account(account_name)).await,
            Ok(None) => {
                debug!(target: TARGET, post_id, "post owner not found, profile eviction skipped");
            }
            Err(err) => {
                warn!(target: TARGET, post_id, error = %err, "post owner lookup failed, profile eviction skipped");
            }
        }
        debug!(target: TARGET, user_id = commenter_id, post_id, "comment creation invalidated");
    }

    /// Evicts the user's record and the feed.
    pub async fn on_user_banned(&self, user_id: i64) {
        self.cache.evict(&CacheKey::User(user_id)).await;
        self.cache.evict(&CacheKey::Feed).await;
        debug!(target: TARGET, user_id, "user ban invalidated");
    }

    async fn evict_profile_of(&self, user_id: i64) {
        match self.users.get_user(user_id).await {
            Ok(Some(user)) => self.cache.evict(&CacheKey::Account(user.account_name)).await,
            Ok(None) => {
                debug!(target: TARGET, user_id, "user not found, profile eviction skipped");
            }
            Err(err) => {
                warn!(target: TARGET, user_id, error = %err, "user lookup failed, profile eviction skipped");
            }
        }
    }
}

//! Feed, profile and post read paths.
//!
//! The home feed and profile aggregates are cached whole. Cached payloads never carry a
//! CSRF token; the caller's token is stamped onto the posts after every read.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::application::assembler::{CommentScope, PostAssembler};
use crate::application::repos::{CommentsRepo, PostsRepo, RepoError, UsersRepo};
use crate::cache::{CacheClient, CacheConfig, CacheKey, CacheLookup};
use crate::domain::entities::{PostView, ProfileAggregate};

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Parses the `max_created_at` bound of the "load more" listing.
pub fn parse_max_created_at(raw: &str) -> Result<OffsetDateTime, TimelineError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| TimelineError::InvalidTimestamp(raw.into()))
}

#[derive(Clone)]
pub struct TimelineService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    assembler: PostAssembler,
    cache: CacheClient,
    config: CacheConfig,
}

impl TimelineService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        assembler: PostAssembler,
        cache: CacheClient,
        config: CacheConfig,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            assembler,
            cache,
            config,
        }
    }

    /// The shared home feed.
    pub async fn home_feed(&self, csrf_token: &str) -> Result<Vec<PostView>, TimelineError> {
        if let CacheLookup::Hit(posts) = self.cache.lookup::<Vec<PostView>>(&CacheKey::Feed).await
            && !posts.is_empty()
        {
            return Ok(stamp(posts, csrf_token));
        }

        let candidates = self.posts.list_recent(self.config.candidate_limit).await?;
        let posts = self
            .assembler
            .assemble(candidates, "", CommentScope::Excerpt)
            .await?;
        if !posts.is_empty() {
            self.cache
                .store(&CacheKey::Feed, &posts, self.config.feed_ttl)
                .await;
        }
        Ok(stamp(posts, csrf_token))
    }

    /// Profile page of an active account; banned and unknown accounts read as absent.
    pub async fn profile(
        &self,
        account_name: &str,
        csrf_token: &str,
    ) -> Result<Option<ProfileAggregate>, TimelineError> {
        let key = CacheKey::account(account_name);
        if let CacheLookup::Hit(mut aggregate) =
            self.cache.lookup::<ProfileAggregate>(&key).await
            && aggregate.user.is_present()
        {
            aggregate.posts = stamp(aggregate.posts, csrf_token);
            return Ok(Some(aggregate));
        }

        let Some(user) = self.users.find_active_by_account_name(account_name).await? else {
            return Ok(None);
        };

        let candidates = self
            .posts
            .list_by_user(user.id, self.config.candidate_limit)
            .await?;
        let posts = self
            .assembler
            .assemble(candidates, "", CommentScope::Excerpt)
            .await?;
        let comment_count = self.comments.count_by_user(user.id).await?;
        let post_count = self.posts.count_by_user(user.id).await?;
        let commented_count = self.comments.count_on_posts_of(user.id).await?;

        let mut aggregate = ProfileAggregate {
            user,
            posts,
            comment_count,
            post_count,
            commented_count,
        };
        self.cache
            .store(&key, &aggregate, self.config.profile_ttl)
            .await;
        aggregate.posts = stamp(aggregate.posts, csrf_token);
        Ok(Some(aggregate))
    }

    /// Uncached continuation of the feed below a creation-time bound.
    pub async fn posts_before(
        &self,
        max_created_at: OffsetDateTime,
        csrf_token: &str,
    ) -> Result<Vec<PostView>, TimelineError> {
        let candidates = self
            .posts
            .list_before(max_created_at, self.config.candidate_limit)
            .await?;
        Ok(self
            .assembler
            .assemble(candidates, csrf_token, CommentScope::Excerpt)
            .await?)
    }

    /// A single post with its full comment thread.
    pub async fn post_detail(
        &self,
        post_id: i64,
        csrf_token: &str,
    ) -> Result<Option<PostView>, TimelineError> {
        let Some(post) = self.posts.find_post(post_id).await? else {
            return Ok(None);
        };
        let mut posts = self
            .assembler
            .assemble(vec![post], csrf_token, CommentScope::All)
            .await?;
        Ok(posts.pop())
    }
}

fn stamp(mut posts: Vec<PostView>, csrf_token: &str) -> Vec<PostView> {
    for post in &mut posts {
        post.csrf_token = csrf_token.to_string();
    }
    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_bounds() {
        let parsed = parse_max_created_at("2024-05-01T10:00:00+09:00").expect("valid bound");
        assert_eq!(parsed.unix_timestamp(), 1_714_525_200);
    }

    #[test]
    fn rejects_malformed_bounds() {
        let err = parse_max_created_at("yesterday").expect_err("malformed bound");
        assert!(matches!(err, TimelineError::InvalidTimestamp(raw) if raw == "yesterday"));
    }
}

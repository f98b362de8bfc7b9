//! Repository traits describing persistence adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CommentRecord, PostRecord, User};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: i64,
    pub mime: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub user_id: i64,
    pub comment: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepoError>;

    /// Batch lookup; ids without a row are simply absent from the result.
    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, RepoError>;

    /// Only users whose ban flag is clear are returned.
    async fn find_active_by_account_name(
        &self,
        account_name: &str,
    ) -> Result<Option<User>, RepoError>;

    /// Active users without moderator authority, newest first.
    async fn list_active_members(&self) -> Result<Vec<User>, RepoError>;

    async fn ban_user(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Newest posts first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    /// Newest posts created at or before `max_created_at`.
    async fn list_before(
        &self,
        max_created_at: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn list_by_user(&self, user_id: i64, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    /// Account name of the post's owner, resolved with a join.
    async fn find_owner_account_name(&self, post_id: i64) -> Result<Option<String>, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Total comment rows per post; posts without comments are absent.
    async fn count_by_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, RepoError>;

    /// Every comment on the given posts, newest first.
    async fn list_by_posts(&self, post_ids: &[i64]) -> Result<Vec<CommentRecord>, RepoError>;

    /// Comments written by the user.
    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError>;

    /// Comments left on any post owned by the user.
    async fn count_on_posts_of(&self, user_id: i64) -> Result<i64, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

//! Write paths: posting, commenting and moderation.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::invalidation::Invalidator;
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, PostRecord, User};
use crate::domain::error::DomainError;
use crate::domain::posts::ImageMime;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error("moderator authority is required")]
    Forbidden,
    #[error("post {0} does not exist")]
    UnknownPost(i64),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub mime: String,
    pub body: String,
}

#[derive(Clone)]
pub struct ContentService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    invalidator: Invalidator,
}

impl ContentService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            invalidator,
        }
    }

    pub async fn create_post(
        &self,
        actor: &User,
        post: NewPost,
    ) -> Result<PostRecord, ContentError> {
        ensure_signed_in(actor)?;
        let mime = ImageMime::from_content_type(&post.mime)?;

        let record = self
            .posts
            .create_post(CreatePostParams {
                user_id: actor.id,
                mime: mime.as_str().to_string(),
                body: post.body,
            })
            .await?;

        self.invalidator.on_post_created(actor.id).await;
        info!(post_id = record.id, user_id = actor.id, "post created");
        Ok(record)
    }

    pub async fn create_comment(
        &self,
        actor: &User,
        post_id: i64,
        comment: String,
    ) -> Result<CommentRecord, ContentError> {
        ensure_signed_in(actor)?;
        if self.posts.find_post(post_id).await?.is_none() {
            return Err(ContentError::UnknownPost(post_id));
        }

        let record = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                user_id: actor.id,
                comment,
            })
            .await?;

        self.invalidator.on_comment_created(actor.id, post_id).await;
        info!(comment_id = record.id, post_id, user_id = actor.id, "comment created");
        Ok(record)
    }

    /// Active accounts a moderator may ban, newest first.
    pub async fn ban_candidates(&self, moderator: &User) -> Result<Vec<User>, ContentError> {
        ensure_moderator(moderator)?;
        Ok(self.users.list_active_members().await?)
    }

    /// Flags every listed account as banned, evicting caches after each update.
    pub async fn ban_users(&self, moderator: &User, user_ids: &[i64]) -> Result<(), ContentError> {
        ensure_moderator(moderator)?;
        for &user_id in user_ids {
            self.users.ban_user(user_id).await?;
            self.invalidator.on_user_banned(user_id).await;
            info!(user_id, moderator_id = moderator.id, "user banned");
        }
        Ok(())
    }
}

fn ensure_signed_in(actor: &User) -> Result<(), ContentError> {
    if actor.is_present() && !actor.is_banned() {
        Ok(())
    } else {
        Err(ContentError::Unauthenticated)
    }
}

fn ensure_moderator(actor: &User) -> Result<(), ContentError> {
    ensure_signed_in(actor)?;
    if actor.is_moderator() {
        Ok(())
    } else {
        Err(ContentError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(authority: i32, del_flg: i32) -> User {
        User {
            id: 4,
            account_name: "dave".into(),
            authority,
            del_flg,
            ..User::default()
        }
    }

    #[test]
    fn absent_and_banned_actors_are_unauthenticated() {
        assert!(matches!(
            ensure_signed_in(&User::default()),
            Err(ContentError::Unauthenticated)
        ));
        assert!(matches!(
            ensure_signed_in(&member(0, 1)),
            Err(ContentError::Unauthenticated)
        ));
        assert!(ensure_signed_in(&member(0, 0)).is_ok());
    }

    #[test]
    fn moderation_requires_authority() {
        assert!(matches!(
            ensure_moderator(&member(0, 0)),
            Err(ContentError::Forbidden)
        ));
        assert!(ensure_moderator(&member(1, 0)).is_ok());
    }
}

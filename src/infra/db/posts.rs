use async_trait::async_trait;
use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;

use crate::application::repos::{CreatePostParams, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, limit_param, map_sqlx_error, types::PostRow};

const POST_COLUMNS: &str = "id, user_id, body, mime, created_at";

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        let rows = query_as::<_, PostRow>(&sql)
            .bind(limit_param(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_before(
        &self,
        max_created_at: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE created_at <= $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = query_as::<_, PostRow>(&sql)
            .bind(max_created_at)
            .bind(limit_param(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_by_user(&self, user_id: i64, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .bind(limit_param(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError> {
        query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_owner_account_name(&self, post_id: i64) -> Result<Option<String>, RepoError> {
        query_scalar::<_, String>(
            "SELECT u.account_name FROM posts p JOIN users u ON u.id = p.user_id WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "INSERT INTO posts (user_id, mime, imgdata, body) VALUES ($1, $2, $3, $4) \
             RETURNING {POST_COLUMNS}"
        );
        let row = query_as::<_, PostRow>(&sql)
            .bind(params.user_id)
            .bind(&params.mime)
            .bind(Vec::<u8>::new())
            .bind(&params.body)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}

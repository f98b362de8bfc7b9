use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{query_as, query_scalar};

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{
    PostgresRepositories, map_sqlx_error,
    types::{CommentRow, CountRow},
};

const COMMENT_COLUMNS: &str = "id, post_id, user_id, comment, created_at";

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn count_by_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = query_as::<_, CountRow>(
            "SELECT post_id AS key, COUNT(*) AS count FROM comments \
             WHERE post_id = ANY($1) GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| (row.key, row.count)).collect())
    }

    async fn list_by_posts(&self, post_ids: &[i64]) -> Result<Vec<CommentRecord>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ANY($1) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = query_as::<_, CommentRow>(&sql)
            .bind(post_ids)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError> {
        query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_on_posts_of(&self, user_id: i64) -> Result<i64, RepoError> {
        query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments c JOIN posts p ON p.id = c.post_id WHERE p.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO comments (post_id, user_id, comment) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = query_as::<_, CommentRow>(&sql)
            .bind(params.post_id)
            .bind(params.user_id)
            .bind(&params.comment)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}

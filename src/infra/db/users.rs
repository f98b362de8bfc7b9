use async_trait::async_trait;
use sqlx::{query, query_as};

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::User;

use super::{PostgresRepositories, map_sqlx_error, types::UserRow};

const USER_COLUMNS: &str = "id, account_name, passhash, authority, del_flg, created_at";

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let rows = query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_active_by_account_name(
        &self,
        account_name: &str,
    ) -> Result<Option<User>, RepoError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE account_name = $1 AND del_flg = 0");
        let row = query_as::<_, UserRow>(&sql)
            .bind(account_name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn list_active_members(&self) -> Result<Vec<User>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE authority = 0 AND del_flg = 0 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn ban_user(&self, id: i64) -> Result<(), RepoError> {
        query("UPDATE users SET del_flg = 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

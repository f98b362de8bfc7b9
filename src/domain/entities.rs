//! Domain entities mirrored from persistent storage, and the hydrated views built from them.
//!
//! Field names on the wire follow the encoding used by every process sharing the cache,
//! so the serde renames below are part of the cache contract.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "AccountName")]
    pub account_name: String,
    #[serde(rename = "Passhash")]
    pub passhash: String,
    #[serde(rename = "Authority")]
    pub authority: i32,
    #[serde(rename = "DelFlg")]
    pub del_flg: i32,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// A zero id marks the absent user (no session, or a dangling reference).
    pub fn is_present(&self) -> bool {
        self.id != 0
    }

    pub fn is_banned(&self) -> bool {
        self.del_flg != 0
    }

    pub fn is_moderator(&self) -> bool {
        self.authority != 0
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            account_name: String::new(),
            passhash: String::new(),
            authority: 0,
            del_flg: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// A post row without derived fields; the candidate input of the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub body: String,
    pub mime: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub comment: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "PostID")]
    pub post_id: i64,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Comment")]
    pub comment: String,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "User", default)]
    pub user: User,
}

impl CommentView {
    pub fn new(record: CommentRecord, user: User) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            user_id: record.user_id,
            comment: record.comment,
            created_at: record.created_at,
            user,
        }
    }
}

/// A fully hydrated post as rendered by the feed, profile and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Mime")]
    pub mime: String,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "CommentCount")]
    pub comment_count: i64,
    #[serde(rename = "Comments", default, deserialize_with = "null_as_empty")]
    pub comments: Vec<CommentView>,
    #[serde(rename = "User", default)]
    pub user: User,
    #[serde(rename = "CSRFToken", default)]
    pub csrf_token: String,
}

/// Profile page aggregate, cached as one entry per account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAggregate {
    pub user: User,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub posts: Vec<PostView>,
    pub comment_count: i64,
    pub post_count: i64,
    pub commented_count: i64,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Mutex;

use photofeed::application::assembler::PostAssembler;
use photofeed::application::content::ContentService;
use photofeed::application::invalidation::Invalidator;
use photofeed::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, PostsRepo, RepoError, UsersRepo,
};
use photofeed::application::timeline::TimelineService;
use photofeed::application::users::UserLookup;
use photofeed::cache::{CacheClient, CacheConfig, CacheError, CacheStore, LocalStore};
use photofeed::domain::entities::{CommentRecord, PostRecord, User};

pub const BASE_TIME: OffsetDateTime = datetime!(2024-04-01 09:00 UTC);

pub fn at(minutes: i64) -> OffsetDateTime {
    BASE_TIME + time::Duration::minutes(minutes)
}

pub fn user(id: i64, account_name: &str) -> User {
    User {
        id,
        account_name: account_name.to_string(),
        passhash: format!("hash-{account_name}"),
        authority: 0,
        del_flg: 0,
        created_at: at(-1000 + id),
    }
}

pub fn banned(id: i64, account_name: &str) -> User {
    User {
        del_flg: 1,
        ..user(id, account_name)
    }
}

pub fn moderator(id: i64, account_name: &str) -> User {
    User {
        authority: 1,
        ..user(id, account_name)
    }
}

/// Post `id` created `id` minutes after the base time, so higher ids are newer.
pub fn post(id: i64, user_id: i64) -> PostRecord {
    PostRecord {
        id,
        user_id,
        body: format!("caption {id}"),
        mime: "image/jpeg".to_string(),
        created_at: at(id),
    }
}

pub fn comment(id: i64, post_id: i64, user_id: i64, minutes: i64) -> CommentRecord {
    CommentRecord {
        id,
        post_id,
        user_id,
        comment: format!("comment {id}"),
        created_at: at(minutes),
    }
}

/// In-memory relational store recording every query it answers.
#[derive(Default)]
pub struct MemoryDb {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<PostRecord>>,
    comments: Mutex<Vec<CommentRecord>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MemoryDb {
    pub fn seeded(users: Vec<User>, posts: Vec<PostRecord>, comments: Vec<CommentRecord>) -> Self {
        Self {
            users: Mutex::new(users),
            posts: Mutex::new(posts),
            comments: Mutex::new(comments),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    pub async fn count_calls(&self, call: &str) -> usize {
        self.calls.lock().await.iter().filter(|c| **c == call).count()
    }

    pub async fn reset_calls(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn set_ban_flag(&self, user_id: i64) {
        for user in self.users.lock().await.iter_mut() {
            if user.id == user_id {
                user.del_flg = 1;
            }
        }
    }

    pub async fn insert_comment(&self, record: CommentRecord) {
        self.comments.lock().await.push(record);
    }
}

fn newest_first_posts(posts: impl Iterator<Item = PostRecord>, limit: u32) -> Vec<PostRecord> {
    let mut posts: Vec<PostRecord> = posts.collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    posts.truncate(limit as usize);
    posts
}

#[async_trait]
impl UsersRepo for MemoryDb {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepoError> {
        self.record("find_user").await;
        Ok(self.users.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        self.record("find_users").await;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_active_by_account_name(
        &self,
        account_name: &str,
    ) -> Result<Option<User>, RepoError> {
        self.record("find_active_by_account_name").await;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.account_name == account_name && u.del_flg == 0)
            .cloned())
    }

    async fn list_active_members(&self) -> Result<Vec<User>, RepoError> {
        self.record("list_active_members").await;
        let mut users: Vec<User> = self
            .users
            .lock()
            .await
            .iter()
            .filter(|u| u.authority == 0 && u.del_flg == 0)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn ban_user(&self, id: i64) -> Result<(), RepoError> {
        self.record("ban_user").await;
        self.set_ban_flag(id).await;
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryDb {
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        self.record("list_recent").await;
        let posts = self.posts.lock().await.clone();
        Ok(newest_first_posts(posts.into_iter(), limit))
    }

    async fn list_before(
        &self,
        max_created_at: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.record("list_before").await;
        let posts = self.posts.lock().await.clone();
        Ok(newest_first_posts(
            posts.into_iter().filter(|p| p.created_at <= max_created_at),
            limit,
        ))
    }

    async fn list_by_user(&self, user_id: i64, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        self.record("list_by_user").await;
        let posts = self.posts.lock().await.clone();
        Ok(newest_first_posts(
            posts.into_iter().filter(|p| p.user_id == user_id),
            limit,
        ))
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError> {
        self.record("count_posts_by_user").await;
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .count() as i64)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.record("find_post").await;
        Ok(self.posts.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_owner_account_name(&self, post_id: i64) -> Result<Option<String>, RepoError> {
        self.record("find_owner_account_name").await;
        let owner = self
            .posts
            .lock()
            .await
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.user_id);
        let Some(owner) = owner else {
            return Ok(None);
        };
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.id == owner)
            .map(|u| u.account_name.clone()))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.record("create_post").await;
        let mut posts = self.posts.lock().await;
        let id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let record = PostRecord {
            id,
            user_id: params.user_id,
            body: params.body,
            mime: params.mime,
            created_at: at(id),
        };
        posts.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CommentsRepo for MemoryDb {
    async fn count_by_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, RepoError> {
        self.record("count_by_posts").await;
        let mut counts = HashMap::new();
        for comment in self.comments.lock().await.iter() {
            if post_ids.contains(&comment.post_id) {
                *counts.entry(comment.post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn list_by_posts(&self, post_ids: &[i64]) -> Result<Vec<CommentRecord>, RepoError> {
        self.record("list_by_posts").await;
        let mut comments: Vec<CommentRecord> = self
            .comments
            .lock()
            .await
            .iter()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, RepoError> {
        self.record("count_comments_by_user").await;
        Ok(self
            .comments
            .lock()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .count() as i64)
    }

    async fn count_on_posts_of(&self, user_id: i64) -> Result<i64, RepoError> {
        self.record("count_on_posts_of").await;
        let owned: Vec<i64> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect();
        Ok(self
            .comments
            .lock()
            .await
            .iter()
            .filter(|c| owned.contains(&c.post_id))
            .count() as i64)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        self.record("create_comment").await;
        let mut comments = self.comments.lock().await;
        let id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let record = CommentRecord {
            id,
            post_id: params.post_id,
            user_id: params.user_id,
            comment: params.comment,
            created_at: at(10_000 + id),
        };
        comments.push(record.clone());
        Ok(record)
    }
}

/// Cache operation observed by `RecordingStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    Get(String),
    Set(String, Duration),
    Delete(String),
}

/// Working in-process store that logs every operation.
pub struct RecordingStore {
    inner: LocalStore,
    ops: Mutex<Vec<CacheOp>>,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self {
            inner: LocalStore::new(&CacheConfig::default()),
            ops: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingStore {
    pub async fn ops(&self) -> Vec<CacheOp> {
        self.ops.lock().await.clone()
    }

    pub async fn deleted_keys(&self) -> Vec<String> {
        self.ops
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                CacheOp::Delete(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_ops(&self) {
        self.ops.lock().await.clear();
    }

    pub async fn raw(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await.ok().flatten()
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.ops.lock().await.push(CacheOp::Get(key.to_string()));
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.ops
            .lock()
            .await
            .push(CacheOp::Set(key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ops.lock().await.push(CacheOp::Delete(key.to_string()));
        self.inner.delete(key).await
    }
}

/// Backend that fails every operation, as an unreachable cache server would.
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

/// Every service wired over one in-memory database and one cache store.
pub struct Services {
    pub db: Arc<MemoryDb>,
    pub cache: CacheClient,
    pub users: UserLookup,
    pub assembler: PostAssembler,
    pub invalidator: Invalidator,
    pub timeline: Arc<TimelineService>,
    pub content: Arc<ContentService>,
}

pub fn services(db: Arc<MemoryDb>, store: Arc<dyn CacheStore>) -> Services {
    services_with(db, store, CacheConfig::default())
}

pub fn services_with(db: Arc<MemoryDb>, store: Arc<dyn CacheStore>, config: CacheConfig) -> Services {
    let users_repo: Arc<dyn UsersRepo> = db.clone();
    let posts_repo: Arc<dyn PostsRepo> = db.clone();
    let comments_repo: Arc<dyn CommentsRepo> = db.clone();

    let cache = CacheClient::new(store, config.timeout);
    let users = UserLookup::new(users_repo.clone(), cache.clone(), config.user_ttl);
    let assembler = PostAssembler::new(comments_repo.clone(), users.clone(), config.page_size);
    let invalidator = Invalidator::new(cache.clone(), users.clone(), posts_repo.clone());
    let timeline = TimelineService::new(
        users_repo.clone(),
        posts_repo.clone(),
        comments_repo.clone(),
        assembler.clone(),
        cache.clone(),
        config,
    );
    let content = ContentService::new(users_repo, posts_repo, comments_repo, invalidator.clone());

    Services {
        db,
        cache,
        users,
        assembler,
        invalidator,
        timeline: Arc::new(timeline),
        content: Arc::new(content),
    }
}

/// alice (id 1) owns posts 10..=14 with 0, 1, 4, 4 and 4 comments; bob (id 2) comments.
pub fn alice_fixture() -> MemoryDb {
    let users = vec![user(1, "alice"), user(2, "bob"), moderator(3, "mod")];
    let posts = (10..=14).map(|id| post(id, 1)).collect();

    let mut comments = Vec::new();
    let mut next_id = 100;
    for (post_id, count) in [(10, 0), (11, 1), (12, 4), (13, 4), (14, 4)] {
        for n in 0..count {
            comments.push(comment(next_id, post_id, 2, post_id * 100 + n));
            next_id += 1;
        }
    }
    MemoryDb::seeded(users, posts, comments)
}

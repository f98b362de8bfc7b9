mod common;

use std::sync::Arc;

use photofeed::application::content::NewPost;
use photofeed::application::repos::UsersRepo;

use common::{RecordingStore, alice_fixture, services};

fn new_post() -> NewPost {
    NewPost {
        mime: "image/png".to_string(),
        body: "sunset".to_string(),
    }
}

#[tokio::test]
async fn new_post_evicts_feed_and_author_profile() {
    let db = Arc::new(alice_fixture());
    let store = Arc::new(RecordingStore::default());
    let svc = services(db.clone(), store.clone());

    let before = svc.timeline.home_feed("").await.unwrap();
    svc.timeline.profile("alice", "").await.unwrap();
    assert!(store.raw("index_posts").await.is_some());
    assert!(store.raw("account:alice").await.is_some());
    store.clear_ops().await;

    let alice = db.find_user(1).await.unwrap().unwrap();
    let record = svc.content.create_post(&alice, new_post()).await.unwrap();

    let deleted = store.deleted_keys().await;
    assert!(deleted.contains(&"index_posts".to_string()));
    assert!(deleted.contains(&"account:alice".to_string()));
    assert!(store.raw("index_posts").await.is_none());

    let after = svc.timeline.home_feed("").await.unwrap();
    assert_ne!(after, before);
    assert_eq!(after.first().map(|p| p.id), Some(record.id));

    let profile = svc.timeline.profile("alice", "").await.unwrap().unwrap();
    assert_eq!(profile.post_count, 6);
}

#[tokio::test]
async fn new_comment_evicts_commenter_and_owner_profiles() {
    let db = Arc::new(alice_fixture());
    let store = Arc::new(RecordingStore::default());
    let svc = services(db.clone(), store.clone());

    svc.timeline.profile("alice", "").await.unwrap();
    svc.timeline.profile("bob", "").await.unwrap();
    let before = svc.timeline.profile("alice", "").await.unwrap().unwrap();
    store.clear_ops().await;

    let bob = db.find_user(2).await.unwrap().unwrap();
    svc.content
        .create_comment(&bob, 10, "first!".to_string())
        .await
        .unwrap();

    let deleted = store.deleted_keys().await;
    assert!(deleted.contains(&"index_posts".to_string()));
    assert!(deleted.contains(&"account:bob".to_string()));
    assert!(deleted.contains(&"account:alice".to_string()));

    let after = svc.timeline.profile("alice", "").await.unwrap().unwrap();
    assert_eq!(after.commented_count, before.commented_count + 1);
    let ten = after.posts.iter().find(|p| p.id == 10).unwrap();
    assert_eq!(ten.comment_count, 1);

    let bob_profile = svc.timeline.profile("bob", "").await.unwrap().unwrap();
    assert_eq!(bob_profile.comment_count, 14);
}

#[tokio::test]
async fn missing_post_owner_only_skips_that_eviction() {
    let db = Arc::new(alice_fixture());
    let store = Arc::new(RecordingStore::default());
    let svc = services(db.clone(), store.clone());

    svc.invalidator.on_comment_created(2, 999).await;

    let deleted = store.deleted_keys().await;
    assert_eq!(deleted, vec!["index_posts".to_string(), "account:bob".to_string()]);
}

#[tokio::test]
async fn ban_evicts_user_record_and_feed() {
    let db = Arc::new(alice_fixture());
    let store = Arc::new(RecordingStore::default());
    let svc = services(db.clone(), store.clone());

    let feed = svc.timeline.home_feed("").await.unwrap();
    assert_eq!(feed.len(), 5);
    assert!(store.raw("user:1").await.is_some());
    store.clear_ops().await;

    let moderator = db.find_user(3).await.unwrap().unwrap();
    svc.content.ban_users(&moderator, &[1]).await.unwrap();

    let deleted = store.deleted_keys().await;
    assert!(deleted.contains(&"user:1".to_string()));
    assert!(deleted.contains(&"index_posts".to_string()));

    assert!(svc.timeline.home_feed("").await.unwrap().is_empty());
    let cached = svc.users.get_user(1).await.unwrap().unwrap();
    assert!(cached.is_banned());
}

#[tokio::test]
async fn failed_write_leaves_the_cache_untouched() {
    let db = Arc::new(alice_fixture());
    let store = Arc::new(RecordingStore::default());
    let svc = services(db.clone(), store.clone());

    svc.timeline.home_feed("").await.unwrap();
    store.clear_ops().await;

    let bob = db.find_user(2).await.unwrap().unwrap();
    let err = svc
        .content
        .create_comment(&bob, 999, "lost".to_string())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("999"));
    assert!(store.deleted_keys().await.is_empty());
    assert!(store.raw("index_posts").await.is_some());
}

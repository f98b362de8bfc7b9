//! Batch hydration of candidate posts into rendered views.
//!
//! A whole candidate list is hydrated with a fixed number of store round trips: one
//! comment-count query, one comment query and at most one user query for authors the
//! cache could not supply. The number of candidates never changes that count.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::histogram;
use tracing::debug;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::application::users::UserLookup;
use crate::domain::entities::{CommentRecord, CommentView, PostRecord, PostView, User};

/// Comments shown per post in feed and profile listings.
pub const COMMENT_EXCERPT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    /// The most recent comments only, for listings.
    Excerpt,
    /// Every comment, for the post detail page.
    All,
}

#[derive(Clone)]
pub struct PostAssembler {
    comments: Arc<dyn CommentsRepo>,
    users: UserLookup,
    page_size: usize,
}

impl PostAssembler {
    pub fn new(comments: Arc<dyn CommentsRepo>, users: UserLookup, page_size: usize) -> Self {
        Self {
            comments,
            users,
            page_size,
        }
    }

    /// Hydrates `candidates` in order, dropping posts by banned authors and stopping once a
    /// page is full.
    ///
    /// The ban filter and the page cap run in the same pass, so banned posts ahead of the
    /// cap shrink the page rather than pulling in later candidates.
    pub async fn assemble(
        &self,
        candidates: Vec<PostRecord>,
        csrf_token: &str,
        scope: CommentScope,
    ) -> Result<Vec<PostView>, RepoError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = candidates.iter().map(|post| post.id).collect();
        let counts = self.comments.count_by_posts(&post_ids).await?;
        let comments = self.comments.list_by_posts(&post_ids).await?;

        let mut user_ids: Vec<i64> = candidates.iter().map(|post| post.user_id).collect();
        user_ids.extend(comments.iter().map(|comment| comment.user_id));
        let users = self.users.get_users(&user_ids).await?;

        let mut by_post: HashMap<i64, Vec<CommentRecord>> = HashMap::new();
        for comment in comments {
            by_post.entry(comment.post_id).or_default().push(comment);
        }

        let mut views = Vec::with_capacity(candidates.len().min(self.page_size));
        for post in candidates {
            if views.len() >= self.page_size {
                break;
            }
            let author = users.get(&post.user_id).cloned().unwrap_or_default();
            if author.is_banned() {
                continue;
            }
            let records = by_post.remove(&post.id).unwrap_or_default();
            views.push(PostView {
                id: post.id,
                user_id: post.user_id,
                body: post.body,
                mime: post.mime,
                created_at: post.created_at,
                comment_count: counts.get(&post.id).copied().unwrap_or(0),
                comments: select_comments(records, &users, scope),
                user: author,
                csrf_token: csrf_token.to_string(),
            });
        }

        histogram!("photofeed_assemble_posts").record(views.len() as f64);
        debug!(
            candidates = post_ids.len(),
            assembled = views.len(),
            "posts assembled"
        );
        Ok(views)
    }
}

/// Picks the comments shown under a post from its newest-first rows.
///
/// Comments by banned authors are dropped before the excerpt is cut; the result is
/// oldest first.
fn select_comments(
    newest_first: Vec<CommentRecord>,
    users: &HashMap<i64, User>,
    scope: CommentScope,
) -> Vec<CommentView> {
    let limit = match scope {
        CommentScope::Excerpt => COMMENT_EXCERPT_LEN,
        CommentScope::All => usize::MAX,
    };

    let mut kept: Vec<CommentView> = newest_first
        .into_iter()
        .filter_map(|record| {
            let author = users.get(&record.user_id).cloned().unwrap_or_default();
            (!author.is_banned()).then(|| CommentView::new(record, author))
        })
        .take(limit)
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use time::macros::datetime;

    use super::*;

    fn user(id: i64, del_flg: i32) -> User {
        User {
            id,
            account_name: format!("user{id}"),
            del_flg,
            ..User::default()
        }
    }

    fn newest_first(post_id: i64, authors: &[i64]) -> Vec<CommentRecord> {
        let base = datetime!(2024-03-01 12:00 UTC);
        authors
            .iter()
            .enumerate()
            .map(|(idx, &user_id)| CommentRecord {
                id: 100 - idx as i64,
                post_id,
                user_id,
                comment: format!("comment {idx}"),
                created_at: base - Duration::minutes(idx as i64),
            })
            .collect()
    }

    fn directory(users: &[User]) -> HashMap<i64, User> {
        users.iter().map(|user| (user.id, user.clone())).collect()
    }

    #[test]
    fn excerpt_keeps_three_newest_oldest_first() {
        let users = directory(&[user(1, 0)]);
        let selected = select_comments(newest_first(5, &[1, 1, 1, 1]), &users, CommentScope::Excerpt);

        let ids: Vec<i64> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![98, 99, 100]);
        assert!(selected.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn all_scope_keeps_every_comment() {
        let users = directory(&[user(1, 0)]);
        let selected = select_comments(newest_first(5, &[1, 1, 1, 1, 1]), &users, CommentScope::All);

        assert_eq!(selected.len(), 5);
        assert_eq!(selected.first().map(|c| c.id), Some(96));
        assert_eq!(selected.last().map(|c| c.id), Some(100));
    }

    #[test]
    fn banned_comment_authors_are_skipped_before_the_excerpt() {
        let users = directory(&[user(1, 0), user(2, 1)]);
        let selected = select_comments(
            newest_first(5, &[2, 1, 2, 1, 1]),
            &users,
            CommentScope::Excerpt,
        );

        let ids: Vec<i64> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![96, 97, 99]);
        assert!(selected.iter().all(|c| c.user.id == 1));
    }

    #[test]
    fn unknown_comment_author_is_attached_as_absent_user() {
        let selected = select_comments(newest_first(5, &[9]), &HashMap::new(), CommentScope::All);

        assert_eq!(selected.len(), 1);
        assert!(!selected[0].user.is_present());
    }
}

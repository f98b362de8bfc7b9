//! Cache key definitions.
//!
//! The rendered strings are shared with every other process using the same cache
//! and must not change.

use std::fmt;

const FEED_KEY: &str = "index_posts";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single user record by id.
    User(i64),
    /// The profile aggregate of an account.
    Account(String),
    /// The one shared home feed.
    Feed,
}

impl CacheKey {
    pub fn account(name: impl Into<String>) -> Self {
        Self::Account(name.into())
    }

    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Account(_) => "account",
            Self::Feed => "feed",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Account(name) => write!(f, "account:{name}"),
            Self::Feed => f.write_str(FEED_KEY),
        }
    }
}

pub mod body;
pub mod title;

use chrono::{DateTime, Utc};

use self::body::Body;
use self::title::Title;

/// One row of the `newsletters` table.
///
/// `id` is assigned by the storage engine on insertion and never reused;
/// `published_at` is stamped at creation time and stays fixed afterwards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Newsletter {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

/// A newsletter that passed boundary validation but has not been persisted yet.
#[derive(Debug)]
pub struct NewNewsletter {
    pub title: Title,
    pub body: Body,
}

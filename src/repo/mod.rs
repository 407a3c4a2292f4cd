// Repository layer - every write and point lookup goes through here
pub mod comments;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use thiserror::Error;

use crate::state::DbPool;

pub use comments::CommentRepository;
pub use likes::LikeRepository;
pub use playlists::PlaylistRepository;
pub use subscriptions::SubscriptionRepository;
pub use tweets::TweetRepository;
pub use users::UserRepository;
pub use videos::VideoRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of a toggle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

impl Toggled {
    pub fn is_added(self) -> bool {
        self == Toggled::Added
    }
}

/// All repositories over one pool. Cheap to clone.
#[derive(Clone)]
pub struct Repos {
    pub users: UserRepository,
    pub videos: VideoRepository,
    pub comments: CommentRepository,
    pub likes: LikeRepository,
    pub tweets: TweetRepository,
    pub playlists: PlaylistRepository,
    pub subscriptions: SubscriptionRepository,
}

impl Repos {
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            videos: VideoRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            tweets: TweetRepository::new(pool.clone()),
            playlists: PlaylistRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool),
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trimmed value of a required field, or a validation error naming it.
pub(crate) fn required(field: &str, value: &str) -> RepoResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepoError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Whether a row with `id` exists in `table`. `table` is always a static name.
pub(crate) fn exists(
    conn: &rusqlite::Connection,
    table: &'static str,
    id: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )
}

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::SessionService;
use crate::config::Config;
use crate::media::MediaStore;
use crate::repo::Repos;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub repos: Repos,
    pub sessions: SessionService,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, media: Arc<dyn MediaStore>) -> Self {
        let repos = Repos::new(db.clone());
        let sessions = SessionService::new(&config.auth, repos.users.clone());
        Self {
            db,
            config,
            repos,
            sessions,
            media,
        }
    }
}

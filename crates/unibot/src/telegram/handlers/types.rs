//! Handler types and dependencies

use std::sync::Arc;

use unicore::storage::DbPool;
use unicore::{DedupGuard, UploadCoordinator};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub dedup: DedupGuard,
    pub uploads: UploadCoordinator,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, dedup: DedupGuard, uploads: UploadCoordinator) -> Self {
        Self {
            db_pool,
            dedup,
            uploads,
        }
    }
}

/// Telegram user id of the message sender as stored in `users.external_id`
pub fn sender_id(user: Option<&teloxide::types::User>) -> Option<i64> {
    user.and_then(|u| i64::try_from(u.id.0).ok())
}

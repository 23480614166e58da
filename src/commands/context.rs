//! Shared state for command and callback handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use crate::commands::drafts::DraftStore;
use crate::database::Database;

/// Injected into every dispatcher endpoint as `Arc<BotContext>`
pub struct BotContext {
    pub database: Database,
    pub drafts: DraftStore,
}

impl BotContext {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            drafts: DraftStore::new(),
        }
    }
}

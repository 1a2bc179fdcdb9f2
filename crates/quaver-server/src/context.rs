//! Shared application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. It is cheaply cloneable because it only holds the pool handle
//! and `Arc`s.

use std::sync::Arc;

use quaver_core::config::Config;
use quaver_db::pool::DbPool;

use crate::storage::UploadStore;

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Content-addressed upload store.
    pub store: Arc<UploadStore>,
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, default config,
//! a temp upload directory, and a full [`AppContext`]. The [`with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use quaver_core::config::Config;
use quaver_core::{QuizId, UserId};
use quaver_db::pool::{init_memory_pool, DbPool};
use quaver_server::context::AppContext;
use quaver_server::router::build_router;
use quaver_server::storage::UploadStore;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    /// Owns the upload directory for the harness lifetime.
    pub upload_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration and in-memory DB.
    ///
    /// The configured upload dir is replaced with a fresh temp directory so
    /// tests never touch the real filesystem layout.
    pub fn with_config(mut config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let upload_dir = tempfile::tempdir().expect("failed to create temp upload dir");
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let store = Arc::new(UploadStore::new(config.storage.upload_dir.clone()));

        let ctx = AppContext {
            db: db.clone(),
            config: Arc::new(config),
            store,
        };

        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> quaver_db::pool::PooledConnection {
        quaver_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create a user with a session token, returning `(user_id, token)`.
    pub fn create_user_with_token(&self, username: &str) -> (UserId, String) {
        let conn = self.conn();
        let hash = bcrypt::hash("password", 4).unwrap();
        let user = quaver_db::queries::users::create_user(&conn, username, &hash, "user").unwrap();
        let token = uuid::Uuid::new_v4().to_string();
        quaver_db::queries::auth::create_token(&conn, user.id, &token, "2099-01-01T00:00:00Z")
            .unwrap();
        (user.id, token)
    }

    /// Create a quiz owned by `owner` with one audio track backed by a real
    /// file of `data` bytes. Returns `(quiz_id, audio_id)`.
    pub fn seed_quiz_with_audio(
        &self,
        owner: UserId,
        is_public: bool,
        extension: &str,
        data: &[u8],
    ) -> (QuizId, quaver_core::AudioId) {
        let stored = self.ctx.store.store(data, extension).unwrap();

        let conn = self.conn();
        let quiz =
            quaver_db::queries::quizzes::create_quiz(&conn, owner, "Seeded", None, is_public)
                .unwrap();
        let audio = quaver_db::queries::audios::create_audio(
            &conn,
            Some(quiz.id),
            "Seeded track",
            None,
            None,
            &stored.filename,
            &stored.filepath,
            Some(10.0),
        )
        .unwrap();

        (quiz.id, audio.id)
    }

    /// The anonymous user injected by the auth middleware when auth is
    /// disabled.
    pub fn anonymous_user(&self) -> UserId {
        "00000000-0000-0000-0000-000000000000".parse().unwrap()
    }
}

/// Config with auth enabled and no API key: only DB tokens are accepted.
pub fn auth_enabled_config() -> Config {
    let mut config = Config::default();
    config.auth.enabled = true;
    config
}

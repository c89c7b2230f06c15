use std::sync::Arc;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::middleware::EndpointRateLimiter;
use crate::store::CongressStore;

/// The shared application state, cloneable for Axum's request extraction.
///
/// The record store is a read-only, load-once structure; nothing here is
/// mutated at request time except the rate limiter's sliding windows.
#[derive(Clone)]
pub struct AppState {
    /// The record store behind the query contract (snapshot or sqlite).
    pub store: Arc<dyn CongressStore>,
    /// The database pool, present only with the sqlite backend. Used by the
    /// export route for lead/request audit rows.
    pub db: Option<sqlx::SqlitePool>,
    pub config: Arc<AppConfig>,
    /// The email-delivery client; `None` until credentials are configured.
    pub mailer: Option<Mailer>,
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CongressStore>,
        db: Option<sqlx::SqlitePool>,
        config: AppConfig,
        mailer: Option<Mailer>,
    ) -> Self {
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("/v1/exports", 5, 900),     // 5 exports per 15 minutes
            ("/v1/congresses", 600, 60), // 600 listings per minute
        ]);

        Self { store, db, config: Arc::new(config), mailer, rate_limiter }
    }
}

//! Application state shared by every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, ImageStore};
use crate::jobs::Mailer;
use crate::services::{ServiceContainer, Services};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Redis; rate limiting is skipped without it
    pub cache: Option<Arc<Cache>>,
    pub database: Option<Arc<Database>>,
    pub rate_limit_enabled: bool,
}

impl AppState {
    /// Production wiring over the database, Redis, object store and mail queue.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        image_store: Arc<dyn ImageStore>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let rate_limit_enabled = config.rate_limit_enabled;
        let services = Arc::new(Services::from_connection(
            database.get_connection(),
            image_store,
            mailer,
            config,
        ));

        Self {
            services,
            cache: Some(cache),
            database: Some(database),
            rate_limit_enabled,
        }
    }

    /// State over an arbitrary service container, with no backing infrastructure.
    pub fn new(services: Arc<dyn ServiceContainer>) -> Self {
        Self {
            services,
            cache: None,
            database: None,
            rate_limit_enabled: false,
        }
    }
}

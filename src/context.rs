//! Shared application state, built once at startup and handed to every
//! worker through `web::Data`.

use crate::app_config::AppConfig;
use crate::auth::{ensure_initial_admin, resolve_secret, seed_builtin_roles, AuthService, TokenService};
use crate::cms_config::{CmsConfig, ContentModel};
use crate::content::ContentRepository;
use crate::db::Store;
use crate::error::CmsResult;
use crate::media::MediaService;
use crate::rate_limit::{RateLimitConfig, RateLimits};
use crate::storage::{LocalStorage, StorageBackend};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub content: ContentRepository,
    pub auth: AuthService,
    pub media: MediaService,
    pub rate_limits: RateLimits,
}

impl AppState {
    /// Wires the services around an initialized store. Fails on an unusable
    /// signing secret or an unwritable upload directory.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        model: ContentModel,
        storage: Arc<dyn StorageBackend>,
    ) -> CmsResult<Self> {
        let production = config.is_production();
        let secret = resolve_secret(&config.auth.jwt_secret, production)?;
        let tokens = Arc::new(TokenService::new(
            &secret,
            chrono::Duration::days(config.auth.session_days.max(1)),
        ));

        Ok(Self {
            content: ContentRepository::new(store.clone(), Arc::new(model)),
            auth: AuthService::new(store.clone(), tokens, production),
            media: MediaService::new(store.clone(), storage, config.uploads.clone()),
            rate_limits: RateLimits::new(RateLimitConfig::from_settings(&config.rate_limit)),
            store,
            config,
        })
    }

    /// Loads the content model and opens local upload storage as configured.
    pub fn from_config(config: AppConfig, store: Arc<dyn Store>) -> CmsResult<Self> {
        let model = ContentModel::new(CmsConfig::load(&config.content.model_path)?)?;
        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(&config.uploads.path)?);
        Self::new(config, store, model, storage)
    }

    /// First-run setup: built-in roles and the configured administrator.
    pub async fn bootstrap(&self) -> CmsResult<()> {
        let created = seed_builtin_roles(self.store.as_ref()).await?;
        if created > 0 {
            log::info!("Seeded {} built-in roles", created);
        }
        ensure_initial_admin(
            self.store.as_ref(),
            &self.config.auth.admin_username,
            &self.config.auth.admin_password,
        )
        .await?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}

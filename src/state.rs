//! Shared application state handed to every worker.

use std::sync::Arc;

use actix_web::web;

use crate::config::{Config, EnvKeys};
use crate::db::DbPool;
use crate::services::{ModelGateway, SecretBox, Storage};

/// Everything request handlers receive through `web::Data`.
///
/// Built once at startup and cloned into each worker; every field is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: web::Data<DbPool>,
    pub storage: web::Data<Storage>,
    pub gateway: web::Data<dyn ModelGateway>,
    pub env_keys: web::Data<EnvKeys>,
    pub secret_box: web::Data<SecretBox>,
    pub config: web::Data<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: DbPool,
        storage: Storage,
        gateway: Arc<dyn ModelGateway>,
        env_keys: EnvKeys,
    ) -> Self {
        let secret_box = SecretBox::from_passphrase(&config.encryption_key);
        Self {
            pool: web::Data::new(pool),
            storage: web::Data::new(storage),
            gateway: web::Data::from(gateway),
            env_keys: web::Data::new(env_keys),
            secret_box: web::Data::new(secret_box),
            config: web::Data::new(config),
        }
    }

    /// Register the state as app data.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.pool.clone())
            .app_data(self.storage.clone())
            .app_data(self.gateway.clone())
            .app_data(self.env_keys.clone())
            .app_data(self.secret_box.clone())
            .app_data(self.config.clone());
    }
}

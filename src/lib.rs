pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::database::CandidateStore;
use crate::error::Result;
use crate::middleware::auth::ApiKey;
use crate::services::{
    brevo_service::{BrevoService, ContactSync},
    intake_service::IntakeService,
    review_service::ReviewService,
    telegram_service::{Notifier, TelegramService},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    pub review_service: ReviewService,
    pub intake_service: IntakeService,
    pub api_key: ApiKey,
    pub public_rps: u32,
}

/// Shared outbound client; every upstream call is bounded by the configured timeout.
pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?)
}

pub fn telegram_service(config: &Config, client: Client) -> TelegramService {
    TelegramService::new(
        client,
        config.telegram_api_url.clone(),
        config.telegram_bot_token.clone(),
        config.telegram_admin_chat_id,
    )
}

impl AppState {
    pub fn from_config(config: &Config, store: Arc<dyn CandidateStore>, client: Client) -> Self {
        let contacts = Arc::new(BrevoService::new(
            client.clone(),
            config.brevo_api_url.clone(),
            config.brevo_api_key.clone(),
            config.brevo_list_id,
        ));
        let notifier = Arc::new(telegram_service(config, client));
        Self::with_clients(store, contacts, notifier, &config.api_key, config.public_rps)
    }

    pub fn with_clients(
        store: Arc<dyn CandidateStore>,
        contacts: Arc<dyn ContactSync>,
        notifier: Arc<dyn Notifier>,
        api_key: &str,
        public_rps: u32,
    ) -> Self {
        let review_service = ReviewService::new(store.clone(), contacts, notifier.clone());
        let intake_service = IntakeService::new(store.clone(), notifier);

        Self {
            store,
            review_service,
            intake_service,
            api_key: ApiKey(Arc::from(api_key)),
            public_rps,
        }
    }
}

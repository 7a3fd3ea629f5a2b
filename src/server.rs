use actix_web::{App, HttpServer, middleware::Logger, web};

use crate::config::ServerConfig;
use crate::webhook::{AppState, handle_pull_request};

/// Register the webhook route on `cfg`.
///
/// Only `POST` is routed; other methods on the path get 405.
pub fn configure(cfg: &mut web::ServiceConfig, webhook_path: &str) {
    cfg.service(web::resource(webhook_path).route(web::post().to(handle_pull_request)));
}

pub struct WebhookServer {
    state: web::Data<AppState>,
    config: ServerConfig,
}

impl WebhookServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self {
            state: web::Data::new(state),
            config,
        }
    }

    pub async fn start(&self) -> std::io::Result<()> {
        let state = self.state.clone();
        let webhook_path = self.config.webhook_path.clone();

        tracing::info!(
            "Listening for pull request webhooks on {}:{}{}",
            self.config.bind_address,
            self.config.port,
            webhook_path
        );

        HttpServer::new(move || {
            let webhook_path = webhook_path.clone();
            App::new()
                .app_data(state.clone())
                .wrap(Logger::default())
                .configure(move |cfg| configure(cfg, &webhook_path))
        })
        .bind((self.config.bind_address.as_str(), self.config.port))?
        .run()
        .await
    }
}

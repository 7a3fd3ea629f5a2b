//! Webhook endpoint handler.
//!
//! Checks the event type and signature, parses the pull request payload,
//! runs resolve then decide, and sends the email when the decision says so.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::decision::NotificationDecider;
use crate::errors::{MailError, WebhookError};
use crate::github::parse_pull_request_event;
use crate::models::PullRequestEvent;
use crate::notification::compose;
use crate::traits::Mailer;
use crate::watch::ConfigResolver;

use super::signature::verify_signature;

/// Header name for the GitHub event type.
pub const HEADER_EVENT: &str = "X-Github-Event";
/// Header name for the HMAC-SHA1 signature.
pub const HEADER_SIGNATURE: &str = "X-Hub-Signature";

/// Everything a request needs, built once at startup and shared read-only.
pub struct AppState {
    pub resolver: ConfigResolver,
    pub decider: NotificationDecider,
    pub mailer: Arc<dyn Mailer>,
    pub webhook_secret: SecretString,
}

/// What happened to a pull request delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Notified,
    Ignored,
}

impl AppState {
    pub fn new(
        resolver: ConfigResolver,
        decider: NotificationDecider,
        mailer: Arc<dyn Mailer>,
        webhook_secret: SecretString,
    ) -> Self {
        Self {
            resolver,
            decider,
            mailer,
            webhook_secret,
        }
    }

    /// Resolve, decide and, on a positive decision, send the email.
    pub async fn process(&self, event: &PullRequestEvent) -> Result<Outcome, WebhookError> {
        let resolved = self.resolver.resolve(&event.repo);
        let decision = self.decider.decide(event, resolved.as_ref()).await;

        let Some(resolved) = resolved.filter(|_| decision.notify) else {
            info!("Ignored: {} #{}", event.repo, event.number);
            return Ok(Outcome::Ignored);
        };

        info!(
            "Match: {} #{} ({})",
            event.repo,
            event.number,
            decision.matched_files.join(", ")
        );

        let body_template = match resolved.rule.body_template() {
            Some(path) => Some(tokio::fs::read_to_string(path).await.map_err(|source| {
                MailError::TemplateError {
                    path: path.display().to_string(),
                    source,
                }
            })?),
            None => None,
        };

        let message = compose(event, resolved.rule, &decision, body_template.as_deref());
        self.mailer.send(&message).await?;
        Ok(Outcome::Notified)
    }
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidSignature
            | WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::MissingField(_) | WebhookError::Delivery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

/// `POST` handler for pull request deliveries.
///
/// - 200: not a pull request event, or nothing to notify
/// - 201: notification sent
/// - 400: missing event header, bad signature, body is not JSON
/// - 500: payload missing required fields, delivery failed
pub async fn handle_pull_request(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, WebhookError> {
    let result = handle(&state, &req, &body).await;
    if let Err(e) = &result {
        error!("Webhook rejected: {}", e);
    }
    result
}

async fn handle(
    state: &AppState,
    req: &HttpRequest,
    body: &[u8],
) -> Result<HttpResponse, WebhookError> {
    let event_type = header(req, HEADER_EVENT).ok_or(WebhookError::MissingHeader(HEADER_EVENT))?;

    if event_type != "pull_request" {
        info!("Ignored: Not a pull request ({})", event_type);
        return Ok(HttpResponse::Ok().finish());
    }

    let signature = header(req, HEADER_SIGNATURE).ok_or(WebhookError::InvalidSignature)?;
    if !verify_signature(
        body,
        signature,
        state.webhook_secret.expose_secret().as_bytes(),
    ) {
        return Err(WebhookError::InvalidSignature);
    }

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(WebhookError::InvalidJson)?;
    let event = parse_pull_request_event(value)?;

    match state.process(&event).await? {
        Outcome::Notified => Ok(HttpResponse::Created().finish()),
        Outcome::Ignored => Ok(HttpResponse::Ok().finish()),
    }
}

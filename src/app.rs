use std::sync::Arc;

use crate::config::{Config, Secrets};
use crate::decision::NotificationDecider;
use crate::errors::AppError;
use crate::github::GitHubClient;
use crate::notification::SmtpMailer;
use crate::notification::mailer::validate_recipients;
use crate::server::WebhookServer;
use crate::watch::ConfigResolver;
use crate::webhook::AppState;

/// Main application structure
pub struct Application;

impl Application {
    /// Build the shared request state from configuration and secrets
    pub fn build_state(config: &Config, secrets: Secrets) -> Result<AppState, AppError> {
        let resolver = ConfigResolver::from_config(&config.watch)?;
        if resolver.rules().is_empty() {
            tracing::warn!("No watch rules configured, every pull request will be ignored");
        }
        validate_recipients(resolver.rules())?;

        let github_client = GitHubClient::new(config.github.clone(), secrets.github_token.clone())?;
        let mailer = SmtpMailer::new(&config.mail, &secrets)?;

        Ok(AppState::new(
            resolver,
            NotificationDecider::new(Arc::new(github_client)),
            Arc::new(mailer),
            secrets.webhook_secret,
        ))
    }

    /// Run the webhook server until it is shut down
    pub async fn serve(config: Config) -> Result<(), AppError> {
        let secrets = Secrets::from_env()?;
        let state = Self::build_state(&config, secrets)?;

        tracing::info!(
            "PR Watcher starting with {} watch rule(s)",
            state.resolver.rules().len()
        );

        WebhookServer::new(state, config.server.clone())
            .start()
            .await
            .map_err(|source| AppError::Server { source })?;

        tracing::info!("PR Watcher shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::errors::ConfigError;
    use secrecy::SecretString;

    fn secrets() -> Secrets {
        Secrets {
            webhook_secret: SecretString::new("abc".to_string()),
            github_token: SecretString::new("123".to_string()),
            mail_username: None,
            mail_password: None,
        }
    }

    #[test]
    fn test_build_state() {
        let config = parse_config(
            r#"
            [mail]
            default_sender = "watcher@example.com"

            [[watch]]
            repo = "a/b"
            patterns = ["documents/*"]
            recipients = "nobody@example.com"
            "#,
        )
        .unwrap();

        let state = Application::build_state(&config, secrets()).unwrap();
        assert_eq!(state.resolver.rules().len(), 1);
    }

    #[test]
    fn test_build_state_with_invalid_recipient() {
        let config = parse_config(
            r#"
            [mail]
            default_sender = "watcher@example.com"

            [[watch]]
            repo = "a/b"
            patterns = ["documents/*"]
            recipients = "not an address"
            "#,
        )
        .unwrap();

        assert!(matches!(
            Application::build_state(&config, secrets()),
            Err(AppError::Config(ConfigError::ValidationError { .. }))
        ));
    }

    #[test]
    fn test_build_state_with_invalid_pattern() {
        let config = parse_config(
            r#"
            [mail]
            default_sender = "watcher@example.com"

            [[watch]]
            repo = "a/b"
            patterns = ["documents/["]
            recipients = "nobody@example.com"
            "#,
        )
        .unwrap();

        assert!(matches!(
            Application::build_state(&config, secrets()),
            Err(AppError::Config(_))
        ));
    }
}

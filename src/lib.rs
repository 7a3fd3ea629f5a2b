pub mod app;
pub mod cli;
pub mod config;
pub mod decision;
pub mod errors;
pub mod github;
pub mod logger;
pub mod models;
pub mod notification;
pub mod server;
pub mod traits;
pub mod watch;
pub mod webhook;

pub use config::{Config, Secrets, WatchRuleConfig};
pub use decision::{Decision, NotificationDecider};
pub use errors::{AppError, ConfigError, GitHubError, MailError, WebhookError};
pub use github::GitHubClient;
pub use models::{PullRequestAction, PullRequestDetails, PullRequestEvent};
pub use notification::{EmailMessage, SmtpMailer};
pub use traits::{CodeHost, Mailer};
pub use watch::{ConfigResolver, ResolvedMatch, WatchRule};
pub use webhook::AppState;

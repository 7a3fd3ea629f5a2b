use async_trait::async_trait;

use crate::errors::{GitHubError, MailError};
use crate::models::PullRequestDetails;
use crate::notification::EmailMessage;

/// Trait for the code host the decision engine reads pull requests from,
/// allowing the engine to run without network access in tests
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Fetch a pull request together with its full changed-file list
    async fn get_pull_request(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestDetails, GitHubError>;

    /// File names changed between `base` and `head` (`base...head`)
    async fn get_files_changed_between(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, GitHubError>;
}

/// Trait for delivering a composed notification email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

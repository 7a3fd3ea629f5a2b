use serde::{Deserialize, Serialize};

/// What happened to the pull request.
///
/// Only `Opened`, `Closed`, `Reopened` and `Synchronize` can lead to a
/// notification; anything else is carried as `Other` for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Closed,
    Reopened,
    /// New commits were pushed; `previous_head` is the head SHA before the push.
    Synchronize { previous_head: String },
    Other(String),
}

impl PullRequestAction {
    pub fn as_str(&self) -> &str {
        match self {
            PullRequestAction::Opened => "opened",
            PullRequestAction::Closed => "closed",
            PullRequestAction::Reopened => "reopened",
            PullRequestAction::Synchronize { .. } => "synchronize",
            PullRequestAction::Other(name) => name,
        }
    }
}

impl std::fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request webhook delivery, reduced to what the decision needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    /// `owner/name`
    pub repo: String,
    pub number: u64,
    pub is_private: bool,
    pub sender: Option<String>,
}

/// Pull request state fetched from the code host at decision time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDetails {
    pub title: String,
    /// Every file changed by the pull request, in the order the host lists them.
    pub files: Vec<String>,
    /// Target branch name.
    pub base_branch: String,
    pub merged: bool,
    pub creator: String,
    pub html_url: String,
}

use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::models::{PullRequestAction, PullRequestEvent};
use crate::watch::WatchRule;

/// A notification email ready to hand to a [`crate::traits::Mailer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

const DEFAULT_BODY: &str = "\
A pull request has files you might be interested in.

\"{title}\" ({pr_url}
by {creator})
against the {repo}
repository (branch {branch})
has been {action}.

Changed files matching the filter:

{modified_files}

--
PR Watcher Notifier
";

/// Values that subject and body templates can refer to as `{name}`.
#[derive(Debug, Clone)]
pub struct EmailContext {
    pub repo: String,
    pub number: u64,
    pub title: String,
    /// Human wording: `opened`, `updated`, `merged`, `closed`, `reopened`.
    pub action: String,
    pub creator: String,
    pub pr_url: String,
    pub branch: String,
    pub patterns: String,
    pub modified_files: Vec<String>,
}

impl EmailContext {
    pub fn new(event: &PullRequestEvent, rule: &WatchRule, decision: &Decision) -> Self {
        let pull_request = decision.pull_request.clone().unwrap_or_default();

        let action = match &event.action {
            PullRequestAction::Synchronize { .. } => "updated".to_string(),
            PullRequestAction::Closed if pull_request.merged => "merged".to_string(),
            other => other.to_string(),
        };

        Self {
            repo: event.repo.clone(),
            number: event.number,
            title: pull_request.title,
            action,
            creator: pull_request.creator,
            pr_url: pull_request.html_url,
            branch: pull_request.base_branch,
            patterns: rule.patterns().raw().collect::<Vec<_>>().join(", "),
            modified_files: decision.matched_files.clone(),
        }
    }

    /// Substitute every known `{name}` in `template`; unknown names stay as is.
    ///
    /// Single pass: text coming from a value is never substituted again.
    pub fn render(&self, template: &str) -> String {
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let value = after
                .find('}')
                .and_then(|close| Some((close, self.value(&after[..close])?)));
            match value {
                Some((close, value)) => {
                    rendered.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }

    fn value(&self, name: &str) -> Option<String> {
        let value = match name {
            "repo" => self.repo.clone(),
            "number" => self.number.to_string(),
            "title" => self.title.clone(),
            "action" => self.action.clone(),
            "creator" => self.creator.clone(),
            "pr_url" => self.pr_url.clone(),
            "branch" => self.branch.clone(),
            "patterns" => self.patterns.clone(),
            "modified_files" => self
                .modified_files
                .iter()
                .map(|file| format!("  * {}", file))
                .collect::<Vec<_>>()
                .join("\n\n"),
            _ => return None,
        };
        Some(value)
    }
}

/// Build the email for a positive decision.
///
/// `body_template` is the content of the rule's body template file, if any.
pub fn compose(
    event: &PullRequestEvent,
    rule: &WatchRule,
    decision: &Decision,
    body_template: Option<&str>,
) -> EmailMessage {
    let context = EmailContext::new(event, rule, decision);

    EmailMessage {
        recipients: rule.recipients().to_vec(),
        subject: context.render(rule.subject()),
        body: context
            .render(body_template.unwrap_or(DEFAULT_BODY))
            .trim()
            .to_string(),
    }
}

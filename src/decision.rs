//! Whether a pull request event is worth an email.
//!
//! The decider looks at the pull request's current file list, and on
//! `synchronize` also at the files that were already part of the pull request
//! before the push, so an update that only carries along previously seen
//! matches does not notify again.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{PullRequestAction, PullRequestDetails, PullRequestEvent};
use crate::traits::CodeHost;
use crate::watch::{PatternList, ResolvedMatch};

/// Outcome of [`NotificationDecider::decide`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub notify: bool,
    /// Files of the current snapshot that matched, in discovery order.
    /// Each file appears once, even when several patterns match it.
    /// Kept even when dedup turns `notify` off.
    pub matched_files: Vec<String>,
    /// The pull request as fetched, when the fetch happened and succeeded.
    pub pull_request: Option<PullRequestDetails>,
}

impl Decision {
    /// Nothing to report.
    pub fn ignore() -> Self {
        Self::default()
    }
}

/// Decides notify / no-notify for one event using the code host.
#[derive(Clone)]
pub struct NotificationDecider {
    host: Arc<dyn CodeHost>,
}

impl NotificationDecider {
    pub fn new(host: Arc<dyn CodeHost>) -> Self {
        Self { host }
    }

    /// Lookup failures never escape: they come back as [`Decision::ignore`].
    pub async fn decide(
        &self,
        event: &PullRequestEvent,
        resolved: Option<&ResolvedMatch<'_>>,
    ) -> Decision {
        let previous_head = match &event.action {
            PullRequestAction::Opened | PullRequestAction::Closed | PullRequestAction::Reopened => {
                None
            }
            PullRequestAction::Synchronize { previous_head } => Some(previous_head.as_str()),
            PullRequestAction::Other(action) => {
                debug!("Action {} on {} #{} is ignored", action, event.repo, event.number);
                return Decision::ignore();
            }
        };

        let Some(resolved) = resolved else {
            debug!("No watch rule applies to {}", event.repo);
            return Decision::ignore();
        };
        let rule = resolved.rule;

        if event.is_private && resolved.wildcard_matched && !rule.notify_for_private_repos() {
            info!(
                "{} is a private repo for which notifications have not been explicitly enabled",
                event.repo
            );
            return Decision::ignore();
        }

        let pull_request = match self.host.get_pull_request(&event.repo, event.number).await {
            Ok(pull_request) => pull_request,
            Err(e) => {
                info!(
                    "Failed to retrieve the details of {} #{}: {}",
                    event.repo, event.number, e
                );
                return Decision::ignore();
            }
        };

        let matched_files = matching_files(rule.patterns(), &pull_request.files);
        let mut notify = !matched_files.is_empty();

        if notify && let Some(previous_head) = previous_head {
            let earlier_files = match self
                .host
                .get_files_changed_between(&event.repo, &pull_request.base_branch, previous_head)
                .await
            {
                Ok(files) => files,
                Err(e) => {
                    warn!(
                        "Failed to retrieve the files changed before the update to {} #{}: {}",
                        event.repo, event.number, e
                    );
                    return Decision::ignore();
                }
            };

            if let Some(file) = earlier_files.iter().find(|f| rule.patterns().is_match(f)) {
                info!(
                    "{} #{} already touched {} before this update, not notifying again",
                    event.repo, event.number, file
                );
                notify = false;
            }
        }

        Decision {
            notify,
            matched_files,
            pull_request: Some(pull_request),
        }
    }
}

/// Files matching any pattern, each listed once (not once per matching
/// pattern), in file-list order.
fn matching_files(patterns: &PatternList, files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter(|file| match patterns.first_match(file) {
            Some(pattern) => {
                debug!("{} matches {}", file, pattern);
                true
            }
            None => false,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchRuleConfig;
    use crate::errors::GitHubError;
    use crate::watch::WatchRule;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Code host serving a canned pull request and comparison.
    struct FakeHost {
        files: Option<Vec<&'static str>>,
        earlier_files: Option<Vec<&'static str>>,
        compared: Mutex<Vec<(String, String)>>,
    }

    impl FakeHost {
        fn new(files: &[&'static str], earlier_files: &[&'static str]) -> Self {
            Self {
                files: Some(files.to_vec()),
                earlier_files: Some(earlier_files.to_vec()),
                compared: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn get_pull_request(
            &self,
            repo: &str,
            number: u64,
        ) -> Result<PullRequestDetails, GitHubError> {
            let files = self.files.as_ref().ok_or_else(|| GitHubError::NotFound {
                resource_type: "pull_request".to_string(),
                resource_id: format!("{}#{}", repo, number),
            })?;
            Ok(PullRequestDetails {
                title: "Update docs".to_string(),
                files: files.iter().map(|f| f.to_string()).collect(),
                base_branch: "master".to_string(),
                merged: false,
                creator: "octocat".to_string(),
                html_url: format!("https://github.com/{}/pull/{}", repo, number),
            })
        }

        async fn get_files_changed_between(
            &self,
            _repo: &str,
            base: &str,
            head: &str,
        ) -> Result<Vec<String>, GitHubError> {
            self.compared
                .lock()
                .unwrap()
                .push((base.to_string(), head.to_string()));
            self.earlier_files
                .as_ref()
                .map(|files| files.iter().map(|f| f.to_string()).collect())
                .ok_or_else(|| GitHubError::ApiError {
                    message: "comparison failed".to_string(),
                })
        }
    }

    fn rule(notify_for_private_repos: bool) -> WatchRule {
        WatchRule::from_config(&WatchRuleConfig {
            repo: "a/b".to_string(),
            patterns: vec!["documents/*".to_string()],
            exclude: vec![],
            recipients: vec!["nobody@example.com".to_string()],
            subject: "Change in {repo}".to_string(),
            body_template: None,
            notify_for_private_repos,
        })
        .unwrap()
    }

    fn event(action: PullRequestAction, is_private: bool) -> PullRequestEvent {
        PullRequestEvent {
            action,
            repo: "a/b".to_string(),
            number: 1,
            is_private,
            sender: None,
        }
    }

    fn synchronize() -> PullRequestAction {
        PullRequestAction::Synchronize {
            previous_head: "123".to_string(),
        }
    }

    const CURRENT: &[&str] = &["documents/file1.rst", "elsewhere/file2.py"];

    #[tokio::test]
    async fn test_opened_with_matching_files() {
        let host = Arc::new(FakeHost::new(CURRENT, &[]));
        let decider = NotificationDecider::new(host.clone());
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), Some(&resolved))
            .await;

        assert!(decision.notify);
        assert_eq!(decision.matched_files, vec!["documents/file1.rst"]);
        assert_eq!(decision.pull_request.unwrap().title, "Update docs");
        assert!(host.compared.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_and_reopened_are_evaluated() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(CURRENT, &[])));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        for action in [PullRequestAction::Closed, PullRequestAction::Reopened] {
            let decision = decider.decide(&event(action, false), Some(&resolved)).await;
            assert!(decision.notify);
        }
    }

    #[tokio::test]
    async fn test_no_files_matching() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(&["code/module.py"], &[])));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), Some(&resolved))
            .await;

        assert!(!decision.notify);
        assert!(decision.matched_files.is_empty());
    }

    #[tokio::test]
    async fn test_all_matching_files_are_collected() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(
            &["documents/a.rst", "src/lib.rs", "documents/b.rst"],
            &[],
        )));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), Some(&resolved))
            .await;

        assert_eq!(
            decision.matched_files,
            vec!["documents/a.rst", "documents/b.rst"]
        );
    }

    #[tokio::test]
    async fn test_file_matching_several_patterns_is_listed_once() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(
            &["documents/a.rst", "documents/b.py"],
            &[],
        )));
        let rule = WatchRule::from_config(&WatchRuleConfig {
            repo: "a/b".to_string(),
            patterns: vec!["documents/*".to_string(), "*.rst".to_string()],
            exclude: vec![],
            recipients: vec!["nobody@example.com".to_string()],
            subject: "Change in {repo}".to_string(),
            body_template: None,
            notify_for_private_repos: false,
        })
        .unwrap();
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), Some(&resolved))
            .await;

        assert_eq!(
            decision.matched_files,
            vec!["documents/a.rst", "documents/b.py"]
        );
    }

    #[tokio::test]
    async fn test_ignored_actions() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(CURRENT, &[])));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        for action in ["edited", "labeled", "assigned", "ready_for_review"] {
            let decision = decider
                .decide(
                    &event(PullRequestAction::Other(action.to_string()), false),
                    Some(&resolved),
                )
                .await;
            assert_eq!(decision, Decision::ignore());
        }
    }

    #[tokio::test]
    async fn test_no_rule() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(CURRENT, &[])));

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), None)
            .await;

        assert_eq!(decision, Decision::ignore());
    }

    #[tokio::test]
    async fn test_synchronize_introducing_matches_notifies() {
        let host = Arc::new(FakeHost::new(CURRENT, &["a", "b"]));
        let decider = NotificationDecider::new(host.clone());
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(synchronize(), false), Some(&resolved))
            .await;

        assert!(decision.notify);
        assert_eq!(
            host.compared.lock().unwrap().as_slice(),
            [("master".to_string(), "123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_synchronize_already_notified_is_suppressed() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(
            CURRENT,
            &["documents/file1.rst"],
        )));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(synchronize(), false), Some(&resolved))
            .await;

        assert!(!decision.notify);
        assert_eq!(decision.matched_files, vec!["documents/file1.rst"]);
    }

    #[tokio::test]
    async fn test_synchronize_without_matches_skips_comparison() {
        let host = Arc::new(FakeHost::new(&["src/main.rs"], &["documents/file1.rst"]));
        let decider = NotificationDecider::new(host.clone());
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(synchronize(), false), Some(&resolved))
            .await;

        assert!(!decision.notify);
        assert!(host.compared.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_private_repo_with_wildcard_match_is_skipped() {
        let host = Arc::new(FakeHost::new(CURRENT, &["a", "b"]));
        let decider = NotificationDecider::new(host);
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: true,
        };

        let decision = decider
            .decide(&event(synchronize(), true), Some(&resolved))
            .await;

        assert_eq!(decision, Decision::ignore());
    }

    #[tokio::test]
    async fn test_private_repo_with_exact_match_notifies() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(CURRENT, &["a", "b"])));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(synchronize(), true), Some(&resolved))
            .await;

        assert!(decision.notify);
    }

    #[tokio::test]
    async fn test_private_repo_with_wildcard_match_and_opt_in_notifies() {
        let decider = NotificationDecider::new(Arc::new(FakeHost::new(CURRENT, &["a", "b"])));
        let rule = rule(true);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: true,
        };

        let decision = decider
            .decide(&event(synchronize(), true), Some(&resolved))
            .await;

        assert!(decision.notify);
    }

    #[tokio::test]
    async fn test_pull_request_lookup_failure() {
        let host = FakeHost {
            files: None,
            earlier_files: Some(vec![]),
            compared: Mutex::new(Vec::new()),
        };
        let decider = NotificationDecider::new(Arc::new(host));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(PullRequestAction::Opened, false), Some(&resolved))
            .await;

        assert_eq!(decision, Decision::ignore());
    }

    #[tokio::test]
    async fn test_comparison_failure() {
        let host = FakeHost {
            files: Some(CURRENT.to_vec()),
            earlier_files: None,
            compared: Mutex::new(Vec::new()),
        };
        let decider = NotificationDecider::new(Arc::new(host));
        let rule = rule(false);
        let resolved = ResolvedMatch {
            rule: &rule,
            wildcard_matched: false,
        };

        let decision = decider
            .decide(&event(synchronize(), false), Some(&resolved))
            .await;

        assert_eq!(decision, Decision::ignore());
    }
}

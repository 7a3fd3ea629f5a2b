use std::fmt;
use std::path::{Path, PathBuf};

use globset::GlobMatcher;

use crate::config::WatchRuleConfig;
use crate::errors::ConfigError;

use super::patterns::{PatternList, compile_glob, is_wildcard};

/// A compiled watch rule: which repositories it covers, which file paths it
/// watches and who gets told about them.
///
/// Built once from [`WatchRuleConfig`] at startup and never mutated.
#[derive(Clone)]
pub struct WatchRule {
    key: String,
    key_matcher: GlobMatcher,
    wildcard: bool,
    patterns: PatternList,
    excludes: PatternList,
    recipients: Vec<String>,
    subject: String,
    body_template: Option<PathBuf>,
    notify_for_private_repos: bool,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("key", &self.key)
            .field("patterns", &self.patterns)
            .field("excludes", &self.excludes)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn from_config(config: &WatchRuleConfig) -> Result<Self, ConfigError> {
        if config.recipients.is_empty() {
            return Err(ConfigError::ValidationError {
                reason: format!("watch rule {:?} has no recipients", config.repo),
            });
        }

        Ok(Self {
            key: config.repo.clone(),
            key_matcher: compile_glob(&config.repo, &config.repo)?,
            wildcard: is_wildcard(&config.repo),
            patterns: PatternList::compile(&config.repo, &config.patterns)?,
            excludes: PatternList::compile(&config.repo, &config.exclude)?,
            recipients: config.recipients.clone(),
            subject: config.subject.clone(),
            body_template: config.body_template.clone(),
            notify_for_private_repos: config.notify_for_private_repos,
        })
    }

    /// The repository key this rule was configured under, e.g. `org/*`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Whether `repo` satisfies this rule's key glob.
    pub fn covers(&self, repo: &str) -> bool {
        self.key_matcher.is_match(repo)
    }

    /// Whether `repo` is listed in this rule's `exclude` globs.
    pub fn excludes(&self, repo: &str) -> bool {
        self.excludes.is_match(repo)
    }

    /// File path globs, in configured order.
    pub fn patterns(&self) -> &PatternList {
        &self.patterns
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body_template(&self) -> Option<&Path> {
        self.body_template.as_deref()
    }

    pub fn notify_for_private_repos(&self) -> bool {
        self.notify_for_private_repos
    }
}

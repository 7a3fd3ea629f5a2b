use tracing::debug;

use crate::config::WatchRuleConfig;
use crate::errors::ConfigError;

use super::rule::WatchRule;

/// The rule that applies to a repository, and how it was reached.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMatch<'a> {
    pub rule: &'a WatchRule,
    /// True when the rule key was a glob such as `org/*` rather than the
    /// exact repository name. Gates the private repository opt-in.
    pub wildcard_matched: bool,
}

/// Maps `owner/name` to the watch rule that applies to it.
///
/// Precedence:
///
/// - a key whose rule excludes the repository is skipped entirely;
/// - an exact key wins immediately over any wildcard key;
/// - among wildcard keys only, the last one in configuration order wins.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    rules: Vec<WatchRule>,
}

impl ConfigResolver {
    pub fn new(rules: Vec<WatchRule>) -> Self {
        Self { rules }
    }

    /// Compile every configured rule, failing on the first invalid one.
    pub fn from_config(rules: &[WatchRuleConfig]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(WatchRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Resolve the rule for `repo`; `None` when nothing applies.
    pub fn resolve(&self, repo: &str) -> Option<ResolvedMatch<'_>> {
        let mut resolved = None;

        for rule in &self.rules {
            if !rule.covers(repo) {
                continue;
            }
            if rule.excludes(repo) {
                debug!("{} is excluded from watch rule {}", repo, rule.key());
                continue;
            }
            if !rule.is_wildcard() {
                return Some(ResolvedMatch {
                    rule,
                    wildcard_matched: false,
                });
            }
            // 後勝ち
            resolved = Some(ResolvedMatch {
                rule,
                wildcard_matched: true,
            });
        }

        resolved
    }
}

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::ConfigError;

/// Characters that turn a repository key into a wildcard key.
const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// An ordered list of compiled shell-style globs.
///
/// Matching follows `fnmatch` semantics: `*` also crosses `/`, so
/// `documents/*` matches `documents/sub/file.rst`.
#[derive(Clone, Default)]
pub struct PatternList {
    patterns: Vec<(String, GlobMatcher)>,
}

impl fmt::Debug for PatternList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(|(raw, _)| raw))
            .finish()
    }
}

impl PatternList {
    /// Compile `patterns` in order. `repo` is only used in error messages.
    pub fn compile(repo: &str, patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|raw| compile_glob(repo, raw).map(|matcher| (raw.clone(), matcher)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// The first pattern (in configured order) matching `path`.
    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, matcher)| matcher.is_match(path))
            .map(|(raw, _)| raw.as_str())
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Raw pattern strings as they appear in the configuration.
    pub fn raw(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(raw, _)| raw.as_str())
    }
}

/// Compile a single glob; literal `/` is not special.
///
/// Only `*`, `?` and `[...]` are special. Braces and backslashes match
/// themselves.
pub fn compile_glob(repo: &str, raw: &str) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(&escape_braces(raw))
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| ConfigError::InvalidPattern {
            repo: repo.to_string(),
            pattern: raw.to_string(),
            source,
        })
}

/// Rewrite `{` and `}` outside character classes as `[{]` and `[}]`.
fn escape_braces(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    // Characters seen since the class opened, when inside `[...]`.
    let mut class: Option<usize> = None;

    for c in raw.chars() {
        match (class, c) {
            (None, '{') => escaped.push_str("[{]"),
            (None, '}') => escaped.push_str("[}]"),
            (None, '[') => {
                class = Some(0);
                escaped.push(c);
            }
            (Some(0), '!') => escaped.push(c),
            (Some(n), ']') if n > 0 => {
                class = None;
                escaped.push(c);
            }
            (Some(n), c) => {
                class = Some(n + 1);
                escaped.push(c);
            }
            (None, c) => escaped.push(c),
        }
    }
    escaped
}

/// Whether a repository key is a glob rather than an exact `owner/name`.
pub fn is_wildcard(key: &str) -> bool {
    key.contains(WILDCARD_CHARS)
}

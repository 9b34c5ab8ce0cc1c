// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Matchers decide whether a subscription applies to an event
//!
//! Supports:
//!   - Exact: "user.created" (case-sensitive)
//!   - Case-insensitive exact: "User.Created" matches "user.created"
//!   - Wildcard: "user.*" matches "user.created", "?" matches zero or one character
//!   - Regex: any `regex` crate expression, searched in the name
//!   - Predicate: arbitrary function of name and payload

use super::event::{EventName, Payload};
use crate::error::BusError;
use regex::Regex;
use std::fmt;

/// Predicate over an event's name and payload
pub trait Matcher: Send + Sync {
    fn matches(&self, name: &EventName, data: &Payload) -> bool;

    /// Human-readable form for logs and diagnostics
    fn describe(&self) -> String;
}

/// Matches one name exactly
#[derive(Clone, Debug)]
pub struct ExactMatcher(EventName);

impl ExactMatcher {
    pub fn new(name: impl Into<EventName>) -> Self {
        Self(name.into())
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, name: &EventName, _data: &Payload) -> bool {
        self.0 == *name
    }

    fn describe(&self) -> String {
        self.0.to_string()
    }
}

/// Matches one name, ignoring case
#[derive(Clone, Debug)]
pub struct CaseInsensitiveMatcher {
    name: String,
    folded: String,
}

impl CaseInsensitiveMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let folded = name.to_lowercase();
        Self { name, folded }
    }
}

impl Matcher for CaseInsensitiveMatcher {
    fn matches(&self, name: &EventName, _data: &Payload) -> bool {
        name.as_str().to_lowercase() == self.folded
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Glob {
    /// `*`: zero or more characters
    Any,
    /// `?`: zero or one character
    Optional,
    Literal(char),
}

/// Glob-style pattern over the whole name
///
/// `*` matches any run of characters (including none), `?` matches at most
/// one character, everything else is literal. The pattern is anchored at
/// both ends, so `"user.*"` does not match `"poweruser.created"`.
#[derive(Clone, Debug)]
pub struct WildcardMatcher {
    pattern: String,
    tokens: Vec<Glob>,
}

impl WildcardMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let mut tokens = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            let token = match c {
                '*' => Glob::Any,
                '?' => Glob::Optional,
                other => Glob::Literal(other),
            };
            // Runs of `*` are equivalent to one
            if token == Glob::Any && tokens.last() == Some(&Glob::Any) {
                continue;
            }
            tokens.push(token);
        }
        Self { pattern, tokens }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check the pattern against a bare string
    pub fn matches_str(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let n = text.len();

        // reachable[j]: the tokens consumed so far can match text[..j]
        let mut reachable = vec![false; n + 1];
        reachable[0] = true;

        for token in &self.tokens {
            let mut next = vec![false; n + 1];
            match token {
                Glob::Any => {
                    let mut seen = false;
                    for j in 0..=n {
                        seen |= reachable[j];
                        next[j] = seen;
                    }
                }
                Glob::Optional => {
                    for j in 0..=n {
                        next[j] = reachable[j] || (j > 0 && reachable[j - 1]);
                    }
                }
                Glob::Literal(c) => {
                    for j in 1..=n {
                        next[j] = reachable[j - 1] && text[j - 1] == *c;
                    }
                }
            }
            if !next.iter().any(|r| *r) {
                return false;
            }
            reachable = next;
        }

        reachable[n]
    }
}

impl Matcher for WildcardMatcher {
    fn matches(&self, name: &EventName, _data: &Payload) -> bool {
        self.matches_str(name.as_str())
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }
}

/// Regular-expression search over the name
///
/// Unanchored: use `^...$` to require a whole-name match.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compile `pattern`, failing with [`BusError::InvalidPattern`]
    pub fn new(pattern: impl Into<String>) -> Result<Self, BusError> {
        let pattern = pattern.into();
        match Regex::new(&pattern) {
            Ok(regex) => Ok(Self { regex }),
            Err(source) => Err(BusError::InvalidPattern { pattern, source }),
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, name: &EventName, _data: &Payload) -> bool {
        self.regex.is_match(name.as_str())
    }

    fn describe(&self) -> String {
        self.regex.as_str().to_string()
    }
}

/// Arbitrary caller-supplied predicate
#[derive(Clone)]
pub struct PredicateMatcher<F>(F);

impl<F> fmt::Debug for PredicateMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateMatcher")
    }
}

impl<F> Matcher for PredicateMatcher<F>
where
    F: Fn(&EventName, &Payload) -> bool + Send + Sync,
{
    fn matches(&self, name: &EventName, data: &Payload) -> bool {
        (self.0)(name, data)
    }

    fn describe(&self) -> String {
        "predicate".to_string()
    }
}

/// Wrap a closure as a matcher
pub fn predicate<F>(f: F) -> PredicateMatcher<F>
where
    F: Fn(&EventName, &Payload) -> bool + Send + Sync,
{
    PredicateMatcher(f)
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;

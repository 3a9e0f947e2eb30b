// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `*`/`?` glob matching over agent names, case-insensitive, with an optional
//! `group:<name>` prefix (spec §4.2 "Agent selection" (iii)).

/// One parsed selection pattern.
pub enum AgentPattern {
    /// Matches every agent (no `pattern` supplied).
    Any,
    /// `group:<name>` — matches agents whose `Agent.group` equals `name`.
    Group(String),
    /// A `*`/`?` glob over `Agent.name`, case-insensitive.
    NameGlob(String),
}

impl AgentPattern {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => AgentPattern::Any,
            Some(p) => match p.strip_prefix("group:") {
                Some(group) => AgentPattern::Group(group.to_string()),
                None => AgentPattern::NameGlob(p.to_string()),
            },
        }
    }

    pub fn matches(&self, name: &str, group: Option<&str>) -> bool {
        match self {
            AgentPattern::Any => true,
            AgentPattern::Group(g) => group.map(|ag| ag.eq_ignore_ascii_case(g)).unwrap_or(false),
            AgentPattern::NameGlob(glob) => glob_match(glob, name),
        }
    }
}

/// Minimal case-insensitive `*`/`?` glob matcher, no other wildcard syntax.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_ascii_lowercase().chars().collect();
    let text: Vec<char> = text.to_ascii_lowercase().chars().collect();
    glob_match_inner(&pattern, &text)
}

fn glob_match_inner(pattern: &[char], text: &[char]) -> bool {
    // Standard DP-free recursive glob matcher; patterns in workflow
    // definitions are short (agent-name length), so recursion depth is bounded.
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            glob_match_inner(&pattern[1..], text)
                || (!text.is_empty() && glob_match_inner(pattern, &text[1..]))
        }
        Some('?') => !text.is_empty() && glob_match_inner(&pattern[1..], &text[1..]),
        Some(c) => text.first() == Some(c) && glob_match_inner(&pattern[1..], &text[1..]),
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;

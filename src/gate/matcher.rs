//! Path template matching.
//!
//! # Responsibilities
//! - Strip each registered base path from the request positionally
//! - Prefix the lowercased method as segment 0
//! - Compare against the template segment by segment
//!
//! # Design Decisions
//! - Placeholders (`{name}`) match any single segment, including an empty one
//! - Literal segments are case-sensitive; only the method is lowercased
//! - Arity must match exactly
//! - Overlapping templates: most literal segments wins, then registry order
//! - Linear scan over the registry (no index)

use crate::registry::{is_placeholder, PathSpecRegistry, RegisteredPath};

/// Result of resolving a request against the registry.
#[derive(Debug, Clone, Copy)]
pub enum MatchResult<'a> {
    NoMatch,
    Matched(&'a RegisteredPath),
}

impl<'a> MatchResult<'a> {
    pub fn matched(self) -> Option<&'a RegisteredPath> {
        match self {
            MatchResult::Matched(path) => Some(path),
            MatchResult::NoMatch => None,
        }
    }
}

/// Find the registered path whose template matches the request.
pub fn match_path<'a, S: AsRef<str>>(
    registry: &'a PathSpecRegistry,
    method: &str,
    segments: &[S],
) -> MatchResult<'a> {
    let method = method.to_lowercase();

    registry
        .iter()
        .filter(|path| template_matches(path, &method, segments))
        .min_by_key(|path| path.placeholder_count())
        .map_or(MatchResult::NoMatch, MatchResult::Matched)
}

/// `method` must already be lowercase.
fn template_matches<S: AsRef<str>>(path: &RegisteredPath, method: &str, segments: &[S]) -> bool {
    let Some(tail) = segments.get(path.base_depth()..) else {
        return false;
    };
    let template = path.template_segments();
    if template.len() != tail.len() + 1 {
        return false;
    }

    let comparison = std::iter::once(method).chain(tail.iter().map(|s| s.as_ref()));
    template
        .iter()
        .zip(comparison)
        .all(|(expected, actual)| segment_compatible(expected, actual))
}

fn segment_compatible(template: &str, actual: &str) -> bool {
    is_placeholder(template) || template == actual
}

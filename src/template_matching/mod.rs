/// Template matching module for locating reference images in screen captures
///
/// This module provides:
/// - Normalized cross-correlation matching (feature `correlation`)
/// - Exact byte-for-byte subimage search as a fallback
/// - First-match-wins scanning over an ordered template list
#[cfg(feature = "correlation")]
pub mod correlation;
pub mod exact;
pub mod matcher;
pub mod types;

#[cfg(feature = "correlation")]
pub use correlation::CorrelationMatcher;
pub use exact::ExactMatcher;
pub use matcher::{MatchBackend, MatchStrategy, Matcher};
pub use types::{Location, MatchResult, Template, TemplateId};

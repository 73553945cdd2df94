/// Template matching front end
///
/// Picks a backend once (correlation when compiled in, exact search otherwise)
/// and runs the in-order, first-match-wins scan over a template list.
use super::exact::ExactMatcher;
use super::types::{MatchResult, Template};
use image::RgbaImage;
use std::sync::Arc;

/// One way of locating a template inside a frame
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best match of `template` in `frame`. Never fails: a template that
    /// cannot fit yields `found = false`.
    fn find(&self, frame: &RgbaImage, template: &Template, confidence: f32) -> MatchResult;
}

/// Which backend a [`Matcher`] was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBackend {
    Correlation,
    Exact,
}

/// Template matcher for finding templates in captured frames
pub struct Matcher {
    backend: MatchBackend,
    strategy: Box<dyn MatchStrategy>,
}

impl Matcher {
    /// Use the best backend available in this build
    pub fn detect() -> Self {
        #[cfg(feature = "correlation")]
        {
            Self::correlation()
        }
        #[cfg(not(feature = "correlation"))]
        {
            log::warn!("⚠️ Correlation backend not compiled in, confidence is ignored (exact matching)");
            Self::exact()
        }
    }

    #[cfg(feature = "correlation")]
    pub fn correlation() -> Self {
        Self {
            backend: MatchBackend::Correlation,
            strategy: Box::new(super::correlation::CorrelationMatcher::new()),
        }
    }

    pub fn exact() -> Self {
        Self {
            backend: MatchBackend::Exact,
            strategy: Box::new(ExactMatcher::new()),
        }
    }

    pub fn backend(&self) -> MatchBackend {
        self.backend
    }

    /// Match a single template
    pub fn find(&self, frame: &RgbaImage, template: &Template, confidence: f32) -> MatchResult {
        let result = self.strategy.find(frame, template, confidence);
        log::debug!(
            "🔍 [{}] {}: {}",
            self.strategy.name(),
            template.name(),
            result
        );
        result
    }

    /// Scan `templates` in order and stop at the first hit.
    ///
    /// `keep_going` is consulted before each template so a pending stop
    /// cuts the scan short; in that case `None` is returned.
    pub fn first_match(
        &self,
        frame: &RgbaImage,
        templates: &[Arc<Template>],
        confidence: f32,
        keep_going: impl Fn() -> bool,
    ) -> Option<(Arc<Template>, MatchResult)> {
        for template in templates {
            if !keep_going() {
                log::debug!("⏹️ Template scan interrupted");
                return None;
            }
            let result = self.find(frame, template, confidence);
            if result.found {
                return Some((Arc::clone(template), result));
            }
        }
        None
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("backend", &self.backend)
            .finish()
    }
}

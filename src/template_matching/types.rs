/// Template matching data types
use crate::error::{ClickerError, ClickerResult};
use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEMPLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u64);

impl TemplateId {
    fn next() -> Self {
        Self(NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reference image to search for
#[derive(Debug, Clone)]
pub struct Template {
    id: TemplateId,
    /// Where the image came from; also the duplicate key in the store
    source: PathBuf,
    /// Pixels as loaded (RGBA8)
    bitmap: RgbaImage,
    /// Alpha-free copy used by the correlation backend
    rgb: RgbImage,
}

impl Template {
    /// Decode an image file (PNG, JPEG, BMP) into a template
    pub fn load(path: impl AsRef<Path>) -> ClickerResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| ClickerError::TemplateLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let source = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self::from_image(source, image.to_rgba8())
    }

    /// Wrap an in-memory bitmap, e.g. a crop taken from the screen
    pub fn from_image(source: impl Into<PathBuf>, bitmap: RgbaImage) -> ClickerResult<Self> {
        let source = source.into();
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(ClickerError::invalid(format!(
                "template {} has no pixels",
                source.display()
            )));
        }
        let rgb: RgbImage = bitmap.convert();
        Ok(Self {
            id: TemplateId::next(),
            source,
            bitmap,
            rgb,
        })
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// File name shown in status text
    pub fn name(&self) -> String {
        self.source
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string()
    }
}

/// Top-left position of a match inside the captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub x: u32,
    pub y: u32,
}

/// Outcome of matching one template against one frame
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub found: bool,
    pub location: Option<Location>,
    /// Correlation score (0.0-1.0); `None` in exact-match mode
    pub score: Option<f32>,
    pub template: Option<TemplateId>,
}

impl MatchResult {
    pub fn hit(template: TemplateId, location: Location, score: Option<f32>) -> Self {
        Self {
            found: true,
            location: Some(location),
            score,
            template: Some(template),
        }
    }

    /// No match; `best_score` keeps the surface maximum for logging when there is one
    pub fn miss(best_score: Option<f32>) -> Self {
        Self {
            found: false,
            location: None,
            score: best_score,
            template: None,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.location, self.score) {
            (Some(loc), Some(score)) => write!(
                f,
                "match at ({},{}) - {}%",
                loc.x,
                loc.y,
                (score * 100.0) as u32
            ),
            (Some(loc), None) => write!(f, "exact match at ({},{})", loc.x, loc.y),
            (None, Some(score)) => write!(f, "no match (best {:.3})", score),
            (None, None) => write!(f, "no match"),
        }
    }
}

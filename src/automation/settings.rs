//! Run configuration and its persisted JSON shape

use super::region::Region;
use crate::error::{ClickerError, ClickerResult};
use crate::template_matching::Template;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIDENCE: f32 = 0.8;
pub const DEFAULT_POLL_DELAY_SECS: f64 = 1.0;

/// Knobs for a search run. Delays are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub region: Option<Region>,
    /// Match threshold in (0.0, 1.0]; ignored by the exact matcher
    pub confidence: f32,
    /// Sleep between iterations
    pub poll_delay: f64,
    /// Pointer on target, before the click
    pub pre_click_delay: f64,
    /// Match found, before the pointer moves
    pub post_find_delay: f64,
    /// Move onto the target but never click
    pub preview_only: bool,
    /// Put the pointer back where it was after clicking
    pub restore_mouse: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: None,
            confidence: DEFAULT_CONFIDENCE,
            poll_delay: DEFAULT_POLL_DELAY_SECS,
            pre_click_delay: 0.0,
            post_find_delay: 0.0,
            preview_only: false,
            restore_mouse: false,
        }
    }
}

impl Settings {
    pub fn validate_confidence(confidence: f32) -> ClickerResult<f32> {
        if confidence > 0.0 && confidence <= 1.0 {
            Ok(confidence)
        } else {
            Err(ClickerError::invalid(format!(
                "confidence {confidence} must be in (0.0, 1.0]"
            )))
        }
    }

    /// Check everything a run needs and freeze it together with the template list
    pub fn snapshot(&self, templates: Vec<Arc<Template>>) -> ClickerResult<RunSnapshot> {
        let region = self
            .region
            .ok_or_else(|| ClickerError::invalid("no search area selected"))?;
        if templates.is_empty() {
            return Err(ClickerError::invalid("no target images configured"));
        }
        let confidence = Self::validate_confidence(self.confidence)?;
        let poll_delay = Duration::try_from_secs_f64(self.poll_delay).map_err(|_| {
            ClickerError::invalid(format!(
                "poll delay {} must be a non-negative number of seconds",
                self.poll_delay
            ))
        })?;

        Ok(RunSnapshot {
            region,
            templates,
            confidence,
            poll_delay,
            pre_click_delay: non_negative("pre-click delay", self.pre_click_delay),
            post_find_delay: non_negative("post-find delay", self.post_find_delay),
            preview_only: self.preview_only,
            restore_mouse: self.restore_mouse,
        })
    }
}

/// Action delays below zero (or garbage) mean "no delay"; absurdly large
/// ones saturate
fn non_negative(label: &str, seconds: f64) -> Duration {
    if seconds.is_nan() || seconds < 0.0 {
        log::warn!("⚠️ Ignoring invalid {label} of {seconds}s");
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or_else(|_| {
        log::warn!("⚠️ Clamping {label} of {seconds}s");
        Duration::MAX
    })
}

/// Validated, immutable configuration of one run
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub region: Region,
    pub templates: Vec<Arc<Template>>,
    /// Starting threshold; the live value may change during the run
    pub confidence: f32,
    pub poll_delay: Duration,
    pub pre_click_delay: Duration,
    pub post_find_delay: Duration,
    pub preview_only: bool,
    pub restore_mouse: bool,
}

/// `search_area` entry of the settings file; coordinates are null until selected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchAreaRecord {
    pub x1: Option<i32>,
    pub y1: Option<i32>,
    pub x2: Option<i32>,
    pub y2: Option<i32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl SearchAreaRecord {
    pub fn region(&self) -> ClickerResult<Option<Region>> {
        match (self.x1, self.y1, self.x2, self.y2) {
            (Some(x1), Some(y1), Some(x2), Some(y2)) => Region::new(x1, y1, x2, y2).map(Some),
            _ => Ok(None),
        }
    }
}

impl From<Option<Region>> for SearchAreaRecord {
    fn from(region: Option<Region>) -> Self {
        match region {
            Some(r) => Self {
                x1: Some(r.x1()),
                y1: Some(r.y1()),
                x2: Some(r.x2()),
                y2: Some(r.y2()),
                width: Some(r.width()),
                height: Some(r.height()),
            },
            None => Self::default(),
        }
    }
}

/// Persisted settings file (`snips/settings.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    #[serde(default)]
    pub search_area: SearchAreaRecord,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default = "default_poll_delay", deserialize_with = "seconds")]
    pub delay_time: f64,
    #[serde(default, deserialize_with = "seconds")]
    pub click_delay_time: f64,
    #[serde(default, deserialize_with = "seconds")]
    pub move_delay_time: f64,
    #[serde(default)]
    pub return_mouse: bool,
    #[serde(default)]
    pub target_images: Vec<PathBuf>,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

fn default_poll_delay() -> f64 {
    DEFAULT_POLL_DELAY_SECS
}

/// Delays were historically written as strings ("0.5"); accept both forms.
/// Unparseable text becomes NaN so that `start()` rejects it.
fn seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
    })
}

impl SettingsRecord {
    pub fn from_json(json: &str) -> ClickerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> ClickerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Split into run settings; template paths stay in `target_images`.
    ///
    /// The file has no preview flag, so `preview_only` is always false.
    pub fn to_settings(&self) -> ClickerResult<Settings> {
        Ok(Settings {
            region: self.search_area.region()?,
            confidence: self.confidence,
            poll_delay: self.delay_time,
            pre_click_delay: self.click_delay_time.max(0.0),
            post_find_delay: self.move_delay_time.max(0.0),
            preview_only: false,
            restore_mouse: self.return_mouse,
        })
    }

    pub fn from_settings(settings: &Settings, target_images: Vec<PathBuf>) -> Self {
        Self {
            search_area: settings.region.into(),
            confidence: settings.confidence,
            delay_time: settings.poll_delay,
            click_delay_time: settings.pre_click_delay,
            move_delay_time: settings.post_find_delay,
            return_mouse: settings.restore_mouse,
            target_images,
        }
    }
}

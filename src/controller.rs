// Controller: the one object a front end talks to.
// Owns settings, the template list and the engine; relays status events out.

use crate::automation::{
    EventReceiver, RunState, SearchEngine, Settings, SettingsRecord, StatusEvent, TemplateStore,
    create_event_channel,
};
use crate::error::{ClickerError, ClickerResult};
use crate::platform::{ActionExecutor, FrameSource};
use crate::template_matching::{Matcher, Template, TemplateId};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct Controller {
    engine: SearchEngine,
    store: TemplateStore,
    settings: Settings,
    events: Option<EventReceiver>,
}

impl Controller {
    pub fn new(
        runtime: Handle,
        frames: Arc<dyn FrameSource>,
        input: Arc<dyn ActionExecutor>,
        matcher: Matcher,
    ) -> Self {
        let (tx, rx) = create_event_channel();
        log::debug!("🎮 Controller using {:?} matcher", matcher.backend());
        Self {
            engine: SearchEngine::new(runtime, frames, input, matcher, tx),
            store: TemplateStore::new(),
            settings: Settings::default(),
            events: Some(rx),
        }
    }

    /// Replace the settings.
    ///
    /// Confidence is validated here and reaches a running loop on its next
    /// iteration; everything else applies from the next `start()`.
    pub fn configure(&mut self, settings: Settings) -> ClickerResult<()> {
        Settings::validate_confidence(settings.confidence)?;
        self.engine.set_confidence(settings.confidence);
        self.settings = settings;
        Ok(())
    }

    pub fn set_confidence(&mut self, confidence: f32) -> ClickerResult<()> {
        self.settings.confidence = Settings::validate_confidence(confidence)?;
        self.engine.set_confidence(confidence);
        log::info!("🎚️ Confidence set to {:.2}", confidence);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn add_template(&mut self, template: Template) -> ClickerResult<TemplateId> {
        self.store.add(template)
    }

    pub fn load_template(&mut self, path: impl AsRef<Path>) -> ClickerResult<TemplateId> {
        self.store.add_path(path)
    }

    pub fn remove_template(&mut self, id: TemplateId) -> ClickerResult<()> {
        self.store.remove(id).map(|_| ())
    }

    /// Templates in scan order
    pub fn templates(&self) -> &[Arc<Template>] {
        self.store.list()
    }

    /// Snapshot settings and templates, then launch the loop.
    /// Template edits made after this only affect the next run.
    pub async fn start(&mut self) -> ClickerResult<()> {
        let snapshot = self.settings.snapshot(self.store.snapshot())?;
        self.engine.start(snapshot).await
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Wait until the active loop (if any) has finished
    pub async fn wait(&mut self) {
        self.engine.join().await;
    }

    pub fn state(&self) -> RunState {
        self.engine.state()
    }

    /// The status event stream. There is a single subscriber, so this
    /// returns `None` after the first call.
    pub fn subscribe(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    /// Load a persisted settings file into this controller.
    ///
    /// Replaces settings and the template list. Images that fail to load
    /// are skipped and returned.
    pub fn apply_record(&mut self, record: &SettingsRecord) -> ClickerResult<Vec<ClickerError>> {
        self.configure(record.to_settings()?)?;
        self.store.clear();
        let failures = self.store.load_all(&record.target_images);
        for failure in &failures {
            log::warn!("⚠️ Skipping target image: {}", failure);
        }
        log::info!(
            "📋 Restored {} target image(s), search area {}",
            self.store.len(),
            self.settings
                .region
                .map_or_else(|| "not selected".to_string(), |r| r.to_string())
        );
        Ok(failures)
    }

    pub fn to_record(&self) -> SettingsRecord {
        SettingsRecord::from_settings(&self.settings, self.store.sources())
    }
}

/// Coloured dot next to the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Idle,
    Running,
    Found,
    Stopped,
}

const HISTORY_LIMIT: usize = 50;

/// Status line state a front end folds events into on its own thread
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub text: String,
    pub indicator: Indicator,
    /// Recent messages, oldest first; the flag marks found/clicked results
    pub history: Vec<(String, bool)>,
}

impl Default for StatusView {
    fn default() -> Self {
        Self {
            text: "Ready".to_string(),
            indicator: Indicator::Idle,
            history: Vec::new(),
        }
    }
}

impl StatusView {
    pub fn apply(&mut self, event: &StatusEvent) {
        let is_result = matches!(
            event,
            StatusEvent::FoundAt { .. } | StatusEvent::Clicked(_) | StatusEvent::Moved(_)
        );
        self.indicator = match event {
            StatusEvent::Started | StatusEvent::NotFound => Indicator::Running,
            StatusEvent::FoundAt { .. }
            | StatusEvent::Waiting { .. }
            | StatusEvent::Moved(_)
            | StatusEvent::Clicked(_) => Indicator::Found,
            StatusEvent::Stopped => Indicator::Stopped,
            StatusEvent::Error(_) => self.indicator,
        };
        self.text = event.to_string();

        self.history.push((self.text.clone(), is_result));
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

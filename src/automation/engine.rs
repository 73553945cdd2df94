// Search-and-click engine: run state machine and the background poll loop
use super::channels::EventSender;
use super::region::Point;
use super::settings::RunSnapshot;
use super::types::{LiveConfidence, RunState, SharedRunState, StatusEvent, WaitPhase};
use crate::error::{ClickerError, ClickerResult};
use crate::platform::{ActionExecutor, FrameSource};
use crate::template_matching::Matcher;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};

/// Granularity of every interruptible sleep; bounds how long `stop()` takes
pub const STOP_SLICE: Duration = Duration::from_millis(100);

/// Owns the run state and at most one poll loop
pub struct SearchEngine {
    runtime: Handle,
    frames: Arc<dyn FrameSource>,
    input: Arc<dyn ActionExecutor>,
    matcher: Arc<Matcher>,
    events: EventSender,
    state: Arc<SharedRunState>,
    confidence: Arc<LiveConfidence>,
    worker: Option<JoinHandle<()>>,
}

impl SearchEngine {
    pub fn new(
        runtime: Handle,
        frames: Arc<dyn FrameSource>,
        input: Arc<dyn ActionExecutor>,
        matcher: Matcher,
        events: EventSender,
    ) -> Self {
        Self {
            runtime,
            frames,
            input,
            matcher: Arc::new(matcher),
            events,
            state: Arc::new(SharedRunState::new(RunState::Idle)),
            confidence: Arc::new(LiveConfidence::new(super::settings::DEFAULT_CONFIDENCE)),
            worker: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Threshold the loop will use from its next iteration on
    pub fn set_confidence(&self, confidence: f32) {
        self.confidence.set(confidence);
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.get()
    }

    /// Launch the poll loop for `snapshot`.
    ///
    /// An active loop is stopped and joined first. Returns as soon as the new
    /// loop is spawned. On validation failure nothing changes.
    pub async fn start(&mut self, snapshot: RunSnapshot) -> ClickerResult<()> {
        if snapshot.templates.is_empty() {
            return Err(ClickerError::invalid("no target images configured"));
        }
        if self.state() != RunState::Idle || self.worker.is_some() {
            log::info!("🔁 Restarting: stopping the active loop first");
            self.stop();
            self.join().await;
        }

        self.confidence.set(snapshot.confidence);
        self.state.set(RunState::Running);
        log::info!(
            "🚀 Search started in {} with {} template(s), poll every {:.1}s",
            snapshot.region,
            snapshot.templates.len(),
            snapshot.poll_delay.as_secs_f64()
        );

        let worker = Worker {
            frames: Arc::clone(&self.frames),
            input: Arc::clone(&self.input),
            matcher: Arc::clone(&self.matcher),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            confidence: Arc::clone(&self.confidence),
            plan: snapshot,
        };
        self.worker = Some(self.runtime.spawn(worker.run()));
        Ok(())
    }

    /// Ask the loop to finish. It notices within one `STOP_SLICE`.
    /// No-op unless running.
    pub fn stop(&self) {
        if self.state.transition(RunState::Running, RunState::Stopping) {
            log::info!("⏹️ Stop requested");
        }
    }

    /// Wait for the current loop (if any) to finish
    pub async fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.await {
                log::error!("❌ Poll loop ended abnormally: {}", e);
                let _ = self.events.send(StatusEvent::Error(e.to_string()));
                let _ = self.events.send(StatusEvent::Stopped);
            }
        }
        self.state.set(RunState::Idle);
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the background task needs, moved into it at start
struct Worker {
    frames: Arc<dyn FrameSource>,
    input: Arc<dyn ActionExecutor>,
    matcher: Arc<Matcher>,
    events: EventSender,
    state: Arc<SharedRunState>,
    confidence: Arc<LiveConfidence>,
    plan: RunSnapshot,
}

impl Worker {
    async fn run(self) {
        log::debug!("🎮 Poll loop started");
        self.emit(StatusEvent::Started);

        while self.running() {
            if let Err(e) = self.iteration().await {
                if e.is_transient() {
                    log::warn!("⚠️ Iteration failed, retrying after the poll delay: {}", e);
                } else {
                    log::error!("❌ Iteration failed: {}", e);
                }
                self.emit(StatusEvent::Error(e.to_string()));
            }
            if !self.pause(self.plan.poll_delay).await {
                break;
            }
        }

        self.state.set(RunState::Idle);
        self.emit(StatusEvent::Stopped);
        log::info!("⏹️ Search stopped");
    }

    /// One capture / match / act pass
    async fn iteration(&self) -> ClickerResult<()> {
        let original = if self.plan.restore_mouse {
            let input = Arc::clone(&self.input);
            Some(blocking(move || input.current_position()).await?)
        } else {
            None
        };

        let region = self.plan.region;
        let frames = Arc::clone(&self.frames);
        let frame = blocking(move || frames.capture(region)).await?;
        if !self.running() {
            return Ok(());
        }

        let confidence = self.confidence.get();
        let matcher = Arc::clone(&self.matcher);
        let templates = self.plan.templates.clone();
        let state = Arc::clone(&self.state);
        let hit = tokio::task::spawn_blocking(move || {
            matcher.first_match(&frame, &templates, confidence, || state.is_running())
        })
        .await?;

        let Some((template, result)) = hit else {
            if self.running() {
                log::debug!("👀 No template matched (confidence {:.2})", confidence);
                self.emit(StatusEvent::NotFound);
            }
            return Ok(());
        };
        let Some(location) = result.location else {
            return Ok(());
        };

        let target = region.click_point(location, &template);
        log::info!("🎯 Found {} at {}", template.name(), target);
        self.emit(StatusEvent::FoundAt {
            point: target,
            template: template.id(),
            name: template.name(),
            score: result.score,
        });

        if !self.delay(WaitPhase::BeforeMove, self.plan.post_find_delay).await {
            return Ok(());
        }

        self.move_to(target).await?;
        if self.plan.preview_only {
            self.emit(StatusEvent::Moved(target));
            return Ok(());
        }

        if self.delay(WaitPhase::BeforeClick, self.plan.pre_click_delay).await {
            let input = Arc::clone(&self.input);
            blocking(move || input.click()).await?;
            log::info!("✅ Clicked at {}", target);
            self.emit(StatusEvent::Clicked(target));
        }

        if let Some(original) = original {
            self.move_to(original).await?;
        }
        Ok(())
    }

    async fn move_to(&self, point: Point) -> ClickerResult<()> {
        let input = Arc::clone(&self.input);
        blocking(move || input.move_to(point)).await
    }

    /// Announce and sit out an action delay; false if a stop arrived
    async fn delay(&self, phase: WaitPhase, duration: Duration) -> bool {
        if duration.is_zero() {
            return self.running();
        }
        self.emit(StatusEvent::Waiting {
            phase,
            seconds: duration.as_secs_f64(),
        });
        self.pause(duration).await
    }

    /// Sleep in `STOP_SLICE` steps, checking for a stop between them.
    /// Returns false if the loop should end. A duration past the end of
    /// time waits until stopped.
    async fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if !self.running() {
                return false;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    STOP_SLICE.min(deadline - now)
                }
                None => STOP_SLICE,
            };
            sleep(slice).await;
        }
    }

    fn running(&self) -> bool {
        self.state.is_running()
    }

    fn emit(&self, event: StatusEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.events.send(event);
    }
}

/// Run a blocking platform call off the async worker
async fn blocking<T, F>(f: F) -> ClickerResult<T>
where
    F: FnOnce() -> ClickerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

//! In-memory collaborators for tests

use super::{ActionExecutor, FrameSource};
use crate::automation::{Point, Region};
use crate::error::{ClickerError, ClickerResult};
use image::RgbaImage;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves a fixed frame; the first `failures` captures error out
pub struct FakeScreen {
    frame: Mutex<RgbaImage>,
    failures: AtomicUsize,
    captures: AtomicUsize,
}

impl FakeScreen {
    pub fn new(frame: RgbaImage) -> Self {
        Self {
            frame: Mutex::new(frame),
            failures: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn set_frame(&self, frame: RgbaImage) {
        *self.frame.lock().unwrap() = frame;
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl FrameSource for FakeScreen {
    fn capture(&self, _region: Region) -> ClickerResult<RgbaImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(ClickerError::capture("screen locked"));
        }
        Ok(self.frame.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerAction {
    Position,
    MoveTo(Point),
    Click,
}

/// Records every successful pointer call; the first `failures` moves or
/// clicks error out
pub struct FakePointer {
    position: Point,
    actions: Mutex<Vec<PointerAction>>,
    failures: AtomicUsize,
}

impl FakePointer {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            actions: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    fn act(&self, action: PointerAction) -> ClickerResult<()> {
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(ClickerError::input("input device unplugged"));
        }
        self.actions.lock().unwrap().push(action);
        Ok(())
    }

    pub fn actions(&self) -> Vec<PointerAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| **a == PointerAction::Click)
            .count()
    }
}

impl ActionExecutor for FakePointer {
    fn current_position(&self) -> ClickerResult<Point> {
        self.actions.lock().unwrap().push(PointerAction::Position);
        Ok(self.position)
    }

    fn move_to(&self, point: Point) -> ClickerResult<()> {
        self.act(PointerAction::MoveTo(point))
    }

    fn click(&self) -> ClickerResult<()> {
        self.act(PointerAction::Click)
    }
}

// Types and enums for the search-and-click automation
use super::region::Point;
use crate::template_matching::TemplateId;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Lifecycle of the poll loop: `Idle -> Running -> Stopping -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopping,
}

impl RunState {
    fn to_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Stopping => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => RunState::Running,
            2 => RunState::Stopping,
            _ => RunState::Idle,
        }
    }
}

/// `RunState` readable from the caller thread while the worker advances it
#[derive(Debug)]
pub struct SharedRunState(AtomicU8);

impl SharedRunState {
    pub fn new(state: RunState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: RunState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    /// Atomically move `from -> to`; false if the state was something else
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.get() == RunState::Running
    }
}

/// Match threshold that may be changed while a run is active.
///
/// Stored as raw `f32` bits so reads and writes are single atomic ops.
#[derive(Debug)]
pub struct LiveConfidence(AtomicU32);

impl LiveConfidence {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Which configured delay the worker is sitting in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// After a match, before the pointer moves
    BeforeMove,
    /// Pointer on target, before the click
    BeforeClick,
}

/// Status events emitted by the worker, in production order
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Started,
    FoundAt {
        point: Point,
        template: TemplateId,
        name: String,
        score: Option<f32>,
    },
    Waiting {
        phase: WaitPhase,
        seconds: f64,
    },
    /// Pointer moved onto the target without clicking (preview mode)
    Moved(Point),
    Clicked(Point),
    NotFound,
    Error(String),
    Stopped,
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Started => write!(f, "Started searching..."),
            StatusEvent::FoundAt { point, name, .. } => {
                write!(f, "Found image: {name} at {point}")
            }
            StatusEvent::Waiting {
                phase: WaitPhase::BeforeMove,
                seconds,
            } => write!(f, "Waiting {seconds}s before moving mouse..."),
            StatusEvent::Waiting {
                phase: WaitPhase::BeforeClick,
                seconds,
            } => write!(f, "Waiting {seconds}s before clicking..."),
            StatusEvent::Moved(point) => write!(f, "Moved to {point} (preview)"),
            StatusEvent::Clicked(point) => write!(f, "Clicked at {point}"),
            StatusEvent::NotFound => write!(f, "Image not found"),
            StatusEvent::Error(reason) => write!(f, "Error: {reason}"),
            StatusEvent::Stopped => write!(f, "Stopped"),
        }
    }
}

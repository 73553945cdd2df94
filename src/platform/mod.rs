// Platform collaborators: screen capture and pointer injection.
// The core only talks to these traits; real desktop backends live behind
// the `desktop` feature.

#[cfg(feature = "desktop")]
pub mod desktop;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "desktop")]
pub use desktop::{EnigoExecutor, XcapFrameSource};

use crate::automation::{Point, Region};
use crate::error::ClickerResult;
use image::RgbaImage;

/// Grabs a bitmap of a screen rectangle
pub trait FrameSource: Send + Sync {
    /// Snapshot of `region`, sized `region.width() x region.height()`.
    /// Fails with `ClickerError::Capture` when the region is off-screen or
    /// capture is not permitted.
    fn capture(&self, region: Region) -> ClickerResult<RgbaImage>;
}

/// Moves and clicks the system pointer.
///
/// Every method fails with `ClickerError::Input` on platform failure; none
/// may silently do nothing.
pub trait ActionExecutor: Send + Sync {
    fn current_position(&self) -> ClickerResult<Point>;
    fn move_to(&self, point: Point) -> ClickerResult<()>;
    /// Left click at the current pointer position
    fn click(&self) -> ClickerResult<()>;
}

//! Desktop backends: screenshots via xcap, pointer input via enigo

use super::{ActionExecutor, FrameSource};
use crate::automation::{Point, Region};
use crate::error::{ClickerError, ClickerResult};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings as EnigoSettings};
use image::RgbaImage;
use xcap::Monitor;

/// Captures regions of whichever monitor holds them
#[derive(Debug, Default)]
pub struct XcapFrameSource;

impl XcapFrameSource {
    pub fn new() -> Self {
        Self
    }

    fn monitor_for(region: Region) -> ClickerResult<Monitor> {
        let monitors =
            Monitor::all().map_err(|e| ClickerError::capture(format!("Failed to get monitors: {e}")))?;

        monitors
            .into_iter()
            .find(|m| {
                let (mx, my) = (m.x(), m.y());
                let (mx2, my2) = (mx + m.width() as i32, my + m.height() as i32);
                region.x1() >= mx && region.y1() >= my && region.x2() <= mx2 && region.y2() <= my2
            })
            .ok_or_else(|| ClickerError::capture(format!("Region {region} is not on a single screen")))
    }
}

impl FrameSource for XcapFrameSource {
    fn capture(&self, region: Region) -> ClickerResult<RgbaImage> {
        let monitor = Self::monitor_for(region)?;
        let screen = monitor
            .capture_image()
            .map_err(|e| ClickerError::capture(format!("Failed to capture screen: {e}")))?;

        let (x, y) = (
            (region.x1() - monitor.x()) as u32,
            (region.y1() - monitor.y()) as u32,
        );
        if x + region.width() > screen.width() || y + region.height() > screen.height() {
            // HiDPI monitors report logical bounds but capture physical pixels
            return Err(ClickerError::capture(format!(
                "Region {region} exceeds captured image {}x{}",
                screen.width(),
                screen.height()
            )));
        }

        let frame = image::imageops::crop_imm(&screen, x, y, region.width(), region.height()).to_image();
        log::debug!("📸 Captured {}x{} from monitor '{}'", frame.width(), frame.height(), monitor.name());
        Ok(frame)
    }
}

/// Pointer control through enigo.
///
/// A fresh `Enigo` connection is opened per call since the handle is not
/// `Send` on every platform.
#[derive(Debug, Default)]
pub struct EnigoExecutor;

impl EnigoExecutor {
    pub fn new() -> Self {
        Self
    }

    fn session(&self) -> ClickerResult<Enigo> {
        Enigo::new(&EnigoSettings::default())
            .map_err(|e| ClickerError::input(format!("Failed to create input controller: {e:?}")))
    }
}

impl ActionExecutor for EnigoExecutor {
    fn current_position(&self) -> ClickerResult<Point> {
        let (x, y) = self
            .session()?
            .location()
            .map_err(|e| ClickerError::input(format!("Failed to read pointer position: {e:?}")))?;
        Ok(Point::new(x, y))
    }

    fn move_to(&self, point: Point) -> ClickerResult<()> {
        self.session()?
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| ClickerError::input(format!("Failed to move mouse: {e:?}")))
    }

    fn click(&self) -> ClickerResult<()> {
        self.session()?
            .button(Button::Left, Direction::Click)
            .map_err(|e| ClickerError::input(format!("Failed to click: {e:?}")))
    }
}

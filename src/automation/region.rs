//! Screen geometry: the search region and pointer positions

use crate::error::{ClickerError, ClickerResult};
use crate::template_matching::{Location, Template};
use std::fmt;

/// Absolute screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangle of the screen that gets captured and searched.
///
/// Always satisfies `x2 > x1` and `y2 > y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl Region {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> ClickerResult<Self> {
        if x2 <= x1 || y2 <= y1 {
            return Err(ClickerError::invalid(format!(
                "region ({x1}, {y1}) to ({x2}, {y2}) has no area"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Region spanned by two drag corners given in any order
    pub fn from_corners(a: Point, b: Point) -> ClickerResult<Self> {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Check if this region contains a point (right/bottom edges exclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x < self.x2 && point.y >= self.y1 && point.y < self.y2
    }

    /// Screen point at the center of `template` matched at `location` inside this region
    pub fn click_point(&self, location: Location, template: &Template) -> Point {
        Point::new(
            self.x1 + location.x as i32 + (template.width() / 2) as i32,
            self.y1 + location.y as i32 + (template.height() / 2) as i32,
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) to ({}, {}), {}x{}",
            self.x1,
            self.y1,
            self.x2,
            self.y2,
            self.width(),
            self.height()
        )
    }
}

/// Pixel-exact subimage search, used when no correlation backend is compiled in
use super::matcher::MatchStrategy;
use super::types::{Location, MatchResult, Template};
use image::RgbaImage;

const CHANNELS: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatcher;

impl ExactMatcher {
    pub fn new() -> Self {
        Self
    }

    /// First byte-identical occurrence of `needle` in `haystack`, row-major
    pub fn locate(haystack: &RgbaImage, needle: &RgbaImage) -> Option<Location> {
        let (fw, fh) = (haystack.width() as usize, haystack.height() as usize);
        let (tw, th) = (needle.width() as usize, needle.height() as usize);
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let frame = haystack.as_raw();
        let template = needle.as_raw();
        let row_len = tw * CHANNELS;
        let row = |ty: usize| &template[ty * row_len..(ty + 1) * row_len];

        for y in 0..=(fh - th) {
            for x in 0..=(fw - tw) {
                let hit = (0..th).all(|ty| {
                    let start = ((y + ty) * fw + x) * CHANNELS;
                    &frame[start..start + row_len] == row(ty)
                });
                if hit {
                    return Some(Location {
                        x: x as u32,
                        y: y as u32,
                    });
                }
            }
        }
        None
    }
}

impl MatchStrategy for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find(&self, frame: &RgbaImage, template: &Template, _confidence: f32) -> MatchResult {
        match Self::locate(frame, template.bitmap()) {
            Some(location) => MatchResult::hit(template.id(), location, None),
            None => MatchResult::miss(None),
        }
    }
}

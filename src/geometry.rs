//! Crop rectangles and coordinate mapping.
//!
//! Regions are selected on a *displayed* (possibly scaled-down) copy of the
//! source and must be mapped to *native* pixels with [`CropRegion::to_native`]
//! before any pixel is sampled.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Displayed-to-native multiplier per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

impl Scale {
    pub fn between(native: Dimensions, displayed: Dimensions) -> Result<Self> {
        if native.is_empty() || displayed.is_empty() {
            return Err(StudioError::InvalidGeometry(format!(
                "cannot scale between {}x{} and {}x{}",
                native.width, native.height, displayed.width, displayed.height
            )));
        }

        Ok(Self {
            x: native.width as f64 / displayed.width as f64,
            y: native.height as f64 / displayed.height as f64,
        })
    }
}

/// A rectangle in displayed coordinates plus the scale that maps it to native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scale: Scale,
}

/// Integer pixel rectangle inside a native image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale: Scale::default(),
        }
    }

    pub fn full(dims: Dimensions) -> Self {
        Self::new(0.0, 0.0, dims.width as f64, dims.height as f64)
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(StudioError::InvalidGeometry(
                "Please select a region on the image to enhance.".into(),
            ));
        }
        if !(self.x.is_finite() && self.y.is_finite()) || self.x < 0.0 || self.y < 0.0 {
            return Err(StudioError::InvalidGeometry(format!(
                "crop origin ({}, {}) is outside the image",
                self.x, self.y
            )));
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// The same region expressed in native pixels, with an identity scale.
    pub fn to_native(&self) -> CropRegion {
        CropRegion::new(
            self.x * self.scale.x,
            self.y * self.scale.y,
            self.width * self.scale.x,
            self.height * self.scale.y,
        )
    }

    /// Round a native region to whole pixels, clamped inside `bounds`.
    pub fn to_pixel_rect(&self, bounds: Dimensions) -> Result<PixelRect> {
        self.validate()?;

        let left = (self.x.round() as u32).min(bounds.width);
        let top = (self.y.round() as u32).min(bounds.height);
        let right = ((self.x + self.width).round() as u32).min(bounds.width);
        let bottom = ((self.y + self.height).round() as u32).min(bounds.height);

        let width = right.saturating_sub(left);
        let height = bottom.saturating_sub(top);
        if width == 0 || height == 0 {
            return Err(StudioError::InvalidGeometry(format!(
                "crop region does not overlap the {}x{} image",
                bounds.width, bounds.height
            )));
        }

        Ok(PixelRect {
            x: left,
            y: top,
            width,
            height,
        })
    }
}

/// Region covering `coverage_percent` of each axis, centered.
pub fn center_crop_region(
    display_width: f64,
    display_height: f64,
    coverage_percent: f64,
) -> Result<CropRegion> {
    if !(display_width > 0.0 && display_height > 0.0) {
        return Err(StudioError::InvalidGeometry(format!(
            "display size {}x{} must be positive",
            display_width, display_height
        )));
    }
    if !(coverage_percent > 0.0 && coverage_percent <= 100.0) {
        return Err(StudioError::InvalidGeometry(format!(
            "coverage {}% must be within (0, 100]",
            coverage_percent
        )));
    }

    let width = display_width * coverage_percent / 100.0;
    let height = display_height * coverage_percent / 100.0;

    Ok(CropRegion::new(
        (display_width - width) / 2.0,
        (display_height - height) / 2.0,
        width,
        height,
    ))
}

/// Largest centered rectangle of `target_ratio` (width / height) inside the image.
pub fn aspect_ratio_crop(
    native_width: u32,
    native_height: u32,
    target_ratio: f64,
) -> Result<CropRegion> {
    if native_width == 0 || native_height == 0 {
        return Err(StudioError::InvalidGeometry(format!(
            "image size {}x{} has no area",
            native_width, native_height
        )));
    }
    if !(target_ratio.is_finite() && target_ratio > 0.0) {
        return Err(StudioError::InvalidGeometry(format!(
            "aspect ratio {} must be positive",
            target_ratio
        )));
    }

    let width = native_width as f64;
    let height = native_height as f64;
    let current_ratio = width / height;

    if (current_ratio - target_ratio).abs() <= f64::EPSILON * current_ratio.max(target_ratio) {
        return Ok(CropRegion::new(0.0, 0.0, width, height));
    }

    if current_ratio > target_ratio {
        let crop_width = height * target_ratio;
        Ok(CropRegion::new(
            (width - crop_width) / 2.0,
            0.0,
            crop_width,
            height,
        ))
    } else {
        let crop_height = width / target_ratio;
        Ok(CropRegion::new(
            0.0,
            (height - crop_height) / 2.0,
            width,
            crop_height,
        ))
    }
}

/// A `W:H` ratio as offered by the sketch tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio::new(1, 1);
    pub const LANDSCAPE_16_9: AspectRatio = AspectRatio::new(16, 9);
    pub const LANDSCAPE_4_3: AspectRatio = AspectRatio::new(4, 3);
    pub const PORTRAIT_3_4: AspectRatio = AspectRatio::new(3, 4);
    pub const PORTRAIT_9_16: AspectRatio = AspectRatio::new(9, 16);

    pub const PRESETS: [AspectRatio; 5] = [
        Self::SQUARE,
        Self::LANDSCAPE_16_9,
        Self::LANDSCAPE_4_3,
        Self::PORTRAIT_3_4,
        Self::PORTRAIT_9_16,
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StudioError::InvalidGeometry(format!("invalid aspect ratio '{}'", s));

        let (width, height) = s.trim().split_once(':').ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(Self { width, height })
    }
}

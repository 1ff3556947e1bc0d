//! Thresholding and cleanup of a reflectance estimate into a glint mask.
//!
//! The mask marks *clean* (non-glint) pixels with [`MASK_CLEAN`] and glint
//! with [`MASK_GLINT`], so downstream tools can use it directly as a
//! validity mask.

use image::{GrayImage, Luma};

use crate::error::{Error, Result};
use crate::morphology::{self, StructuringElement};
use crate::reflectance::ReflectanceMap;

/// Mask value for pixels at or below the reflectance threshold.
pub const MASK_CLEAN: u8 = 255;

/// Mask value for glint pixels.
pub const MASK_GLINT: u8 = 0;

/// Threshold a reflectance map and clean it with morphological opening.
///
/// Pixels with `reflectance <= mask_thresh` are clean. The binary mask is then
/// opened `opening_iterations` times with a 3x3 cross; `0` disables opening.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `mask_thresh` is not in `[0, 1]`.
pub fn build_mask(
    reflectance: &ReflectanceMap,
    mask_thresh: f32,
    opening_iterations: u32,
) -> Result<GrayImage> {
    build_mask_with(
        reflectance,
        mask_thresh,
        opening_iterations,
        StructuringElement::Cross,
    )
}

/// [`build_mask`] with an explicit structuring element.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `mask_thresh` is not in `[0, 1]`.
pub fn build_mask_with(
    reflectance: &ReflectanceMap,
    mask_thresh: f32,
    opening_iterations: u32,
    element: StructuringElement,
) -> Result<GrayImage> {
    if !(0.0..=1.0).contains(&mask_thresh) {
        return Err(Error::invalid("mask_thresh", mask_thresh, "a value in [0, 1]"));
    }

    let (width, height) = reflectance.dimensions();
    let binary: Vec<bool> = reflectance
        .values()
        .iter()
        .map(|&v| v <= mask_thresh)
        .collect();

    let opened = morphology::binary_opening(
        &binary,
        width as usize,
        height as usize,
        element,
        opening_iterations,
    );

    let pixels = opened
        .into_iter()
        .map(|clean| if clean { MASK_CLEAN } else { MASK_GLINT })
        .collect();

    // Buffer length always equals width * height.
    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::invalid("reflectance", "mismatched buffer", "width * height values"))
}

/// Number of clean pixels in a mask.
#[must_use]
pub fn clean_pixel_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|&&Luma([v])| v == MASK_CLEAN).count()
}

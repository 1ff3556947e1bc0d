//! Specular reflectance estimation from RGB channel statistics.
//!
//! Water glint is bright and close to achromatic, while diffusely reflecting
//! pixels keep a stable ratio between their brightest channel and their
//! channel spread. The estimator:
//! 1. computes `q = i_max / max(i_range, EPSILON)` per pixel,
//! 2. takes the `percent_diffuse` order statistic of `q` as the pure diffuse ratio `q_hat`,
//! 3. estimates `spec = max(0, i_max - q_hat * i_range)`,
//! 4. min-max normalizes `spec` into `[0, 1]`.
//!
//! Reference: Wang, S., Yu, C., Sun, Y. et al. *Specular reflection removal of
//! ocean surface remote sensing images from UAVs.* Multimed Tools Appl 77,
//! 11363–11379 (2018).

use image::{GrayImage, Luma, RgbImage};

use crate::error::{Error, Result};

/// Lower bound on the channel range, avoids division by zero for achromatic pixels.
pub const EPSILON: f64 = 1e-8;

/// Per-pixel intensity statistics over the RGB channels, row-major.
#[derive(Debug, Clone)]
pub struct IntensityStats {
    /// Maximum channel intensity.
    pub i_max: Vec<f64>,
    /// Minimum channel intensity.
    pub i_min: Vec<f64>,
    /// `i_max - i_min`.
    pub i_range: Vec<f64>,
    /// `i_max / max(i_range, EPSILON)`.
    pub ratio: Vec<f64>,
}

impl IntensityStats {
    /// Compute the statistics for every pixel of `image`.
    #[must_use]
    pub fn from_image(image: &RgbImage) -> Self {
        let len = image.width() as usize * image.height() as usize;
        let mut stats = Self {
            i_max: Vec::with_capacity(len),
            i_min: Vec::with_capacity(len),
            i_range: Vec::with_capacity(len),
            ratio: Vec::with_capacity(len),
        };

        for px in image.pixels() {
            let [r, g, b] = px.0.map(f64::from);
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let range = max - min;
            stats.i_max.push(max);
            stats.i_min.push(min);
            stats.i_range.push(range);
            stats.ratio.push(max / range.max(EPSILON));
        }

        stats
    }

    /// Number of pixels the statistics cover.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ratio.len()
    }

    /// Whether the statistics cover no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratio.is_empty()
    }

    /// The ratio below which `percent_diffuse` of the pixels fall.
    ///
    /// Selects the `ceil(percent_diffuse * n)`-th smallest ratio with a
    /// linear-time selection. The rank is clamped into `1..=n`, so a
    /// `percent_diffuse` of zero yields the smallest ratio. Rank 0 does not
    /// wrap around to the largest ratio as a negative index would.
    ///
    /// # Panics
    ///
    /// Panics if the statistics are empty.
    #[must_use]
    pub fn diffuse_ratio(&self, percent_diffuse: f64) -> f64 {
        let n = self.len();
        assert!(n > 0, "diffuse ratio of an empty image");

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let num_thresh = (percent_diffuse * n as f64).ceil() as usize;
        let rank = num_thresh.clamp(1, n) - 1;

        let mut scratch = self.ratio.clone();
        let (_, q_hat, _) = scratch.select_nth_unstable_by(rank, f64::total_cmp);
        *q_hat
    }
}

/// Normalized specular reflectance estimate, one value in `[0, 1]` per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectanceMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl ReflectanceMap {
    /// Wrap row-major values as a map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `values.len() != width * height`
    /// or a value is not a finite number in `[0, 1]`.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        if values.len() != width as usize * height as usize {
            return Err(Error::invalid(
                "values",
                values.len(),
                "exactly width * height values",
            ));
        }
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(Error::invalid("values", bad, "finite values in [0, 1]"));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Map width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Value at pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Row-major values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Render the estimate as an 8-bit grayscale image (0.0 → 0, 1.0 → 255).
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = (self.get(x, y) * 255.0).round().clamp(0.0, 255.0) as u8;
            Luma([v])
        })
    }
}

/// Estimate the specular reflection component of every pixel.
///
/// `percent_diffuse` is the fraction of pixels assumed to show purely diffuse
/// reflection. Low values (0.1 to 0.3) usually work well over water.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if `percent_diffuse` is not in `[0, 1]`.
/// - [`Error::EmptyImage`] if the image has no pixels.
/// - [`Error::DegenerateInput`] if the raw estimate is constant over the image,
///   e.g. for a single-color image. No NaN map is ever returned.
pub fn estimate_specular_reflection_component(
    image: &RgbImage,
    percent_diffuse: f64,
) -> Result<ReflectanceMap> {
    if !(0.0..=1.0).contains(&percent_diffuse) {
        return Err(Error::invalid(
            "percent_diffuse",
            percent_diffuse,
            "a value in [0, 1]",
        ));
    }

    let stats = IntensityStats::from_image(image);
    if stats.is_empty() {
        return Err(Error::EmptyImage);
    }

    let q_hat = stats.diffuse_ratio(percent_diffuse);

    let spec: Vec<f64> = stats
        .i_max
        .iter()
        .zip(&stats.i_range)
        .map(|(&max, &range)| (max - q_hat * range).max(0.0))
        .collect();

    let (lo, hi) = spec
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    log::debug!(
        "{}x{} image: q_hat={q_hat:.4}, specular estimate in [{lo:.3}, {hi:.3}]",
        image.width(),
        image.height()
    );

    let span = hi - lo;
    if span <= 0.0 {
        return Err(Error::DegenerateInput);
    }

    #[allow(clippy::cast_possible_truncation)]
    let values = spec.iter().map(|&v| ((v - lo) / span) as f32).collect();

    Ok(ReflectanceMap {
        width: image.width(),
        height: image.height(),
        values,
    })
}

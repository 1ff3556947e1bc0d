//! Glint masking engine: option validation and file/directory processing.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::error::{Error, Result};
use crate::mask;
use crate::reflectance;

/// Parameters of the masking pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskOptions {
    /// Fraction of pixels assumed to show purely diffuse reflection (0.0-1.0).
    pub percent_diffuse: f64,
    /// Reflectance threshold at or below which a pixel is clean (0.0-1.0).
    pub mask_thresh: f32,
    /// Rounds of morphological opening; 0 disables it.
    pub opening_iterations: u32,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            percent_diffuse: 0.2,
            mask_thresh: 0.5,
            opening_iterations: 2,
        }
    }
}

impl MaskOptions {
    /// Build validated options from raw user input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if a fraction is outside `[0, 1]` or
    /// `opening_iterations` is negative.
    pub fn new(percent_diffuse: f64, mask_thresh: f32, opening_iterations: i64) -> Result<Self> {
        let opening_iterations = u32::try_from(opening_iterations).map_err(|_| {
            Error::invalid(
                "opening_iterations",
                opening_iterations,
                "a non-negative integer",
            )
        })?;
        let opts = Self {
            percent_diffuse,
            mask_thresh,
            opening_iterations,
        };
        opts.validate()?;
        Ok(opts)
    }

    /// Check that both fractions lie in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.percent_diffuse) {
            return Err(Error::invalid(
                "percent_diffuse",
                self.percent_diffuse,
                "a value in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.mask_thresh) {
            return Err(Error::invalid(
                "mask_thresh",
                self.mask_thresh,
                "a value in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// What to do when one file of a directory batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failure and return its error.
    #[default]
    Abort,
    /// Log the failure, record it in [`BatchSummary::failed`], and continue.
    SkipFailures,
}

/// Outcome of processing a file or directory.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Mask files written, in input order.
    pub written: Vec<PathBuf>,
    /// Inputs that failed under [`BatchPolicy::SkipFailures`].
    pub failed: Vec<(PathBuf, Error)>,
}

/// The masking engine.
///
/// Create once with [`MaskEngine::new()`] and reuse for multiple images. The
/// engine holds only validated options, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct MaskEngine {
    options: MaskOptions,
}

impl MaskEngine {
    /// Create an engine after validating `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the options are out of range.
    pub fn new(options: MaskOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options this engine runs with.
    #[must_use]
    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    /// Compute the glint mask of an in-memory image.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::EmptyImage`] and [`Error::DegenerateInput`] from
    /// the reflectance estimate.
    pub fn mask(&self, image: &RgbImage) -> Result<GrayImage> {
        let percent_diffuse = self.options.percent_diffuse;
        let reflectance =
            reflectance::estimate_specular_reflection_component(image, percent_diffuse)?;
        mask::build_mask(
            &reflectance,
            self.options.mask_thresh,
            self.options.opening_iterations,
        )
    }

    /// Process a single image file: load, mask, save.
    ///
    /// Missing parent directories of `output` are created.
    ///
    /// # Errors
    ///
    /// Returns decode, masking, and encode errors. Nothing is written on failure.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<GrayImage> {
        let format = mask_format(output)?;
        let rgb_img = image::open(input)?.to_rgb8();
        let mask = self.mask(&rgb_img)?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        write_mask(&mask, output, format)?;
        log::info!(
            "{} -> {} ({} of {} pixels clean)",
            input.display(),
            output.display(),
            mask::clean_pixel_count(&mask),
            mask.as_raw().len()
        );

        Ok(mask)
    }

    /// Process all `png`, `jpg`, and `jpeg` files directly inside `input_dir`.
    ///
    /// Each mask is written to `output_dir` as `{stem}_mask{.ext}`. Other
    /// files and subdirectories are ignored. Uses parallel iteration when the
    /// `cli` feature is enabled (via rayon).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, or, under
    /// [`BatchPolicy::Abort`], a per-file error. Abort stops scheduling new
    /// files once one has failed.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        policy: BatchPolicy,
    ) -> Result<BatchSummary> {
        let mut inputs: Vec<PathBuf> = std::fs::read_dir(input_dir)?
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect();
        inputs.sort();
        log::debug!(
            "{} image(s) found in {}",
            inputs.len(),
            input_dir.display()
        );

        let process = |input: &PathBuf| {
            let output = mask_output_path(input, output_dir);
            self.process_file(input, &output).map(|_| output)
        };

        if policy == BatchPolicy::Abort {
            #[cfg(feature = "cli")]
            let written: Result<Vec<PathBuf>> = {
                use rayon::prelude::*;
                inputs.par_iter().map(process).collect()
            };

            #[cfg(not(feature = "cli"))]
            let written: Result<Vec<PathBuf>> = inputs.iter().map(process).collect();

            return Ok(BatchSummary {
                written: written?,
                failed: Vec::new(),
            });
        }

        #[cfg(feature = "cli")]
        let results: Vec<Result<PathBuf>> = {
            use rayon::prelude::*;
            inputs.par_iter().map(process).collect()
        };

        #[cfg(not(feature = "cli"))]
        let results: Vec<Result<PathBuf>> = inputs.iter().map(process).collect();

        let mut summary = BatchSummary::default();
        for (input, result) in inputs.into_iter().zip(results) {
            match result {
                Ok(output) => summary.written.push(output),
                Err(e) => {
                    log::warn!("skipping {}: {e}", input.display());
                    summary.failed.push((input, e));
                }
            }
        }

        Ok(summary)
    }

    /// Process `input` into `output`, both files or both directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathMismatch`] before any processing if exactly one of
    /// the paths is a directory (a directory input needs an existing output
    /// directory). Otherwise propagates the errors of
    /// [`process_file`](Self::process_file) or
    /// [`process_directory`](Self::process_directory).
    pub fn process_path(
        &self,
        input: &Path,
        output: &Path,
        policy: BatchPolicy,
    ) -> Result<BatchSummary> {
        if input.is_dir() != output.is_dir() {
            return Err(Error::PathMismatch {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            });
        }

        if input.is_dir() {
            self.process_directory(input, output, policy)
        } else {
            self.process_file(input, output)?;
            Ok(BatchSummary {
                written: vec![output.to_path_buf()],
                failed: Vec::new(),
            })
        }
    }
}

/// Check if a file has a supported image extension (`png`, `jpg`, `jpeg`).
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

/// Save a mask with format-specific settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_mask(mask: &GrayImage, path: &Path) -> Result<()> {
    let format = mask_format(path)?;
    write_mask(mask, path, format)
}

/// Output format for a mask path, rejecting formats masks are not written in.
fn mask_format(path: &Path) -> Result<ImageFormat> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Bmp => Ok(format),
        _ => Err(Error::UnsupportedFormat(format!("{format:?}"))),
    }
}

fn write_mask(mask: &GrayImage, path: &Path, format: ImageFormat) -> Result<()> {
    let dyn_img = DynamicImage::ImageLuma8(mask.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Output path of the mask for `input` inside `output_dir`.
///
/// Example: `"in/img_01.png"` becomes `"{output_dir}/img_01_mask.png"`.
#[must_use]
pub fn mask_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_mask.{}", ext.to_string_lossy()),
        None => format!("{stem}_mask"),
    };
    output_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_documented_values() {
        let opts = MaskOptions::default();
        assert!((opts.percent_diffuse - 0.2).abs() < f64::EPSILON);
        assert!((opts.mask_thresh - 0.5).abs() < f32::EPSILON);
        assert_eq!(opts.opening_iterations, 2);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn options_reject_invalid_values() {
        assert!(matches!(
            MaskOptions::new(0.2, 0.5, -1),
            Err(Error::InvalidParameter {
                name: "opening_iterations",
                ..
            })
        ));
        assert!(matches!(
            MaskOptions::new(1.2, 0.5, 2),
            Err(Error::InvalidParameter {
                name: "percent_diffuse",
                ..
            })
        ));
        assert!(matches!(
            MaskOptions::new(0.2, -0.5, 2),
            Err(Error::InvalidParameter {
                name: "mask_thresh",
                ..
            })
        ));
        assert_eq!(MaskOptions::new(0.0, 1.0, 0).unwrap().opening_iterations, 0);
    }

    #[test]
    fn engine_rejects_invalid_options() {
        let opts = MaskOptions {
            mask_thresh: f32::NAN,
            ..MaskOptions::default()
        };
        assert!(MaskEngine::new(opts).is_err());
    }

    #[test]
    fn unsupported_output_format_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frame.png");
        let mut img = RgbImage::from_pixel(8, 8, image::Rgb([30, 70, 110]));
        img.put_pixel(3, 3, image::Rgb([255, 255, 255]));
        img.save(&input).unwrap();

        let engine = MaskEngine::new(MaskOptions::default()).unwrap();
        let output = dir.path().join("new/dir/mask.gif");
        assert!(matches!(
            engine.process_file(&input, &output),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn mask_output_path_appends_mask_suffix() {
        let p = mask_output_path(Path::new("/data/in/img_01.png"), Path::new("/data/out"));
        assert_eq!(p, PathBuf::from("/data/out/img_01_mask.png"));

        let p = mask_output_path(Path::new("shot.JPEG"), Path::new("masks"));
        assert_eq!(p, PathBuf::from("masks/shot_mask.JPEG"));
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.tif")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }
}

//! Estimate and mask specular reflection ("glint") in RGB imagery.
//!
//! Sunlight reflected off water shows up as bright, desaturated highlights.
//! This crate estimates the specular component of each pixel from its channel
//! statistics, thresholds the estimate, and cleans the result with
//! morphological opening. The resulting mask is 255 for clean pixels and 0
//! for glint.
//!
//! # Quick Start
//!
//! ```no_run
//! use glint_mask::{MaskEngine, MaskOptions};
//!
//! let engine = MaskEngine::new(MaskOptions::default()).expect("valid options");
//! let img = image::open("frame.jpg").unwrap().to_rgb8();
//! let mask = engine.mask(&img).unwrap();
//! mask.save("frame_mask.png").unwrap();
//! ```
//!
//! # Step by step
//!
//! The two stages are exposed separately, e.g. to inspect the estimate:
//!
//! ```no_run
//! use glint_mask::{build_mask, estimate_specular_reflection_component};
//!
//! let img = image::open("frame.jpg").unwrap().to_rgb8();
//! let reflectance = estimate_specular_reflection_component(&img, 0.2).unwrap();
//! reflectance.to_gray_image().save("frame_reflectance.png").unwrap();
//! let mask = build_mask(&reflectance, 0.5, 2).unwrap();
//! ```

#![deny(missing_docs)]

mod engine;
pub mod error;
pub mod mask;
pub mod morphology;
pub mod reflectance;

pub use engine::{
    is_supported_image, mask_output_path, save_mask, BatchPolicy, BatchSummary, MaskEngine,
    MaskOptions,
};
pub use error::{Error, Result};
pub use mask::{build_mask, build_mask_with, MASK_CLEAN, MASK_GLINT};
pub use morphology::StructuringElement;
pub use reflectance::{estimate_specular_reflection_component, ReflectanceMap};

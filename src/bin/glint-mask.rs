use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::LevelFilter;

use glint_mask::{BatchPolicy, MaskEngine, MaskOptions};

#[derive(Parser)]
#[command(
    name = "glint-mask",
    about = "Generate masks for specular reflection (glint) regions in RGB images",
    version,
    after_help = "If IMG_PATH is a directory, every png/jpg/jpeg file in it is processed and \
                  MASK_OUT_PATH must be an existing directory; masks are named {stem}_mask.{ext}.\n\
                  Mask pixels are 255 where the image is clean and 0 where glint was found."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    img_path: PathBuf,

    /// Output mask file or directory
    mask_out_path: PathBuf,

    /// Estimated fraction of pixels showing purely diffuse reflection (0.0-1.0)
    #[arg(short, long, default_value = "0.2")]
    percent_diffuse: f64,

    /// Threshold on the normalized specular estimate (0.0-1.0)
    #[arg(short, long, default_value = "0.5")]
    mask_thresh: f32,

    /// Morphological opening iterations on the mask (0 disables)
    #[arg(short, long, default_value = "2", allow_negative_numbers = true)]
    opening_iterations: i64,

    /// Continue with the remaining files when one file of a directory fails
    #[arg(short, long)]
    keep_going: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let opts = match MaskOptions::new(cli.percent_diffuse, cli.mask_thresh, cli.opening_iterations)
    {
        Ok(o) => o,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };

    let engine = match MaskEngine::new(opts) {
        Ok(e) => e,
        Err(e) => {
            log::error!("failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let policy = if cli.keep_going {
        BatchPolicy::SkipFailures
    } else {
        BatchPolicy::Abort
    };

    let summary = match engine.process_path(&cli.img_path, &cli.mask_out_path, policy) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };

    if cli.img_path.is_dir() {
        log::info!(
            "[Summary] Written: {}, Failed: {}",
            summary.written.len(),
            summary.failed.len()
        );
    }

    if !summary.failed.is_empty() {
        process::exit(1);
    }
}

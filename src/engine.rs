//! File and byte level processing built on the grid mirror.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::grid::{self, GridSpec, Region};

/// Fraction of the width left of the grid on a typical pattern sheet.
const DEFAULT_LEFT: f64 = 0.025;
/// Fraction of the height above the grid.
const DEFAULT_TOP: f64 = 0.035;
/// Fraction of the width where the grid ends.
const DEFAULT_RIGHT: f64 = 0.975;
/// Fraction of the height where the grid ends; the color legend sits below.
const DEFAULT_BOTTOM: f64 = 0.83;

/// JPEG quality used when the output path asks for JPEG.
const JPEG_QUALITY: u8 = 95;

/// A complete mirror request, apart from the image itself.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Pixel region holding the cell grid. `None` uses [`default_region`].
    pub region: Option<Region>,
    /// Columns and rows of the grid.
    pub grid: GridSpec,
    /// Clean each cell of watermark overlay before moving it.
    pub remove_watermark: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            region: None,
            grid: GridSpec::default(),
            remove_watermark: true,
            verbose: false,
            quiet: false,
        }
    }
}

impl ProcessOptions {
    /// The region to use for a `width x height` image.
    #[must_use]
    pub fn region_for(&self, width: u32, height: u32) -> Region {
        self.region.unwrap_or_else(|| default_region(width, height))
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Region that was mirrored, once the image was loaded.
    pub region: Option<Region>,
    /// Grid used for mirroring.
    pub grid: GridSpec,
    /// Human-readable status message.
    pub message: String,
}

/// Estimate where the cell grid sits on a pattern sheet.
///
/// Pattern sheets put axis labels around the grid and a color legend below
/// it; this picks `(2.5%, 3.5%)-(97.5%, 83%)` of the image.
#[must_use]
pub fn default_region(width: u32, height: u32) -> Region {
    let scale = |len: u32, frac: f64| -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (f64::from(len) * frac) as u32
        }
    };
    Region::new(
        scale(width, DEFAULT_LEFT),
        scale(height, DEFAULT_TOP),
        scale(width, DEFAULT_RIGHT),
        scale(height, DEFAULT_BOTTOM),
    )
}

/// Mirror an in-memory image according to `opts`.
///
/// # Errors
///
/// Returns [`Error::InvalidRegion`] or [`Error::InvalidGrid`] for unusable
/// requests, including images too small for the default region.
pub fn mirror_image(image: &RgbImage, opts: &ProcessOptions) -> Result<RgbImage> {
    let region = opts.region_for(image.width(), image.height());
    grid::mirror_grid(image, region, opts.grid, opts.remove_watermark)
}

/// Decode an image in any supported raster format into 8-bit RGB.
///
/// # Errors
///
/// Returns [`Error::Image`] if the bytes cannot be decoded.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Encode an image as PNG.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode, mirror and re-encode an image as PNG.
///
/// # Errors
///
/// Returns an error if decoding fails, the request is invalid, or encoding
/// fails.
pub fn mirror_bytes(input: &[u8], opts: &ProcessOptions) -> Result<Vec<u8>> {
    let image = decode_image(input)?;
    let mirrored = mirror_image(&image, opts)?;
    encode_png(&mirrored)
}

/// Process a single image file: load, mirror, save.
///
/// Returns a [`ProcessResult`] describing success or failure.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let mut result = ProcessResult {
        path: input.to_path_buf(),
        success: false,
        region: None,
        grid: opts.grid,
        message: String::new(),
    };

    // Load image
    let rgb_img = match image::open(input) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            warn!(path = %input.display(), error = %e, "failed to load image");
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };

    let region = opts.region_for(rgb_img.width(), rgb_img.height());
    result.region = Some(region);
    debug!(
        path = %input.display(),
        width = rgb_img.width(),
        height = rgb_img.height(),
        %region,
        grid = %opts.grid,
        "loaded image"
    );

    let mirrored = match grid::mirror_grid(&rgb_img, region, opts.grid, opts.remove_watermark) {
        Ok(img) => img,
        Err(e) => {
            warn!(path = %input.display(), error = %e, "rejected mirror request");
            result.message = format!("Failed to mirror: {e}");
            return result;
        }
    };

    // Save output
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                result.message = format!("Failed to create output directory: {e}");
                return result;
            }
        }
    }

    match save_image(&mirrored, output) {
        Ok(()) => {
            info!(input = %input.display(), output = %output.display(), "mirrored");
            result.success = true;
            result.message = format!("Mirrored {} grid at {region}", opts.grid);
        }
        Err(e) => {
            warn!(path = %output.display(), error = %e, "failed to save image");
            result.message = format!("Failed to save: {e}");
        }
    }

    result
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
/// Every image is written to `output_dir` as `<stem>_mirrored.png`, the same
/// lossless naming [`default_output_path`] uses for single files.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let failure = |path: &Path, message: String| ProcessResult {
        path: path.to_path_buf(),
        success: false,
        region: None,
        grid: opts.grid,
        message,
    };

    let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            return vec![failure(input_dir, format!("Failed to read directory: {e}"))];
        }
    };
    inputs.sort();

    // Create output directory
    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![failure(
                output_dir,
                format!("Failed to create output directory: {e}"),
            )];
        }
    }

    let run = |input_path: &PathBuf| match mirrored_file_name(input_path) {
        Some(name) => process_file(input_path, &output_dir.join(name), opts),
        None => failure(input_path, "Path has no file name".to_string()),
    };

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        inputs.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        inputs.iter().map(run).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image, choosing the encoder from the file extension.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(file, JPEG_QUALITY);
            encoder.encode_image(img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"pattern.jpg"` becomes `"pattern_mirrored.png"`. The mirrored
/// pattern is always written losslessly.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(mirrored_file_name(input).unwrap_or_else(|| "_mirrored.png".to_string()))
}

fn mirrored_file_name(input: &Path) -> Option<String> {
    let stem = input.file_stem()?.to_string_lossy();
    Some(format!("{stem}_mirrored.png"))
}

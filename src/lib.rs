//! Mirror bead-pattern grid diagrams without mirroring the cell labels.
//!
//! A pattern sheet is a grid of colored cells, each printed with a color code.
//! Flipping the whole image would make the codes unreadable, so this crate
//! moves every cell to its horizontally mirrored position while copying the
//! cell itself as-is. Optionally, a light gray watermark stamped over the sheet
//! is removed from each cell by repainting it with the cell's background color.
//!
//! # Quick Start
//!
//! ```no_run
//! use pindou_mirror::{mirror_grid, GridSpec, Region};
//!
//! let img = image::open("pattern.png").unwrap().to_rgb8();
//! let region = Region::new(25, 35, 975, 830);
//! let mirrored = mirror_grid(&img, region, GridSpec::new(52, 47), true).unwrap();
//! mirrored.save("pattern_mirrored.png").unwrap();
//! ```
//!
//! # Files
//!
//! ```no_run
//! use std::path::Path;
//! use pindou_mirror::{process_file, ProcessOptions};
//!
//! let opts = ProcessOptions::default();
//! let result = process_file(Path::new("pattern.jpg"), Path::new("out.png"), &opts);
//! println!("{}: {}", result.path.display(), result.message);
//! ```

#![deny(missing_docs)]

mod engine;
pub mod error;
pub mod grid;
pub mod watermark;

pub use engine::{
    decode_image, default_output_path, default_region, encode_png, is_supported_image,
    mirror_bytes, mirror_image, process_directory, process_file, save_image, ProcessOptions,
    ProcessResult,
};
pub use error::{Error, Result};
pub use grid::{mirror_grid, CellBounds, GridSpec, Region};
pub use watermark::remove_watermark_from_cell;

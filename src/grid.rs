//! Cell-wise horizontal mirroring of a pattern grid.
//!
//! The region of interest is split into `cols x rows` cells of equal
//! fractional size. Each cell at `(col, row)` is copied to `(cols - 1 - col,
//! row)` without flipping its contents, so the layout mirrors while the color
//! codes printed inside each cell stay readable.
//!
//! Cell edges are the fractional boundaries truncated to whole pixels. A cell
//! takes the bounds of its destination column rather than a reflection of its
//! own, so on grids whose width is not a multiple of `cols` a cell may change
//! width by one pixel when it moves. Such cells are resampled with
//! nearest-neighbor sampling. Destination bounds come from the same partition
//! as source bounds, so writes never overlap.
//!
//! The partition does not always reach the far edge of the region: the edge
//! is computed as `x1 + col * ((x2 - x1) / cols)`, and for some widths the
//! last edge truncates to `x2 - 1`. That final pixel column (or row) is never
//! written and keeps the unmirrored source pixels.

use std::fmt;
use std::str::FromStr;

use image::{GenericImageView, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::watermark;

/// Axis-aligned pixel rectangle `[x1, x2) x [y1, y2)` holding the cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left edge.
    pub x1: u32,
    /// Top edge.
    pub y1: u32,
    /// Right edge (exclusive).
    pub x2: u32,
    /// Bottom edge (exclusive).
    pub y2: u32,
}

impl Region {
    /// Create a region from its corner coordinates.
    #[must_use]
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The region covering a whole `width x height` image.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Check that the region is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if `x1 >= x2` or `y1 >= y2`.
    pub fn validate(self) -> Result<Self> {
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(Error::InvalidRegion {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
            });
        }
        Ok(self)
    }

    /// Width in pixels, zero for inverted regions.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height in pixels, zero for inverted regions.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Whether the pixel `(x, y)` lies inside the region.
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Parse `"x1,y1,x2,y2"`. Only the syntax is checked, not the ordering.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidRegionSpec(s.to_string()))?;

        match parts.as_slice() {
            &[x1, y1, x2, y2] => Ok(Self::new(x1, y1, x2, y2)),
            _ => Err(Error::InvalidRegionSpec(s.to_string())),
        }
    }
}

/// Number of columns and rows the region is divided into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSpec {
    /// Column count.
    pub cols: u32,
    /// Row count.
    pub rows: u32,
}

impl GridSpec {
    /// Common pattern board sizes.
    pub const PRESETS: [GridSpec; 5] = [
        GridSpec::new(20, 20),
        GridSpec::new(29, 29),
        GridSpec::new(50, 50),
        GridSpec::new(52, 47),
        GridSpec::new(100, 100),
    ];

    /// Create a grid specification.
    #[must_use]
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Check that the grid has at least one column and one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if either count is zero.
    pub fn validate(self) -> Result<Self> {
        if self.cols == 0 || self.rows == 0 {
            return Err(Error::InvalidGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(self)
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(self) -> u64 {
        u64::from(self.cols) * u64::from(self.rows)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(52, 47)
    }
}

impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

impl FromStr for GridSpec {
    type Err = Error;

    /// Parse `"COLSxROWS"`; `X` and `×` are accepted as separators too.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidGridSpec(s.to_string());
        let (cols, rows) = s
            .trim()
            .split_once(['x', 'X', '×'])
            .ok_or_else(invalid)?;
        let cols = cols.trim().parse().map_err(|_| invalid())?;
        let rows = rows.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(cols, rows))
    }
}

/// Pixel bounds of one cell, `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Right edge (exclusive).
    pub right: u32,
    /// Bottom edge (exclusive).
    pub bottom: u32,
}

impl CellBounds {
    /// Width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Whether the cell covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Restrict the bounds to a `width x height` image.
    #[must_use]
    pub fn clip(self, width: u32, height: u32) -> Self {
        Self {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        }
    }
}

/// Truncate the fractional edge `origin + index * step` to a pixel.
fn edge(origin: u32, step: f64, index: u32) -> u32 {
    let pos = f64::from(origin) + f64::from(index) * step;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        pos as u32
    }
}

/// Pixel bounds of the cell at `(col, row)`.
///
/// Edges are `x1 + col * cell_w` truncated to an integer, where
/// `cell_w = (x2 - x1) / cols` is computed first in `f64`; rows work the same
/// way. Neighboring cells share edges, so they never overlap. Because of the
/// rounding in `cell_w`, the right edge of the last column can land on
/// `x2 - 1` instead of `x2`.
#[must_use]
pub fn cell_bounds(region: Region, grid: GridSpec, col: u32, row: u32) -> CellBounds {
    let cell_w = f64::from(region.width()) / f64::from(grid.cols);
    let cell_h = f64::from(region.height()) / f64::from(grid.rows);
    CellBounds {
        left: edge(region.x1, cell_w, col),
        top: edge(region.y1, cell_h, row),
        right: edge(region.x1, cell_w, col + 1),
        bottom: edge(region.y1, cell_h, row + 1),
    }
}

/// Pixel bounds the cell at `(col, row)` is written to.
///
/// The column index is reflected before the edges are computed; rows are
/// left where they are.
#[must_use]
pub fn mirrored_bounds(region: Region, grid: GridSpec, col: u32, row: u32) -> CellBounds {
    cell_bounds(region, grid, grid.cols - 1 - col, row)
}

/// Source index for destination offset `dst` when `src_len` pixels are
/// stretched over `dst_len`.
fn nearest_index(dst: u32, src_len: u32, dst_len: u32) -> u32 {
    let idx = u64::from(dst) * u64::from(src_len) / u64::from(dst_len);
    #[allow(clippy::cast_possible_truncation)]
    {
        idx as u32
    }
}

/// Write `cell` into `output`, stretched with nearest-neighbor sampling to
/// fill `dst`.
///
/// The mapping uses the full size of `dst`, but only the part of `dst` that
/// lies inside `output` is computed.
fn paste_nearest(output: &mut RgbImage, cell: &RgbImage, dst: CellBounds) {
    let (src_w, src_h) = cell.dimensions();
    let visible = dst.clip(output.width(), output.height());
    if src_w == 0 || src_h == 0 || visible.is_empty() {
        return;
    }

    for y in visible.top..visible.bottom {
        let sy = nearest_index(y - dst.top, src_h, dst.height());
        for x in visible.left..visible.right {
            let sx = nearest_index(x - dst.left, src_w, dst.width());
            output.put_pixel(x, y, *cell.get_pixel(sx, sy));
        }
    }
}

/// Resize a cell with nearest-neighbor sampling.
///
/// Destination pixel `(x, y)` takes source pixel
/// `(x * src_w / width, y * src_h / height)`, so no new colors appear and
/// hard pixel-art edges are kept. An empty source yields a black image.
#[must_use]
pub fn resize_nearest(cell: &RgbImage, width: u32, height: u32) -> RgbImage {
    let mut resized = RgbImage::new(width, height);
    paste_nearest(
        &mut resized,
        cell,
        CellBounds {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        },
    );
    resized
}

/// Mirror the cell grid inside `region` horizontally.
///
/// Returns a new image of the same size as `image`. Pixels outside the region
/// are copied through unchanged. When `remove_watermark` is set, every cell
/// is cleaned with [`watermark::erase_watermark`] before it is moved.
///
/// Cells whose bounds collapse to zero area (tiny regions with many columns)
/// are skipped. Bounds reaching past the image edge are clipped: a cell is
/// read from the visible part of its source bounds and scaled to its full
/// destination bounds, of which only the visible part is written.
///
/// # Arguments
///
/// * `image` - The source pattern, never modified.
/// * `region` - Pixel rectangle containing the cell grid.
/// * `grid` - Number of columns and rows in the region.
/// * `remove_watermark` - Clean each cell before moving it.
///
/// # Errors
///
/// Returns [`Error::InvalidRegion`] if `x1 >= x2` or `y1 >= y2`, and
/// [`Error::InvalidGrid`] if the grid has no columns or rows. No output is
/// produced in either case.
pub fn mirror_grid(
    image: &RgbImage,
    region: Region,
    grid: GridSpec,
    remove_watermark: bool,
) -> Result<RgbImage> {
    region.validate()?;
    grid.validate()?;

    let (img_w, img_h) = image.dimensions();
    let mut output = image.clone();
    let mut skipped = 0u64;

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let src = cell_bounds(region, grid, col, row).clip(img_w, img_h);
            let dst = mirrored_bounds(region, grid, col, row);
            if src.is_empty() || dst.clip(img_w, img_h).is_empty() {
                debug!(col, row, ?src, ?dst, "skipping cell with no visible area");
                skipped += 1;
                continue;
            }

            let mut cell = image
                .view(src.left, src.top, src.width(), src.height())
                .to_image();

            if remove_watermark {
                watermark::erase_watermark(&mut cell);
            }

            paste_nearest(&mut output, &cell, dst);
        }
    }

    debug!(
        %region,
        %grid,
        remove_watermark,
        cells = grid.cell_count(),
        skipped,
        "mirrored grid"
    );

    Ok(output)
}

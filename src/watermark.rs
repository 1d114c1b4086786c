//! Per-cell watermark removal by background color reconstruction.
//!
//! Pattern sites stamp a light, low-saturation gray overlay across the whole
//! diagram. Inside a single cell the overlay sits on top of one vivid
//! background color and a dark code glyph, so the cell can be cleaned by:
//!
//! 1. **Gathering** background candidates: pixels that are neither dark ink
//!    (mean brightness < 60) nor mid-brightness gray (channel spread < 15 and
//!    mean brightness in `(100, 200)`).
//! 2. **Voting**: candidates are quantized down to multiples of 8 per channel
//!    and the most frequent bucket wins. The candidate closest to that bucket
//!    (squared Euclidean distance) becomes the background color.
//! 3. **Erasing**: every pixel matching the looser gray test (channel spread
//!    < 20 and mean brightness in `(90, 210)`) is overwritten with the
//!    background color.
//!
//! Brightness bounds are compared on the integer channel sum (three times the
//! mean), which avoids floating point while keeping the same decisions.

use std::collections::HashMap;

use image::{Rgb, RgbImage};
use tracing::trace;

/// Channel sum below which a pixel is glyph ink (mean brightness < 60).
const INK_SUM_LIMIT: u32 = 180;

/// Gather pass: maximum channel spread (exclusive) of a gray pixel.
const GATHER_GRAY_SPREAD: u8 = 15;
/// Gather pass: exclusive channel-sum band of a gray pixel (mean 100..200).
const GATHER_GRAY_SUM: (u32, u32) = (300, 600);

/// Erase pass: maximum channel spread (exclusive) of a watermark pixel.
const ERASE_GRAY_SPREAD: u8 = 20;
/// Erase pass: exclusive channel-sum band of a watermark pixel (mean 90..210).
const ERASE_GRAY_SUM: (u32, u32) = (270, 630);

/// Clears the low three bits, rounding each channel down to a multiple of 8.
const QUANTIZE_MASK: u8 = !0b111;

/// Used if no candidate can be matched to the dominant bucket.
const FALLBACK_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

fn channel_sum(px: Rgb<u8>) -> u32 {
    px.0.iter().map(|&c| u32::from(c)).sum()
}

/// Largest pairwise absolute channel difference, i.e. `max - min`.
fn channel_spread(px: Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    r.max(g).max(b) - r.min(g).min(b)
}

fn quantize(px: Rgb<u8>) -> [u8; 3] {
    px.0.map(|c| c & QUANTIZE_MASK)
}

fn distance_sq(px: Rgb<u8>, bucket: [u8; 3]) -> u32 {
    px.0.iter()
        .zip(bucket)
        .map(|(&a, b)| {
            let d = i32::from(a) - i32::from(b);
            d.unsigned_abs().pow(2)
        })
        .sum()
}

/// Whether a pixel may be a sample of the cell's true background.
///
/// Rejects dark ink and the strict mid-brightness gray band.
#[must_use]
pub fn is_background_candidate(px: Rgb<u8>) -> bool {
    let sum = channel_sum(px);
    if sum < INK_SUM_LIMIT {
        return false;
    }
    let gray = channel_spread(px) < GATHER_GRAY_SPREAD
        && sum > GATHER_GRAY_SUM.0
        && sum < GATHER_GRAY_SUM.1;
    !gray
}

/// Whether a pixel belongs to the watermark overlay and should be erased.
#[must_use]
pub fn is_watermark_pixel(px: Rgb<u8>) -> bool {
    let sum = channel_sum(px);
    channel_spread(px) < ERASE_GRAY_SPREAD && sum > ERASE_GRAY_SUM.0 && sum < ERASE_GRAY_SUM.1
}

/// Estimate the background color of a cell.
///
/// Returns `None` when no pixel qualifies as a background candidate, in which
/// case the cell should be left as it is.
///
/// Ties are resolved in row-major order: the quantized bucket seen first wins
/// among equally frequent buckets, and the earliest candidate wins among
/// equally distant ones.
#[must_use]
pub fn estimate_background(cell: &RgbImage) -> Option<Rgb<u8>> {
    let candidates: Vec<Rgb<u8>> = cell
        .pixels()
        .copied()
        .filter(|&px| is_background_candidate(px))
        .collect();

    // bucket -> (count, index of first occurrence)
    let mut buckets: HashMap<[u8; 3], (usize, usize)> = HashMap::new();
    for (idx, &px) in candidates.iter().enumerate() {
        buckets.entry(quantize(px)).or_insert((0, idx)).0 += 1;
    }

    let Some(dominant) = buckets
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(bucket, _)| bucket)
    else {
        trace!(
            width = cell.width(),
            height = cell.height(),
            "no background candidates in cell"
        );
        return None;
    };

    let background = candidates
        .iter()
        .copied()
        .min_by_key(|&px| distance_sq(px, dominant))
        .unwrap_or(FALLBACK_BACKGROUND);

    Some(background)
}

/// Erase watermark pixels from a cell in place.
///
/// Returns the background color that was painted, or `None` if the cell had
/// no background evidence and was left untouched.
pub fn erase_watermark(cell: &mut RgbImage) -> Option<Rgb<u8>> {
    let background = estimate_background(cell)?;
    for px in cell.pixels_mut() {
        if is_watermark_pixel(*px) {
            *px = background;
        }
    }
    Some(background)
}

/// Return a copy of `cell` with watermark pixels replaced by the estimated
/// background color.
///
/// Never fails: a cell without background evidence comes back unchanged.
#[must_use]
pub fn remove_watermark_from_cell(cell: &RgbImage) -> RgbImage {
    let mut result = cell.clone();
    erase_watermark(&mut result);
    result
}

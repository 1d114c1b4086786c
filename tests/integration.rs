use image::{Rgb, RgbImage};
use pindou_mirror::grid::{cell_bounds, mirrored_bounds};
use pindou_mirror::{
    mirror_grid, process_directory, process_file, remove_watermark_from_cell, Error, GridSpec,
    ProcessOptions, Region,
};

/// Every pixel gets a distinct color derived from its coordinates.
#[allow(clippy::cast_possible_truncation)]
fn unique_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 256) * 16 + y / 256) as u8])
    })
}

// Helper to draw a filled rectangle on an image
fn draw_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

#[test]
fn output_keeps_input_dimensions() {
    let img = unique_image(137, 91);
    for (region, grid) in [
        (Region::new(3, 4, 130, 88), GridSpec::new(7, 5)),
        (Region::full(137, 91), GridSpec::new(52, 47)),
        (Region::new(10, 10, 20, 20), GridSpec::new(200, 200)),
    ] {
        for remove in [false, true] {
            let out = mirror_grid(&img, region, grid, remove).unwrap();
            assert_eq!(out.dimensions(), img.dimensions());
        }
    }
}

#[test]
fn mirroring_twice_restores_divisible_grid() {
    let img = unique_image(120, 60);
    let region = Region::new(10, 5, 110, 55);
    let grid = GridSpec::new(10, 5);

    let once = mirror_grid(&img, region, grid, false).unwrap();
    assert_ne!(once, img);
    let twice = mirror_grid(&once, region, grid, false).unwrap();
    assert_eq!(twice, img);
}

#[test]
fn rows_are_never_shifted() {
    let region = Region::new(7, 11, 300, 211);
    let grid = GridSpec::new(13, 9);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let src = cell_bounds(region, grid, col, row);
            let dst = mirrored_bounds(region, grid, col, row);
            assert_eq!(src.top, dst.top);
            assert_eq!(src.bottom, dst.bottom);
        }
    }
}

#[test]
fn pixels_outside_region_pass_through() {
    let img = unique_image(80, 60);
    let region = Region::new(12, 9, 67, 50);
    let out = mirror_grid(&img, region, GridSpec::new(5, 4), true).unwrap();

    for (x, y, px) in img.enumerate_pixels() {
        if !region.contains(x, y) {
            assert_eq!(out.get_pixel(x, y), px, "pixel ({x},{y}) changed");
        }
    }
}

#[test]
fn inverted_region_is_rejected() {
    let img = unique_image(100, 100);
    let result = mirror_grid(&img, Region::new(50, 10, 10, 90), GridSpec::new(5, 5), false);
    assert!(matches!(
        result,
        Err(Error::InvalidRegion {
            x1: 50,
            y1: 10,
            x2: 10,
            y2: 90
        })
    ));
}

#[test]
fn two_columns_swap_halves() {
    let x_color = Rgb([1, 2, 3]);
    let y_color = Rgb([250, 251, 252]);
    let mut img = RgbImage::from_pixel(100, 100, Rgb([90, 40, 200]));
    img.put_pixel(10, 10, x_color);
    img.put_pixel(90, 10, y_color);

    let out = mirror_grid(&img, Region::full(100, 100), GridSpec::new(2, 1), false).unwrap();

    assert_eq!(*out.get_pixel(60, 10), x_color);
    assert_eq!(*out.get_pixel(40, 10), y_color);
    for y in 0..100 {
        for x in 0..50 {
            assert_eq!(out.get_pixel(x, y), img.get_pixel(x + 50, y));
            assert_eq!(out.get_pixel(x + 50, y), img.get_pixel(x, y));
        }
    }
}

#[test]
fn unique_pixel_moves_to_mirrored_cell_position() {
    // 10 columns of 10px: cell 1 maps to cell 8 with the same offset inside
    let x_color = Rgb([1, 2, 3]);
    let y_color = Rgb([250, 251, 252]);
    let mut img = RgbImage::from_pixel(100, 100, Rgb([90, 40, 200]));
    img.put_pixel(10, 10, x_color);
    img.put_pixel(90, 10, y_color);

    let out = mirror_grid(&img, Region::full(100, 100), GridSpec::new(10, 1), false).unwrap();
    assert_eq!(*out.get_pixel(80, 10), x_color);
    assert_eq!(*out.get_pixel(0, 10), y_color);
}

#[test]
fn all_ink_cell_is_untouched() {
    let mut cell = RgbImage::from_pixel(9, 9, Rgb([10, 10, 10]));
    draw_rect(&mut cell, 2, 2, 3, 3, Rgb([40, 50, 60]));
    assert_eq!(remove_watermark_from_cell(&cell), cell);
}

#[test]
fn watermark_patch_is_fully_erased() {
    let background = Rgb([240, 120, 20]);
    let mut cell = RgbImage::from_pixel(16, 16, background);
    draw_rect(&mut cell, 4, 6, 5, 3, Rgb([150, 150, 150]));

    let cleaned = remove_watermark_from_cell(&cell);
    assert_eq!(cleaned.dimensions(), (16, 16));
    assert!(cleaned.pixels().all(|&px| px == background));
}

#[test]
fn watermark_removal_is_per_cell() {
    let left = Rgb([240, 40, 40]);
    let right = Rgb([40, 40, 240]);
    let gray = Rgb([160, 160, 160]);
    let mut img = RgbImage::new(40, 20);
    draw_rect(&mut img, 0, 0, 20, 20, left);
    draw_rect(&mut img, 20, 0, 20, 20, right);
    // a watermark stripe crossing both cells
    draw_rect(&mut img, 0, 8, 40, 4, gray);

    let out = mirror_grid(&img, Region::full(40, 20), GridSpec::new(2, 1), true).unwrap();
    for (x, _, &px) in out.enumerate_pixels() {
        if x < 20 {
            assert_eq!(px, right);
        } else {
            assert_eq!(px, left);
        }
    }
}

#[test]
fn process_file_writes_mirrored_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pattern.png");
    let output = dir.path().join("nested").join("pattern_mirrored.png");

    let mut img = RgbImage::from_pixel(20, 10, Rgb([30, 200, 90]));
    img.put_pixel(1, 1, Rgb([0, 0, 0]));
    img.save(&input).unwrap();

    let opts = ProcessOptions {
        region: Some(Region::full(20, 10)),
        grid: GridSpec::new(4, 2),
        ..ProcessOptions::default()
    };
    let result = process_file(&input, &output, &opts);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.region, Some(Region::full(20, 10)));

    let saved = image::open(&output).unwrap().to_rgb8();
    assert_eq!(*saved.get_pixel(16, 1), Rgb([0, 0, 0]));
    assert_eq!(*saved.get_pixel(1, 1), Rgb([30, 200, 90]));
}

#[test]
fn process_file_reports_invalid_region() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pattern.png");
    RgbImage::new(20, 10).save(&input).unwrap();

    let opts = ProcessOptions {
        region: Some(Region::new(15, 0, 5, 10)),
        ..ProcessOptions::default()
    };
    let output = dir.path().join("out.png");
    let result = process_file(&input, &output, &opts);
    assert!(!result.success);
    assert!(!output.exists());
}

#[test]
fn process_file_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = process_file(
        &dir.path().join("missing.png"),
        &dir.path().join("out.png"),
        &ProcessOptions::default(),
    );
    assert!(!result.success);
    assert!(result.message.starts_with("Failed to load"));
}

#[test]
fn process_directory_handles_each_supported_file() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&input_dir).unwrap();

    RgbImage::from_pixel(200, 200, Rgb([200, 30, 30]))
        .save(input_dir.join("a.png"))
        .unwrap();
    RgbImage::from_pixel(200, 200, Rgb([30, 30, 200]))
        .save(input_dir.join("b.bmp"))
        .unwrap();
    RgbImage::from_pixel(200, 200, Rgb([30, 200, 30]))
        .save(input_dir.join("c.jpg"))
        .unwrap();
    std::fs::write(input_dir.join("notes.txt"), "skip me").unwrap();

    let results = process_directory(&input_dir, &output_dir, &ProcessOptions::default());
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success));
    for name in ["a_mirrored.png", "b_mirrored.png", "c_mirrored.png"] {
        let written = output_dir.join(name);
        assert_eq!(
            image::ImageFormat::from_path(&written).unwrap(),
            image::ImageFormat::Png
        );
        assert!(image::open(&written).is_ok(), "{name} missing");
    }
    assert!(!output_dir.join("c.jpg").exists());
    assert!(!output_dir.join("notes_mirrored.png").exists());
}

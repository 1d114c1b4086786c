use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pindou_mirror::{
    default_output_path, process_directory, process_file, GridSpec, ProcessOptions,
    ProcessResult, Region,
};

/// Largest grid the tool accepts on either axis.
const MAX_GRID: u32 = 200;

#[derive(Parser)]
#[command(
    name = "pindou-mirror",
    about = "Mirror bead-pattern grids cell by cell, keeping color codes readable",
    version,
    after_help = "Simple usage: pindou-mirror <image>  (52x47 grid, estimated region)\n\n\
                  Presets: 20x20, 29x29, 50x50, 52x47, 100x100"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_mirrored.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Grid size as COLSxROWS
    #[arg(short, long, default_value = "52x47", conflicts_with_all = ["cols", "rows"])]
    grid: GridSpec,

    /// Column count (use together with --rows)
    #[arg(long, requires = "rows")]
    cols: Option<u32>,

    /// Row count (use together with --cols)
    #[arg(long, requires = "cols")]
    rows: Option<u32>,

    /// Grid region as x1,y1,x2,y2 in pixels (default: estimated from image size)
    #[arg(short, long)]
    region: Option<Region>,

    /// Keep the watermark overlay instead of removing it
    #[arg(long)]
    keep_watermark: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(opts: &ProcessOptions) {
    let level = if opts.quiet {
        Level::WARN
    } else if opts.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }
}

fn main() {
    let cli = Cli::parse();

    let grid = match (cli.cols, cli.rows) {
        (Some(cols), Some(rows)) => GridSpec::new(cols, rows),
        _ => cli.grid,
    };

    if !(1..=MAX_GRID).contains(&grid.cols) || !(1..=MAX_GRID).contains(&grid.rows) {
        eprintln!("Error: Grid must be between 1x1 and {MAX_GRID}x{MAX_GRID}, got {grid}");
        process::exit(1);
    }

    if let Some(region) = cli.region {
        if let Err(e) = region.validate() {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    let opts = ProcessOptions {
        region: cli.region,
        grid,
        remove_watermark: !cli.keep_watermark,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    init_logging(&opts);

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        let region = opts
            .region
            .map_or_else(|| "estimated".to_string(), |r| r.to_string());
        eprintln!(
            "Grid {} (region: {region}), watermark removal {}",
            opts.grid,
            if opts.remove_watermark { "on" } else { "off" }
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: pindou-mirror <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Mirrored: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match result.region {
            Some(region) => eprintln!("[OK] {filename} ({} at {region})", result.grid),
            None => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}

//! Command-line interface implementation

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::color::{parse_color, Rgb};
use crate::export::{asm, basic, c, json, EmitOptions};
use crate::input::{index_image, load_rgb};
use crate::minimizer::{minimise, SearchOptions};
use crate::models::ConvertOptions;
use crate::packer::pack_image;
use crate::palette::Palette;
use crate::validator::check_sheet;

/// Exit codes: success, validation violations found, hard failure,
/// argument misuse.
const EXIT_SUCCESS: u8 = 0;
const EXIT_VIOLATIONS: u8 = 1;
const EXIT_ERROR: u8 = 2;
const EXIT_INVALID_ARGS: u8 = 3;

/// PNG to MSX2 OR-color sprites - converter and sprite sheet checker
#[derive(Parser)]
#[command(name = "orspr")]
#[command(about = "PNG to MSX2 OR-color sprites - converter and sprite sheet checker")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output flavor for `convert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// C header (default)
    C,
    /// Assembly db tables
    Asm,
    /// Self-contained BASIC program
    Basic,
    /// JSON for machine consumers
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a PNG image to OR-color sprite data
    Convert {
        /// Image to convert
        image: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Variable name used in the generated code
        #[arg(short, long, default_value = "sprites")]
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::C)]
        format: Format,

        /// Set of colors to use from file (first entry is transparent)
        #[arg(short, long)]
        palette: Option<PathBuf>,

        /// Try to minimise the sprite planes by brute force over palette
        /// orderings (may take seconds to minutes)
        #[arg(short, long)]
        minimise: bool,

        /// Maximum sprite planes that may overlap per scanline slot
        #[arg(long, default_value = "2", value_parser = clap::value_parser!(u8).range(1..=4))]
        max_planes: u8,

        /// Sprite cell size in pixels (hardware uses 8 or 16)
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u32).range(1..=16))]
        cell_size: u32,

        /// Transparent key color in the input image
        #[arg(long, default_value = "#FF00FF")]
        transparent: String,

        /// Abandon the minimise search after this many seconds, keeping
        /// the best arrangement found so far
        #[arg(long)]
        timeout: Option<u64>,

        /// Include palette colors in C or ASM output
        #[arg(short, long)]
        colors: bool,
    },

    /// Check that a sprite sheet respects the OR-color combination rule
    Check {
        /// Image to examine
        image: PathBuf,

        /// Maximum sprites per slot
        #[arg(short = 'c', long, default_value = "2", value_parser = clap::value_parser!(u8).range(1..=4))]
        max_planes: u8,

        /// Sprite cell size in pixels (hardware uses 8 or 16)
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u32).range(1..=16))]
        cell_size: u32,

        /// Set of colors to use from file instead of deriving them from
        /// the image
        #[arg(short, long)]
        palette: Option<PathBuf>,

        /// Transparent key color in the input image
        #[arg(long, default_value = "#FF00FF")]
        transparent: String,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            image,
            output,
            id,
            format,
            palette,
            minimise,
            max_planes,
            cell_size,
            transparent,
            timeout,
            colors,
        } => run_convert(
            &image,
            output.as_deref(),
            id,
            format,
            palette.as_deref(),
            minimise,
            max_planes,
            cell_size,
            &transparent,
            timeout,
            colors,
        ),
        Commands::Check { image, max_planes, cell_size, palette, transparent } => {
            run_check(&image, max_planes, cell_size, palette.as_deref(), &transparent)
        }
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {error}");
    ExitCode::from(EXIT_ERROR)
}

/// Load the palette from a file, or derive it from the image colors.
fn resolve_palette(
    palette_file: Option<&Path>,
    image: &image::RgbImage,
    transparent: Rgb,
) -> Result<Palette, String> {
    match palette_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("cannot read palette file '{}': {e}", path.display()))?;
            Palette::from_text(&text).map_err(|e| e.to_string())
        }
        None => Palette::from_image(image, transparent).map_err(|e| e.to_string()),
    }
}

/// Execute the convert command
fn run_convert(
    image_path: &Path,
    output: Option<&Path>,
    id: String,
    format: Format,
    palette_file: Option<&Path>,
    minimise_palette: bool,
    max_planes: u8,
    cell_size: u32,
    transparent: &str,
    timeout: Option<u64>,
    colors: bool,
) -> ExitCode {
    let transparent = match parse_color(transparent) {
        Ok(color) => color,
        Err(e) => {
            eprintln!("Error: invalid transparent color: {e}");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let rgb = match load_rgb(image_path) {
        Ok(rgb) => rgb,
        Err(e) => return fail(e),
    };
    let palette = match resolve_palette(palette_file, &rgb, transparent) {
        Ok(palette) => palette,
        Err(e) => return fail(e),
    };
    let indexed = match index_image(&rgb, &palette) {
        Ok(indexed) => indexed,
        Err(e) => return fail(e),
    };

    let opts = ConvertOptions {
        cell_width: cell_size,
        cell_height: cell_size,
        max_planes,
        transparent_index: 0,
    };

    let (result, palette) = if minimise_palette {
        let search =
            SearchOptions { timeout: timeout.map(Duration::from_secs), abort: None };
        match minimise(&indexed, &palette, &opts, &search) {
            Ok(minimized) => (minimized.result, minimized.palette),
            Err(e) => return fail(e),
        }
    } else {
        match pack_image(&indexed, &palette, &opts) {
            Ok(result) => (result, palette),
            Err(e) => return fail(e),
        }
    };

    let emit_opts = EmitOptions { id, include_palette: colors };
    let text = match format {
        Format::C => c::emit(&result, &palette, &emit_opts),
        Format::Asm => asm::emit(&result, &palette, &emit_opts),
        Format::Basic => basic::emit(&result, &palette, &emit_opts),
        Format::Json => match json::emit(&result, &palette, &emit_opts) {
            Ok(text) => text,
            Err(e) => return fail(e),
        },
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, text) {
                return fail(format!("cannot write '{}': {e}", path.display()));
            }
        }
        None => print!("{text}"),
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the check command
fn run_check(
    image_path: &Path,
    max_planes: u8,
    cell_size: u32,
    palette_file: Option<&Path>,
    transparent: &str,
) -> ExitCode {
    let transparent = match parse_color(transparent) {
        Ok(color) => color,
        Err(e) => {
            eprintln!("Error: invalid transparent color: {e}");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let rgb = match load_rgb(image_path) {
        Ok(rgb) => rgb,
        Err(e) => return fail(e),
    };
    let palette = match resolve_palette(palette_file, &rgb, transparent) {
        Ok(palette) => palette,
        Err(e) => return fail(e),
    };
    let indexed = match index_image(&rgb, &palette) {
        Ok(indexed) => indexed,
        Err(e) => return fail(e),
    };

    let report = match check_sheet(&indexed, &palette, cell_size, cell_size, max_planes, 0) {
        Ok(report) => report,
        Err(e) => return fail(e),
    };

    if report.is_empty() {
        println!("no errors detected");
        return ExitCode::from(EXIT_SUCCESS);
    }
    for violation in report.iter() {
        println!("{violation}");
    }
    ExitCode::from(EXIT_VIOLATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_defaults() {
        let cli = Cli::try_parse_from(["orspr", "convert", "in.png"]).unwrap();
        match cli.command {
            Commands::Convert { format, max_planes, cell_size, id, minimise, .. } => {
                assert_eq!(format, Format::C);
                assert_eq!(max_planes, 2);
                assert_eq!(cell_size, 16);
                assert_eq!(id, "sprites");
                assert!(!minimise);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_check_count_flag() {
        let cli = Cli::try_parse_from(["orspr", "check", "-c", "3", "sheet.png"]).unwrap();
        match cli.command {
            Commands::Check { max_planes, .. } => assert_eq!(max_planes, 3),
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_max_planes_range_enforced() {
        assert!(Cli::try_parse_from(["orspr", "convert", "--max-planes", "9", "in.png"]).is_err());
        assert!(Cli::try_parse_from(["orspr", "convert", "--max-planes", "0", "in.png"]).is_err());
    }

    #[test]
    fn test_format_values() {
        for (name, format) in
            [("c", Format::C), ("asm", Format::Asm), ("basic", Format::Basic), ("json", Format::Json)]
        {
            let cli = Cli::try_parse_from(["orspr", "convert", "-f", name, "in.png"]).unwrap();
            match cli.command {
                Commands::Convert { format: parsed, .. } => assert_eq!(parsed, format),
                _ => panic!("expected convert"),
            }
        }
    }
}

//! ecgscan CLI: digitize ECG strip images from the command line.

mod overlay;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ecgscan::{
    load_image, CalibrationParams, CropRect, DecodedImage, DigitizeConfig, DigitizeReport,
    Digitizer, ExtractOptions, StaticColorOracle, TraceColorHint,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ecgscan")]
#[command(about = "Convert photographed or scanned ECG rhythm strips into calibrated waveforms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a calibrated waveform from a strip image.
    Extract(CliExtractArgs),

    /// Estimate the grid pitch only.
    Calibrate(CliCalibrateArgs),
}

#[derive(Debug, Clone, Args)]
struct InputArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Crop rectangle `x1,y1,x2,y2` applied before processing.
    #[arg(long, value_parser = parse_crop)]
    crop: Option<CropRect>,

    /// JSON file with digitizer tuning (missing fields keep defaults).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Path to write the report (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Paper speed in mm/s.
    #[arg(long, default_value = "25.0")]
    speed: f64,

    /// Gain in mm/mV.
    #[arg(long, default_value = "10.0")]
    gain: f64,

    /// Output sampling rate in Hz.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    fs: u32,

    /// Lead name used as the report key.
    #[arg(long, default_value = "II")]
    lead: String,

    /// Known trace ink colour `r,g,b` or `#rrggbb`; repeatable. Used only
    /// when the built-in rules find too little ink.
    #[arg(long = "trace-color", value_parser = parse_color)]
    trace_colors: Vec<[u8; 3]>,

    /// RGB distance tolerance for --trace-color matches.
    #[arg(long)]
    color_tolerance: Option<f32>,

    /// Write the trace mask as a PNG.
    #[arg(long)]
    mask_out: Option<PathBuf>,

    /// Write the image with the selected region and extracted path drawn on it.
    #[arg(long)]
    overlay_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliCalibrateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Path to write the estimate (JSON); printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_crop(s: &str) -> Result<CropRect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop {s:?}: {e}"))?;
    match parts[..] {
        [x1, y1, x2, y2] => Ok(CropRect { x1, y1, x2, y2 }),
        _ => Err(format!("crop needs four values x1,y1,x2,y2, got {s:?}")),
    }
}

fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("hex colour must be #rrggbb, got {s:?}"));
        }
        let mut rgb = [0u8; 3];
        for (i, c) in rgb.iter_mut().enumerate() {
            *c = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|e| format!("invalid hex colour {s:?}: {e}"))?;
        }
        return Ok(rgb);
    }
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid colour {s:?}: {e}"))?;
    match parts[..] {
        [r, g, b] => Ok([r, g, b]),
        _ => Err(format!("colour needs three values r,g,b, got {s:?}")),
    }
}

fn load_digitizer(path: Option<&PathBuf>) -> CliResult<Digitizer> {
    match path {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            Ok(Digitizer::from_config_json_file(path)?)
        }
        None => Ok(Digitizer::with_config(DigitizeConfig::default())),
    }
}

fn load_input(args: &InputArgs) -> CliResult<DecodedImage> {
    tracing::info!("Loading image: {}", args.image.display());
    let image = load_image(&args.image)?;
    let image = match &args.crop {
        Some(rect) => image.crop(rect)?,
        None => image,
    };
    let (w, h) = image.dimensions();
    tracing::info!("Image size: {}x{}", w, h);
    Ok(image)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => run_extract(&args),
        Commands::Calibrate(args) => run_calibrate(&args),
    }
}

fn run_extract(args: &CliExtractArgs) -> CliResult<()> {
    let mut digitizer = load_digitizer(args.input.config.as_ref())?;
    if let Some(tol) = args.color_tolerance {
        digitizer.config_mut().oracle.color_tolerance = tol;
    }
    let image = load_input(&args.input)?;

    let params = CalibrationParams {
        speed_mm_per_s: args.speed,
        gain_mm_per_mv: args.gain,
        target_fs: args.fs,
    };
    let (oracle, raw) = if args.trace_colors.is_empty() {
        (None, Vec::new())
    } else {
        let hint = TraceColorHint::from_colors(args.trace_colors.clone());
        (Some(StaticColorOracle::new(hint)), std::fs::read(&args.input.image)?)
    };
    let mut options = ExtractOptions::new(params);
    if let Some(oracle) = &oracle {
        options = options.with_oracle(oracle, &raw);
    }

    let result = digitizer.extract(image.as_strip(), &options)?;
    tracing::info!(
        "Extracted {} samples at {} Hz ({:.2} s), {:.2} px/mm, quality {:.2}",
        result.signal_uv.len(),
        result.fs,
        result.duration_s,
        result.grid_spacing_px,
        result.quality_score,
    );

    let report = DigitizeReport::from_result(&result, &args.lead);
    for issue in &report.quality.issues {
        tracing::warn!("{issue}");
    }
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Report written to {}", args.out.display());

    if let Some(path) = &args.mask_out {
        let (mask, _) = digitizer.trace_mask(image.as_strip(), &options);
        mask.to_gray_image().save(path)?;
        tracing::info!("Mask written to {}", path.display());
    }

    if let Some(path) = &args.overlay_out {
        overlay::render(&image.to_rgb(), &result).save(path)?;
        tracing::info!("Overlay written to {}", path.display());
    }

    Ok(())
}

fn run_calibrate(args: &CliCalibrateArgs) -> CliResult<()> {
    let digitizer = load_digitizer(args.input.config.as_ref())?;
    let image = load_input(&args.input)?;
    let estimate = digitizer.estimate_grid(image.as_strip());
    match estimate.spacing_px {
        Some(px) => tracing::info!(
            "Grid pitch {:.2} px/mm (confidence {:.2})",
            px,
            estimate.confidence
        ),
        None => tracing::warn!("No grid pitch found"),
    }

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "calibration": {
            "px_per_mm": estimate.spacing_px,
            "confidence": estimate.confidence,
            "axis": estimate.axis,
        }
    }))?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Estimate written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_parses_four_integers() {
        assert_eq!(
            parse_crop("10, -5,200,80").unwrap(),
            CropRect {
                x1: 10,
                y1: -5,
                x2: 200,
                y2: 80
            }
        );
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn colours_parse_from_triplets_and_hex() {
        assert_eq!(parse_color("0,0,255").unwrap(), [0, 0, 255]);
        assert_eq!(parse_color("#F08C1E").unwrap(), [240, 140, 30]);
        assert!(parse_color("#fff").is_err());
        assert!(parse_color("300,0,0").is_err());
        assert!(parse_color("1,2").is_err());
    }

    #[test]
    fn extract_args_collect_repeated_colours() {
        let cli = Cli::try_parse_from([
            "ecgscan",
            "extract",
            "--image",
            "strip.png",
            "--out",
            "out.json",
            "--trace-color",
            "0,0,255",
            "--trace-color",
            "#00ff00",
            "--crop",
            "0,0,100,50",
        ])
        .unwrap();
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.trace_colors, vec![[0, 0, 255], [0, 255, 0]]);
        assert_eq!(args.speed, 25.0);
        assert_eq!(args.lead, "II");
        assert!(args.input.crop.is_some());
        assert_eq!(args.fs, 500);
    }

    #[test]
    fn sampling_rate_is_a_positive_integer() {
        let base = ["ecgscan", "extract", "--image", "s.png", "--out", "o.json", "--fs"];
        let parse = |fs: &str| Cli::try_parse_from(base.iter().copied().chain([fs]));
        let Commands::Extract(args) = parse("250").unwrap().command else {
            panic!("expected extract");
        };
        assert_eq!(args.fs, 250);
        assert!(parse("499.5").is_err());
        assert!(parse("0").is_err());
    }
}

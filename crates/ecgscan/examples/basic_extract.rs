use ecgscan::{load_image, CalibrationParams, DigitizeReport, Digitizer, ExtractOptions};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <strip.png> [out.json]", args[0]);
        std::process::exit(2);
    }

    let image = load_image(Path::new(&args[1]))?;
    let digitizer = Digitizer::new();
    let options = ExtractOptions::new(CalibrationParams::default());
    let result = digitizer.extract(image.as_strip(), &options)?;

    println!(
        "{} samples at {} Hz ({:.2} s), {:.2} px/mm, quality {:.2}",
        result.signal_uv.len(),
        result.fs,
        result.duration_s,
        result.grid_spacing_px,
        result.quality_score
    );

    if let Some(out_path) = args.get(2) {
        let report = DigitizeReport::from_result(&result, "II");
        std::fs::write(out_path, serde_json::to_string_pretty(&report)?)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}

//! Segment a Page Screenshot
//!
//! Runs OCR and block detection over one image and prints the sections as
//! JSON.
//!
//! Usage:
//!   cargo run --release --bin segment_screenshot -- page.png
//!   cargo run --release --bin segment_screenshot -- page.png --strategy proximity
//!   cargo run --release --bin segment_screenshot -- page.png --config tuned.json \
//!       --include-empty --crops-dir crops/ --overlay debug.png
//!
//! Set `RUST_LOG=debug` to follow each pipeline step.

use screen_sections::blocks::ImageprocContours;
use screen_sections::crop::export_crops;
use screen_sections::ocr::TesseractCli;
use screen_sections::overlay::draw_section_overlay;
use screen_sections::{ImageFrame, SectionEngine, SegmentationConfig, StrategyType};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "usage: segment_screenshot <image> [--strategy auto|blocks|proximity] \
[--config file.json] [--include-empty] [--crops-dir DIR] [--overlay FILE]";

struct CliArgs {
    image: PathBuf,
    strategy: Option<StrategyType>,
    config: Option<PathBuf>,
    include_empty: bool,
    crops_dir: Option<PathBuf>,
    overlay: Option<PathBuf>,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut image = None;
        let mut strategy = None;
        let mut config = None;
        let mut include_empty = false;
        let mut crops_dir = None;
        let mut overlay = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--strategy" => {
                    i += 1;
                    strategy = Some(match args.get(i).map(String::as_str) {
                        Some("auto") => StrategyType::Auto,
                        Some("blocks") => StrategyType::BlockMapping,
                        Some("proximity") => StrategyType::ProximityClustering,
                        other => return Err(format!("unknown strategy {:?}", other)),
                    });
                },
                "--config" => {
                    i += 1;
                    config = Some(PathBuf::from(value(&args, i, "--config")?));
                },
                "--include-empty" => include_empty = true,
                "--crops-dir" => {
                    i += 1;
                    crops_dir = Some(PathBuf::from(value(&args, i, "--crops-dir")?));
                },
                "--overlay" => {
                    i += 1;
                    overlay = Some(PathBuf::from(value(&args, i, "--overlay")?));
                },
                "--help" | "-h" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                path => image = Some(PathBuf::from(path)),
            }
            i += 1;
        }

        Ok(Self {
            image: image.ok_or_else(|| USAGE.to_string())?,
            strategy,
            config,
            include_empty,
            crops_dir,
            overlay,
        })
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn run(args: &CliArgs) -> screen_sections::Result<()> {
    let mut config = match &args.config {
        Some(path) => SegmentationConfig::from_json_file(path)?,
        None => SegmentationConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config = config.with_strategy(strategy);
    }
    if args.include_empty {
        config = config.with_empty_regions(true);
    }

    let frame = ImageFrame::open(&args.image)?;
    let engine = SectionEngine::new(Box::new(TesseractCli::new()), Box::new(ImageprocContours), config)?;
    let outcome = engine.analyze(&frame)?;

    if outcome.ocr_unavailable() {
        eprintln!("Warning: tesseract is not installed or not on PATH, no sections produced");
    }

    if let Some(dir) = &args.crops_dir {
        let stem = args
            .image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        let written = export_crops(frame.image(), &outcome.sections, &stem, dir, engine.crop_validator())?;
        eprintln!("Wrote {} crops to {}", written.len(), dir.display());
    }

    if let Some(path) = &args.overlay {
        write_overlay(&frame, &outcome, path)?;
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn write_overlay(
    frame: &ImageFrame,
    outcome: &screen_sections::AnalysisOutcome,
    path: &Path,
) -> screen_sections::Result<()> {
    let rects: Vec<_> = outcome.sections.iter().map(|s| s.bounding_box_pixel).collect();
    draw_section_overlay(frame.image(), &rects).save(path)?;
    eprintln!("Wrote overlay to {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        },
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

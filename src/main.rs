use android_adb_match::adb::AdbBackend;
use android_adb_match::args::Args;
use android_adb_match::template_matching::{MatchCandidate, Template, load_font};
use android_adb_match::{FindOptions, Vision, VisionError};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Template missing or unreadable, or the match parameters are unusable.
const EXIT_INPUT: u8 = 1;
/// Device could not be reached or a device command failed.
const EXIT_DEVICE: u8 = 2;

#[derive(Serialize)]
struct Report<'a> {
    template: &'a Path,
    device: &'a str,
    found: bool,
    matches: &'a [MatchCandidate],
    tapped: Option<(u32, u32)>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(args: &Args) -> Result<(), u8> {
    let template = Template::load(&args.template).map_err(|e| {
        eprintln!("❌ {e}");
        EXIT_INPUT
    })?;

    let font = args.font.as_deref().and_then(|path| match load_font(path) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Debug labels disabled: {e}");
            None
        }
    });

    let backend = AdbBackend::connect(&args.device_config()).map_err(|e| {
        eprintln!("❌ {e}");
        EXIT_DEVICE
    })?;
    let (sx, sy) = backend.screen_dimensions();
    log::info!("📱 Device: {} size: {sx}x{sy} (backend={})", args.device, backend.kind().as_str());

    let mut vision = Vision::new(backend, args.match_config());
    let mut options = FindOptions::fresh();
    if args.debug {
        options = options.with_debug_output(&args.output);
    }
    if let Some(font) = &font {
        options = options.with_font(font);
    }

    let matches = if args.all {
        vision.find_all(&template, &options)
    } else {
        vision.find(&template, &options).map(|m| m.into_iter().collect())
    }
    .map_err(exit_code)?;

    let mut tapped = None;
    if args.tap
        && let Some(best) = matches.first()
    {
        vision.tap_match(best).map_err(|e| exit_code(e.into()))?;
        tapped = Some(best.center());
    }

    if args.json {
        let report = Report {
            template: &args.template,
            device: &args.device,
            found: !matches.is_empty(),
            matches: &matches,
            tapped,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize report: {e}"),
        }
    } else if matches.is_empty() {
        println!("❌ '{}' not found (threshold {})", template.name, args.threshold);
    } else {
        for (index, m) in matches.iter().enumerate() {
            println!("✅ #{} '{}' at {m}", index + 1, template.name);
        }
        if let Some((x, y)) = tapped {
            println!("👆 Tapped ({x}, {y})");
        }
    }
    Ok(())
}

fn exit_code(error: VisionError) -> u8 {
    eprintln!("❌ {error}");
    match error {
        VisionError::Device(_) => EXIT_DEVICE,
        VisionError::Match(_) => EXIT_INPUT,
    }
}

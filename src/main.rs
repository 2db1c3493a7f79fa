use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};

use lapsify::capture::Recorder;
use lapsify::config::{self, Settings, app_name, version};
use lapsify::display::DisplayManager;
use lapsify::timelapse::Decimator;
use lapsify::utils::path::timelapse_path_for;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new(app_name())
        .version(version())
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .subcommand_required(true)
        .subcommand(
            Command::new("record")
                .about("Record the screen and convert the result into a timelapse.")
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .value_name("DIR")
                        .help("Directory the recording and timelapse are written to."),
                )
                .arg(
                    Arg::new("fps")
                        .long("fps")
                        .value_name("FPS")
                        .default_value("10")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .help("Capture rate in frames per second."),
                )
                .arg(
                    Arg::new("speed")
                        .short('s')
                        .long("speed")
                        .value_name("FACTOR")
                        .default_value("10")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .help("Timelapse speed-up factor (keep one frame in FACTOR)."),
                )
                .arg(
                    Arg::new("display")
                        .short('d')
                        .long("display")
                        .value_name("ID")
                        .value_parser(clap::value_parser!(u32))
                        .help("Display id to record, as listed by `displays`."),
                )
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .help("Stop automatically after this many seconds instead of waiting for Enter."),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert an existing recording into a timelapse.")
                .arg(
                    Arg::new("input")
                        .value_name("INPUT")
                        .required(true)
                        .help("Video file to convert."),
                )
                .arg(
                    Arg::new("output")
                        .value_name("OUTPUT")
                        .help("Destination file (defaults to timelapse_<input name>)."),
                )
                .arg(
                    Arg::new("speed")
                        .short('s')
                        .long("speed")
                        .value_name("FACTOR")
                        .default_value("10")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .help("Timelapse speed-up factor (keep one frame in FACTOR)."),
                ),
        )
        .subcommand(Command::new("displays").about("List the displays available for recording."))
        .get_matches();

    match matches.subcommand() {
        Some(("record", matches)) => record(matches),
        Some(("convert", matches)) => convert(matches),
        Some(("displays", _)) => {
            displays();
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn record(matches: &ArgMatches) -> anyhow::Result<()> {
    let settings_path = config::default_location()?;
    let mut settings = Settings::load(&settings_path);

    let output_dir = match matches.get_one::<String>("output-dir") {
        Some(dir) => PathBuf::from(dir),
        None => settings.last_path.clone(),
    };
    let fps = *matches.get_one::<u32>("fps").unwrap_or(&10);
    let speed = *matches.get_one::<u32>("speed").unwrap_or(&10);

    let mut displays = DisplayManager::new();
    if let Some(id) = matches.get_one::<u32>("display") {
        displays
            .set_current_display(*id)
            .with_context(|| format!("no display with id {id}"))?;
    }
    let display = displays.current_display().clone();
    println!(
        "recording {} ({}x{}) at {fps} fps, speed factor {speed}",
        display.name, display.width, display.height
    );

    let mut recorder = Recorder::new(output_dir.clone(), fps, speed, display.geometry)?;
    recorder.start()?;

    match matches.get_one::<u64>("duration") {
        Some(seconds) => std::thread::sleep(Duration::from_secs(*seconds)),
        None => {
            println!("press Enter to stop recording");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
        }
    }

    let timelapse = recorder
        .stop()?
        .context("recording produced no output")?;
    println!("timelapse written to {}", timelapse.display());

    settings.last_path = output_dir;
    settings.last_display = Some(display.id);
    if let Err(e) = settings.save(&settings_path) {
        log::warn!("could not save settings: {e}");
    }
    Ok(())
}

fn convert(matches: &ArgMatches) -> anyhow::Result<()> {
    let input = PathBuf::from(matches.get_one::<String>("input").expect("required arg"));
    let output = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => timelapse_path_for(&input),
    };
    let speed = *matches.get_one::<u32>("speed").unwrap_or(&10);

    let written = Decimator::new(speed)?.convert(&input, &output)?;
    println!("timelapse written to {}", written.display());
    Ok(())
}

fn displays() {
    let manager = DisplayManager::new();
    let current = manager.current_display().id;
    for display in manager.available_displays() {
        let marker = if display.id == current { "*" } else { " " };
        println!(
            "{marker} {:>3}  {}  {}x{} at ({}, {}){}",
            display.id,
            display.name,
            display.width,
            display.height,
            display.x,
            display.y,
            if display.is_primary { "  primary" } else { "" }
        );
    }
}

//! Blast Grid entry point
//!
//! Headless runner: loads the levels named on the command line (or the
//! built-in arena), then plays them with the autopilot at the paint rate.
//!
//! Usage: `blast-grid [--settings <file>] [--seed <n>] [level.json ...]`

use std::path::PathBuf;
use std::process::ExitCode;

use blast_grid::autopilot::Autopilot;
use blast_grid::consts::PAINT_HZ;
use blast_grid::{Game, LoadError, MapDescription, SessionPhase, Settings};

/// Paint frames before the demo gives up
const MAX_FRAMES: u32 = PAINT_HZ * 120;

struct Args {
    settings: Option<PathBuf>,
    seed: u64,
    maps: Vec<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        settings: None,
        seed: 0,
        maps: Vec::new(),
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => args.settings = iter.next().map(PathBuf::from),
            "--seed" => match iter.next().map(|s| s.parse()) {
                Some(Ok(seed)) => args.seed = seed,
                _ => log::warn!("--seed expects a number, using {}", args.seed),
            },
            _ => args.maps.push(PathBuf::from(arg)),
        }
    }
    args
}

fn run(args: Args) -> Result<(), LoadError> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    let maps = if args.maps.is_empty() {
        log::info!("No levels given, playing the built-in arena");
        vec![MapDescription::demo()]
    } else {
        args.maps
            .iter()
            .map(|path| MapDescription::load(path))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut game = Game::new(maps, settings)?;
    let mut pilot = Autopilot::new(args.seed);
    let dt = 1.0 / PAINT_HZ as f32;

    for frame in 0..MAX_FRAMES {
        match game.phase() {
            SessionPhase::Intro { .. } | SessionPhase::Died => game.confirm()?,
            SessionPhase::Finished => game.request_exit(),
            SessionPhase::Playing => {
                for event in pilot.next_events() {
                    game.push_input(event);
                }
            }
        }

        game.update(dt)?;
        let snapshot = game.paint();
        if frame % PAINT_HZ == 0 {
            log::info!(
                "t={}s level {}/{} {:?}: {} sprites, {} bombs, {} flames",
                frame / PAINT_HZ,
                snapshot.level_index + 1,
                game.level_count(),
                snapshot.phase,
                snapshot.drawables.len(),
                game.level().bomb_count(),
                game.level().fire_count()
            );
        }

        if game.exit_requested() {
            break;
        }
    }

    log::info!(
        "Demo over on level {} ({:?})",
        game.level_index() + 1,
        game.phase()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Blast Grid (headless) starting...");

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

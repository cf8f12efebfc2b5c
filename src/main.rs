//! Headless driver for the simulation core
//!
//! Runs a seeded session with the demo autopilot at a fixed 60 Hz, standing
//! in for the real presentation layer: input is synthesized, sound cues and
//! effect requests are logged, and the run summary is folded into the save
//! file. Useful for balance runs and as a living example of the collaborator
//! interfaces.

use std::path::Path;

use star_barrage::consts::SIM_DT;
use star_barrage::highscores::{RunSummary, SaveData};
use star_barrage::sim::{self, GameEvent, GamePhase, GameState, ShipKind, TickInput};
use star_barrage::{Settings, Tuning};

const SAVE_PATH: &str = "star_barrage_save.json";
const SETTINGS_PATH: &str = "star_barrage_settings.json";

struct Args {
    seed: u64,
    max_ticks: u64,
    ship: ShipKind,
}

fn parse_args() -> Args {
    let mut args = Args { seed: 1, max_ticks: 60 * 60 * 5, ship: ShipKind::Fighter };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                if let Some(v) = iter.next().and_then(|s| s.parse().ok()) {
                    args.seed = v;
                }
            }
            "--ticks" => {
                if let Some(v) = iter.next().and_then(|s| s.parse().ok()) {
                    args.max_ticks = v;
                }
            }
            "--ship" => {
                args.ship = match iter.next().as_deref() {
                    Some("interceptor") => ShipKind::Interceptor,
                    Some("tank") => ShipKind::Tank,
                    Some("assault") => ShipKind::Assault,
                    _ => ShipKind::Fighter,
                };
            }
            other => {
                eprintln!("usage: star-barrage [--seed N] [--ticks N] [--ship fighter|interceptor|tank|assault]");
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }
    args
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let settings = Settings::load(Path::new(SETTINGS_PATH));
    let mut save = SaveData::load(Path::new(SAVE_PATH));

    log::info!(
        "starting run: seed {}, ship {:?}, best so far {}",
        args.seed,
        args.ship,
        save.highscores.top_score().unwrap_or(0)
    );

    let mut state = GameState::new(args.seed, args.ship, Tuning::default());
    let input = TickInput { auto_pilot: true, ..Default::default() };
    let mut perfect_level_cleared = false;

    while state.time_ticks < args.max_ticks {
        sim::tick(&mut state, &input, SIM_DT);

        // The audio/effect collaborators live out here; headless, they log
        for event in state.drain_events() {
            match event {
                GameEvent::Sound { cue, volume } => {
                    if settings.sfx_enabled {
                        log::debug!("sound {} at {:.1}", cue.asset_name(), volume * settings.sfx_volume);
                    }
                }
                GameEvent::ScreenShake { intensity, .. } => {
                    if settings.effective_screen_shake() {
                        log::trace!("shake {intensity}");
                    }
                }
                GameEvent::LevelCompleted { level, bonus } => {
                    log::info!("level {level} cleared, bonus {bonus}");
                }
                GameEvent::Score(_) | GameEvent::Effect(_) => {}
            }
        }

        match state.phase {
            GamePhase::LevelComplete => {
                if state.director.summary(state.elapsed_ms).perfect {
                    perfect_level_cleared = true;
                }
                sim::advance_level(&mut state);
            }
            GamePhase::GameOver => break,
            _ => {}
        }
    }

    let snapshot = sim::capture(&state);
    println!("run over: score {}, level {}, {} ticks", snapshot.score, snapshot.level, snapshot.tick);
    println!(
        "kills {}, bosses {}, accuracy {:.0}%",
        state.stats.enemies_killed,
        state.stats.bosses_defeated,
        state.stats.accuracy() * 100.0
    );

    let run = RunSummary {
        score: state.score,
        level_reached: state.director.level,
        duration_s: state.elapsed_ms / 1000.0,
        stats: state.stats,
        perfect_level_cleared,
    };
    save.stats.record_run(&run);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    if let Some(rank) = save.highscores.add_score(run.score, run.level_reached, timestamp) {
        println!("new high score, rank {rank}");
    }
    save.save(Path::new(SAVE_PATH));
}

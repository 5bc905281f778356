use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use codequest_engine::cli::CliOverrides;
use codequest_engine::config::AppConfig;
use codequest_engine::script::Script;
use codequest_engine::session::{RunOutcome, Session};
use codequest_engine::time::Time;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        tracing::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_or_default(path),
        None => AppConfig::default(),
    };
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        tracing::info!(fields = ?overrides.applied_fields(), "applying command line overrides");
        config.apply_overrides(&overrides);
    }

    let mut session = Session::from_config(&config)?;
    if let Some(id) = &cli.lesson {
        let index = session.catalog().position(id).ok_or_else(|| anyhow!("Unknown lesson '{id}'"))?;
        session.select_lesson(index);
    }
    let lesson = session.current_lesson().map(|lesson| lesson.title.clone()).unwrap_or_default();
    match &cli.script {
        Some(path) => {
            let script = Script::load(path).with_context(|| "loading script")?;
            session.replace_script(script);
        }
        None => {
            session.load_solution();
        }
    }
    tracing::info!(lesson = %lesson, blocks = session.script().len(), "running script");

    let outcome = if cli.realtime.unwrap_or(false) {
        play_realtime(&mut session, config.timing.step())
    } else {
        session.run_to_completion()
    };
    for event in session.drain_events() {
        tracing::debug!("{event}");
    }

    match outcome {
        Some(outcome) => report(&session, &outcome),
        None => println!("Nothing to run."),
    }
    Ok(())
}

fn play_realtime(session: &mut Session, frame: Duration) -> Option<RunOutcome> {
    if !session.run() {
        return None;
    }
    let mut time = Time::new();
    loop {
        time.pace(frame);
        time.tick();
        if let Some(outcome) = session.update(time.delta_seconds()) {
            return Some(outcome);
        }
        for event in session.drain_events() {
            tracing::info!("{event}");
        }
    }
}

fn report(session: &Session, outcome: &RunOutcome) {
    let sprite = &outcome.report.sprite;
    println!(
        "Sprite ended at ({:.1}, {:.1}) facing {:.1} deg wearing {}.",
        sprite.position.x, sprite.position.y, sprite.rotation, sprite.costume
    );
    if outcome.report.success {
        println!("Treasure reached! +{} stars (total {}).", outcome.stars_awarded, session.progress().stars());
        if outcome.newly_completed {
            if let Some(lesson) = session.current_lesson() {
                println!("Badge earned: {}", lesson.badge(session.is_last_lesson()).label());
            }
        }
    } else if outcome.report.target.is_some() {
        println!("Not quite there yet. Try again!");
    }
}

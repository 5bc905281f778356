//! Headless fixture runner. A fixture names a lesson and a script; the output lists every
//! stage event per tick plus the terminal sprite, so runs can be diffed against goldens.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::blocks::{BlockId, BlockKind};
use crate::engine::{EngineTiming, ExecutionEngine};
use crate::events::StageEvent;
use crate::lessons::LessonCatalog;
use crate::progress::Progress;
use crate::session::Session;
use crate::wardrobe::{CostumeId, Wardrobe};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    #[serde(default)]
    pub lesson: Option<String>,
    pub blocks: Vec<BlockKind>,
    #[serde(default = "default_settle")]
    pub settle_seconds: f32,
    #[serde(default = "default_glide")]
    pub glide_seconds: f32,
    #[serde(default = "default_step")]
    pub step: f32,
    #[serde(default)]
    pub deterministic_seed: Option<u64>,
    #[serde(default)]
    pub unlocked: Option<Vec<CostumeId>>,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: usize,
}

fn default_settle() -> f32 {
    0.4
}

fn default_glide() -> f32 {
    0.6
}

fn default_step() -> f32 {
    1.0 / 60.0
}

fn default_max_ticks() -> usize {
    100_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessOutput {
    #[serde(default)]
    pub lesson: Option<String>,
    pub blocks: Vec<String>,
    pub ticks: usize,
    pub elapsed: f32,
    pub events: Vec<EventRecord>,
    pub final_sprite: SpriteSummary,
    pub background: Option<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub tick: usize,
    pub event: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteSummary {
    pub position: [f32; 2],
    pub rotation: f32,
    pub costume: String,
}

pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    let wardrobe = Wardrobe::builtin();
    let mut progress = Progress::new(&wardrobe);
    if let Some(unlocked) = &fixture.unlocked {
        progress.set_unlocked(unlocked.iter().cloned());
    }
    let timing = EngineTiming { settle_seconds: fixture.settle_seconds, glide_seconds: fixture.glide_seconds };
    let mut engine = ExecutionEngine::new(timing);
    if let Some(seed) = fixture.deterministic_seed {
        engine.enable_deterministic_mode(seed);
    }
    let mut session = Session::new(LessonCatalog::builtin(), wardrobe, progress, engine);

    match &fixture.lesson {
        Some(id) => {
            let Some(index) = session.catalog().position(id) else {
                bail!("unknown lesson '{id}' in fixture");
            };
            session.select_lesson(index);
        }
        None => session.free_play(),
    }

    let mut indices: HashMap<BlockId, usize> = HashMap::new();
    for kind in &fixture.blocks {
        let id = session.add_block(*kind);
        indices.insert(id, indices.len());
    }
    let blocks = session.script().iter().map(|block| block.kind.to_string()).collect();
    session.drain_events();

    let mut events = Vec::new();
    let mut ticks = 0;
    let mut success = false;
    if session.run() {
        loop {
            if ticks >= fixture.max_ticks {
                bail!("fixture did not finish within {} ticks", fixture.max_ticks);
            }
            let outcome = session.update(fixture.step);
            for event in session.drain_events() {
                events.push(EventRecord { tick: ticks, event: describe(&event, &indices) });
            }
            ticks += 1;
            if let Some(outcome) = outcome {
                success = outcome.report.success;
                break;
            }
        }
    }

    let sprite = session.sprite();
    let final_sprite = SpriteSummary {
        position: [sprite.position.x, sprite.position.y],
        rotation: sprite.rotation,
        costume: sprite.costume.to_string(),
    };
    let background = session.wardrobe().background(session.background()).map(|bg| bg.name.clone());
    Ok(HarnessOutput {
        lesson: fixture.lesson.clone(),
        blocks,
        ticks,
        elapsed: ticks as f32 * fixture.step,
        events,
        final_sprite,
        background,
        success,
    })
}

pub fn load_fixture<P: AsRef<Path>>(path: P) -> Result<HarnessFixture> {
    let file = File::open(path.as_ref()).with_context(|| format!("opening fixture '{}'", path.as_ref().display()))?;
    serde_json::from_reader(file).with_context(|| "parsing fixture JSON")
}

fn describe(event: &StageEvent, indices: &HashMap<BlockId, usize>) -> String {
    match event {
        StageEvent::BlockStarted { block, kind } => match indices.get(block) {
            Some(index) => format!("BlockStarted index={index} kind={kind}"),
            None => format!("BlockStarted kind={kind}"),
        },
        other => other.to_string(),
    }
}

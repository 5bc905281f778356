//! Sequential playback of a [`Script`] against the stage sprite.
//!
//! The engine is a small state machine advanced by [`ExecutionEngine::update`]. Every
//! block is applied atomically, then a settle delay has to elapse before the next block
//! starts. `GlideTo` waits its glide delay before applying. Each `update` call applies
//! at most one block, so tick boundaries are the suspension points of a run.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::blocks::{Block, BlockId, BlockKind};
use crate::config::AppConfig;
use crate::events::{EventBus, StageEvent};
use crate::goal;
use crate::script::Script;
use crate::sprite::{SpriteState, StageBounds};
use crate::wardrobe::{CostumeId, Wardrobe};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineTiming {
    pub settle_seconds: f32,
    pub glide_seconds: f32,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self { settle_seconds: 0.4, glide_seconds: 0.6 }
    }
}

impl EngineTiming {
    /// No waiting at all: one block per update.
    pub fn instant() -> Self {
        Self { settle_seconds: 0.0, glide_seconds: 0.0 }
    }
}

/// Everything a running script may touch, borrowed for the duration of one update.
pub struct StageContext<'a> {
    pub sprite: &'a mut SpriteState,
    pub background: &'a mut usize,
    pub stage: &'a StageBounds,
    pub wardrobe: &'a Wardrobe,
    pub unlocked: &'a BTreeSet<CostumeId>,
    pub events: &'a mut EventBus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub sprite: SpriteState,
    pub target: Option<Vec2>,
    pub success: bool,
    pub blocks_run: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Pending,
    Gliding { remaining: f32 },
    Settling { remaining: f32 },
}

#[derive(Debug, Clone)]
struct ActiveRun {
    blocks: Vec<Block>,
    cursor: usize,
    phase: Phase,
    target: Option<Vec2>,
}

pub struct ExecutionEngine {
    timing: EngineTiming,
    threshold: f32,
    rng: StdRng,
    run: Option<ActiveRun>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(EngineTiming::default())
    }
}

impl ExecutionEngine {
    pub fn new(timing: EngineTiming) -> Self {
        Self { timing, threshold: goal::GOAL_THRESHOLD, rng: StdRng::from_entropy(), run: None }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let timing = EngineTiming {
            settle_seconds: config.timing.settle_seconds.max(0.0),
            glide_seconds: config.timing.glide_seconds.max(0.0),
        };
        let mut engine = Self::new(timing).with_threshold(config.goal.threshold);
        if let Some(seed) = config.deterministic_seed {
            engine.enable_deterministic_mode(seed);
        }
        engine
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn enable_deterministic_mode(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Block currently being applied, glided or settled.
    pub fn executing_block(&self) -> Option<BlockId> {
        let run = self.run.as_ref()?;
        match run.phase {
            Phase::Pending => None,
            Phase::Gliding { .. } | Phase::Settling { .. } => run.blocks.get(run.cursor).map(|block| block.id),
        }
    }

    /// `(blocks finished, total blocks)` of the run in progress.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.run.as_ref().map(|run| (run.cursor, run.blocks.len()))
    }

    /// Begins playing `script`. Silently ignored while a run is in progress or when the
    /// script is empty; returns whether a run was started.
    pub fn start(&mut self, script: &Script, target: Option<Vec2>, events: &mut EventBus) -> bool {
        if self.run.is_some() {
            tracing::debug!("run already in progress; ignoring start");
            return false;
        }
        if script.is_empty() {
            return false;
        }
        let blocks = script.blocks().to_vec();
        events.push(StageEvent::RunStarted { blocks: blocks.len() });
        tracing::debug!(blocks = blocks.len(), "script run started");
        self.run = Some(ActiveRun { blocks, cursor: 0, phase: Phase::Pending, target });
        true
    }

    /// Advances the run by `dt` seconds. Returns the report once the last block has settled.
    pub fn update(&mut self, dt: f32, ctx: &mut StageContext<'_>) -> Option<RunReport> {
        let mut budget = dt.max(0.0);
        let mut applied_this_tick = false;
        loop {
            let run = self.run.as_mut()?;
            match run.phase {
                Phase::Pending => {
                    let Some(block) = run.blocks.get(run.cursor).copied() else {
                        return self.finish(ctx);
                    };
                    if applied_this_tick {
                        return None;
                    }
                    ctx.events.push(StageEvent::BlockStarted { block: block.id, kind: block.kind.label() });
                    if matches!(block.kind, BlockKind::GlideTo { .. }) {
                        run.phase = Phase::Gliding { remaining: self.timing.glide_seconds };
                    } else {
                        apply_block(&block.kind, ctx, &mut self.rng);
                        applied_this_tick = true;
                        run.phase = Phase::Settling { remaining: self.timing.settle_seconds };
                    }
                }
                Phase::Gliding { remaining } => {
                    if budget < remaining {
                        run.phase = Phase::Gliding { remaining: remaining - budget };
                        return None;
                    }
                    budget -= remaining;
                    let kind = run.blocks[run.cursor].kind;
                    apply_block(&kind, ctx, &mut self.rng);
                    applied_this_tick = true;
                    run.phase = Phase::Settling { remaining: self.timing.settle_seconds };
                }
                Phase::Settling { remaining } => {
                    if budget < remaining {
                        run.phase = Phase::Settling { remaining: remaining - budget };
                        return None;
                    }
                    budget -= remaining;
                    run.cursor += 1;
                    run.phase = Phase::Pending;
                }
            }
        }
    }

    /// Drives the run with a fixed step until it finishes.
    pub fn run_to_completion(&mut self, step: f32, ctx: &mut StageContext<'_>) -> Option<RunReport> {
        let step = if step > 0.0 { step } else { 1.0 / 60.0 };
        while self.run.is_some() {
            if let Some(report) = self.update(step, ctx) {
                return Some(report);
            }
        }
        None
    }

    /// Returns the sprite to origin and drops any run in progress. Blocks that already
    /// ran are not undone.
    pub fn reset(&mut self, sprite: &mut SpriteState, events: &mut EventBus) {
        if self.run.take().is_some() {
            tracing::debug!("run cancelled by reset");
        }
        sprite.reset_pose();
        events.push(StageEvent::SpriteReset);
    }

    fn finish(&mut self, ctx: &mut StageContext<'_>) -> Option<RunReport> {
        let run = self.run.take()?;
        let position = ctx.sprite.position;
        let success = goal::evaluate_with_threshold(position, run.target, self.threshold);
        ctx.events.push(StageEvent::RunFinished { position, success });
        tracing::info!(x = position.x, y = position.y, success, "script run finished");
        Some(RunReport { sprite: ctx.sprite.clone(), target: run.target, success, blocks_run: run.blocks.len() })
    }
}

fn apply_block(kind: &BlockKind, ctx: &mut StageContext<'_>, rng: &mut StdRng) {
    tracing::debug!(block = %kind, "applying block");
    let before = ctx.sprite.position;
    match *kind {
        BlockKind::Move { steps } => ctx.sprite.advance(steps, ctx.stage),
        BlockKind::Turn { degrees } => {
            ctx.sprite.turn(degrees);
            ctx.events.push(StageEvent::SpriteTurned { rotation: ctx.sprite.rotation });
        }
        BlockKind::ChangeX { delta } => ctx.sprite.translate(Vec2::new(delta, 0.0), ctx.stage),
        BlockKind::ChangeY { delta } => ctx.sprite.translate(Vec2::new(0.0, delta), ctx.stage),
        BlockKind::GoTo { x, y } | BlockKind::GlideTo { x, y } => {
            ctx.sprite.set_position(Vec2::new(x, y), ctx.stage)
        }
        BlockKind::NextCostume => {
            if let Some(next) = ctx.wardrobe.next_costume(&ctx.sprite.costume, ctx.unlocked) {
                ctx.sprite.costume = next.clone();
                ctx.events.push(StageEvent::CostumeChanged { costume: next });
            }
        }
        BlockKind::RandomBackground => {
            if let Some(index) = ctx.wardrobe.pick_background(rng) {
                *ctx.background = index;
                let name = ctx.wardrobe.background(index).map(|bg| bg.name.clone()).unwrap_or_default();
                ctx.events.push(StageEvent::BackgroundChanged { index, name });
            }
        }
    }
    if let Some(moved) = StageEvent::sprite_moved(before, ctx.sprite.position) {
        ctx.events.push(moved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        sprite: SpriteState,
        background: usize,
        stage: StageBounds,
        wardrobe: Wardrobe,
        unlocked: BTreeSet<CostumeId>,
        events: EventBus,
    }

    impl Fixture {
        fn new() -> Self {
            let wardrobe = Wardrobe::builtin();
            let unlocked = wardrobe.starter_costumes();
            Self {
                sprite: SpriteState::wearing(wardrobe.default_costume()),
                background: 0,
                stage: StageBounds::default(),
                wardrobe,
                unlocked,
                events: EventBus::default(),
            }
        }

        fn ctx(&mut self) -> StageContext<'_> {
            StageContext {
                sprite: &mut self.sprite,
                background: &mut self.background,
                stage: &self.stage,
                wardrobe: &self.wardrobe,
                unlocked: &self.unlocked,
                events: &mut self.events,
            }
        }
    }

    fn run(script: &Script, target: Option<Vec2>, fixture: &mut Fixture) -> Option<RunReport> {
        let mut engine = ExecutionEngine::new(EngineTiming::default());
        engine.enable_deterministic_mode(1);
        if !engine.start(script, target, &mut fixture.events) {
            return None;
        }
        engine.run_to_completion(1.0 / 60.0, &mut fixture.ctx())
    }

    #[test]
    fn move_to_target_succeeds() {
        let mut fixture = Fixture::new();
        let script = Script::from_kinds([BlockKind::move_steps(120.0)]);
        let report = run(&script, Some(Vec2::new(120.0, 0.0)), &mut fixture).expect("report");
        assert_eq!(report.sprite.position, Vec2::new(120.0, 0.0));
        assert!(report.success);
    }

    #[test]
    fn empty_script_is_a_no_op() {
        let mut fixture = Fixture::new();
        let before = fixture.sprite.clone();
        assert!(run(&Script::new(), Some(Vec2::ZERO), &mut fixture).is_none());
        assert_eq!(fixture.sprite, before);
        assert!(fixture.events.is_empty());
    }

    #[test]
    fn second_start_while_running_is_ignored() {
        let mut fixture = Fixture::new();
        let mut engine = ExecutionEngine::default();
        let first = Script::from_kinds([BlockKind::move_steps(50.0)]);
        let second = Script::from_kinds([BlockKind::move_steps(-50.0)]);
        assert!(engine.start(&first, None, &mut fixture.events));
        assert!(!engine.start(&second, None, &mut fixture.events));
        let report = engine.run_to_completion(0.1, &mut fixture.ctx()).expect("report");
        assert_eq!(report.sprite.position, Vec2::new(50.0, 0.0));
        assert!(!report.success, "no target never succeeds");
    }

    #[test]
    fn blocks_wait_for_settle_delay() {
        let mut fixture = Fixture::new();
        let mut engine = ExecutionEngine::new(EngineTiming { settle_seconds: 0.4, glide_seconds: 0.6 });
        let script = Script::from_kinds([BlockKind::change_x(10.0), BlockKind::change_x(10.0)]);
        engine.start(&script, None, &mut fixture.events);

        assert!(engine.update(0.0, &mut fixture.ctx()).is_none());
        assert_eq!(fixture.sprite.position.x, 10.0);
        assert_eq!(engine.executing_block(), Some(script.blocks()[0].id));

        assert!(engine.update(0.3, &mut fixture.ctx()).is_none());
        assert_eq!(fixture.sprite.position.x, 10.0, "still settling");

        assert!(engine.update(0.2, &mut fixture.ctx()).is_none());
        assert_eq!(fixture.sprite.position.x, 20.0);
        assert_eq!(engine.progress(), Some((1, 2)));

        let report = engine.update(0.4, &mut fixture.ctx()).expect("finished");
        assert_eq!(report.blocks_run, 2);
        assert!(!engine.is_running());
    }

    #[test]
    fn glide_applies_after_delay_and_before_next_block() {
        let mut fixture = Fixture::new();
        let mut engine = ExecutionEngine::new(EngineTiming { settle_seconds: 0.4, glide_seconds: 0.6 });
        let script = Script::from_kinds([BlockKind::glide_to(150.0, 50.0), BlockKind::change_y(10.0)]);
        engine.start(&script, None, &mut fixture.events);

        engine.update(0.5, &mut fixture.ctx());
        assert_eq!(fixture.sprite.position, Vec2::ZERO, "glide has not landed yet");
        engine.update(0.15, &mut fixture.ctx());
        assert_eq!(fixture.sprite.position, Vec2::new(150.0, 50.0));
        engine.update(0.4, &mut fixture.ctx());
        assert_eq!(fixture.sprite.position, Vec2::new(150.0, 60.0));
    }

    #[test]
    fn instant_timing_applies_one_block_per_update() {
        let mut fixture = Fixture::new();
        let mut engine = ExecutionEngine::new(EngineTiming::instant());
        let script = Script::from_kinds([BlockKind::change_x(1.0), BlockKind::change_x(1.0), BlockKind::change_x(1.0)]);
        engine.start(&script, None, &mut fixture.events);
        engine.update(10.0, &mut fixture.ctx());
        assert_eq!(fixture.sprite.position.x, 1.0);
        engine.update(10.0, &mut fixture.ctx());
        assert_eq!(fixture.sprite.position.x, 2.0);
        let report = engine.update(10.0, &mut fixture.ctx()).expect("last block finishes the run");
        assert_eq!(report.sprite.position.x, 3.0);
    }

    #[test]
    fn turn_is_not_normalized() {
        let mut fixture = Fixture::new();
        let script = Script::from_kinds([BlockKind::turn(360.0), BlockKind::turn(360.0)]);
        let report = run(&script, None, &mut fixture).expect("report");
        assert_eq!(report.sprite.rotation, 720.0);
    }

    #[test]
    fn costume_alternates_between_two_unlocked() {
        let mut fixture = Fixture::new();
        let script = Script::from_kinds([BlockKind::NextCostume]);
        let mut worn = Vec::new();
        for _ in 0..4 {
            run(&script, None, &mut fixture).expect("report");
            worn.push(fixture.sprite.costume.as_str().to_string());
        }
        assert_eq!(worn, ["dog", "cat", "dog", "cat"]);
    }

    #[test]
    fn reset_cancels_run_without_rollback_of_costume() {
        let mut fixture = Fixture::new();
        let mut engine = ExecutionEngine::default();
        let script = Script::from_kinds([BlockKind::NextCostume, BlockKind::move_steps(100.0)]);
        engine.start(&script, None, &mut fixture.events);
        engine.update(0.0, &mut fixture.ctx());
        assert!(engine.is_running());
        engine.reset(&mut fixture.sprite, &mut fixture.events);
        assert!(!engine.is_running());
        assert_eq!(engine.executing_block(), None);
        assert_eq!(fixture.sprite.position, Vec2::ZERO);
        assert_eq!(fixture.sprite.costume.as_str(), "dog");
        assert!(engine.update(1.0, &mut fixture.ctx()).is_none());
    }

    #[test]
    fn random_background_leaves_sprite_alone() {
        let mut fixture = Fixture::new();
        let script = Script::from_kinds([BlockKind::RandomBackground]);
        let report = run(&script, None, &mut fixture).expect("report");
        assert_eq!(report.sprite.position, Vec2::ZERO);
        assert!(fixture.background < fixture.wardrobe.backgrounds().len());
        let events = fixture.events.drain();
        assert!(events.iter().any(|event| matches!(event, StageEvent::BackgroundChanged { .. })));
    }
}

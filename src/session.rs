use std::path::PathBuf;

use anyhow::Result;
use glam::Vec2;

use crate::blocks::{finite_or_zero, BlockId, BlockKind};
use crate::config::AppConfig;
use crate::engine::{ExecutionEngine, RunReport, StageContext};
use crate::events::{EventBus, StageEvent};
use crate::lessons::{Lesson, LessonCatalog};
use crate::progress::{Progress, Purchase};
use crate::script::Script;
use crate::sprite::{SpriteState, StageBounds};
use crate::wardrobe::{CostumeId, Wardrobe};

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub report: RunReport,
    pub newly_completed: bool,
    pub stars_awarded: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizFeedback {
    Correct { stars_awarded: u32 },
    Incorrect,
    NotAQuiz,
}

/// One player's game: the active lesson, their script, the stage and their progress.
pub struct Session {
    catalog: LessonCatalog,
    wardrobe: Wardrobe,
    progress: Progress,
    progress_path: Option<PathBuf>,
    lesson_index: usize,
    script: Script,
    sprite: SpriteState,
    background: usize,
    stage: StageBounds,
    engine: ExecutionEngine,
    events: EventBus,
    step_seconds: f32,
    quest_success: bool,
}

impl Session {
    pub fn new(catalog: LessonCatalog, wardrobe: Wardrobe, progress: Progress, engine: ExecutionEngine) -> Self {
        let sprite = SpriteState::wearing(wardrobe.default_costume());
        Self {
            catalog,
            wardrobe,
            progress,
            progress_path: None,
            lesson_index: 0,
            script: Script::new(),
            sprite,
            background: 0,
            stage: StageBounds::default(),
            engine,
            events: EventBus::default(),
            step_seconds: 1.0 / 60.0,
            quest_success: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = match &config.lessons_path {
            Some(path) => LessonCatalog::load(path)?,
            None => LessonCatalog::builtin(),
        };
        let wardrobe = Wardrobe::builtin();
        let progress = Progress::load_or_default(&config.progress.path, &wardrobe);
        let engine = ExecutionEngine::from_config(config);
        let mut session = Self::new(catalog, wardrobe, progress, engine);
        session.step_seconds = config.timing.step_seconds;
        if config.progress.autosave {
            session.progress_path = Some(config.progress.path.clone());
        }
        Ok(session)
    }

    pub fn catalog(&self) -> &LessonCatalog {
        &self.catalog
    }

    pub fn wardrobe(&self) -> &Wardrobe {
        &self.wardrobe
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn sprite(&self) -> &SpriteState {
        &self.sprite
    }

    pub fn background(&self) -> usize {
        self.background
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    pub fn quest_success(&self) -> bool {
        self.quest_success
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.catalog.get(self.lesson_index)
    }

    pub fn is_last_lesson(&self) -> bool {
        self.catalog.is_last(self.lesson_index)
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.events.drain()
    }

    pub fn select_lesson(&mut self, index: usize) -> bool {
        if index >= self.catalog.len() {
            return false;
        }
        self.lesson_index = index;
        self.clear_script();
        true
    }

    /// Leaves the lesson track: scripts run without a target and never complete anything.
    pub fn free_play(&mut self) {
        self.lesson_index = self.catalog.len();
        self.clear_script();
    }

    pub fn in_free_play(&self) -> bool {
        self.current_lesson().is_none()
    }

    /// Moves to the following lesson. Returns `false` on the last lesson.
    pub fn next_lesson(&mut self) -> bool {
        if self.is_last_lesson() {
            return false;
        }
        self.select_lesson(self.lesson_index + 1)
    }

    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        self.script.append(kind.clamped())
    }

    pub fn remove_block(&mut self, id: BlockId) -> bool {
        self.script.remove(id)
    }

    /// Clicking the stage drops a `GoTo` block at the clicked point unless a run is going.
    pub fn stage_click(&mut self, point: Vec2) -> Option<BlockId> {
        if self.engine.is_running() {
            return None;
        }
        let point = self.stage.clamp(Vec2::new(finite_or_zero(point.x), finite_or_zero(point.y)));
        Some(self.add_block(BlockKind::go_to(point.x, point.y)))
    }

    /// Same as `stage_click` for a click given as fractions of the stage, measured
    /// from the top-left corner. The point is rounded to whole stage units.
    pub fn stage_click_normalized(&mut self, u: f32, v: f32) -> Option<BlockId> {
        let point = self.stage.from_normalized(u, v);
        self.stage_click(point)
    }

    pub fn clear_script(&mut self) {
        self.script.clear();
        self.reset_sprite();
    }

    pub fn reset_sprite(&mut self) {
        self.engine.reset(&mut self.sprite, &mut self.events);
        self.quest_success = false;
    }

    /// Swaps in a prepared script. Ignored while a run is going.
    pub fn replace_script(&mut self, script: Script) -> bool {
        if self.engine.is_running() {
            return false;
        }
        self.script = script;
        true
    }

    /// Replaces the script with the lesson's reference solution.
    pub fn load_solution(&mut self) -> bool {
        let Some(solution) = self.current_lesson().map(|lesson| lesson.solution.clone()) else {
            return false;
        };
        if solution.is_empty() {
            return false;
        }
        self.clear_script();
        for kind in solution {
            self.script.append(kind);
        }
        true
    }

    pub fn run(&mut self) -> bool {
        let target = self.current_lesson().and_then(|lesson| lesson.target);
        let started = self.engine.start(&self.script, target, &mut self.events);
        if started {
            self.quest_success = false;
        }
        started
    }

    pub fn update(&mut self, dt: f32) -> Option<RunOutcome> {
        let mut ctx = StageContext {
            sprite: &mut self.sprite,
            background: &mut self.background,
            stage: &self.stage,
            wardrobe: &self.wardrobe,
            unlocked: self.progress.unlocked(),
            events: &mut self.events,
        };
        let report = self.engine.update(dt, &mut ctx)?;
        Some(self.settle_report(report))
    }

    /// Starts the script and plays it out with the configured fixed step.
    pub fn run_to_completion(&mut self) -> Option<RunOutcome> {
        if !self.run() {
            return None;
        }
        let mut ctx = StageContext {
            sprite: &mut self.sprite,
            background: &mut self.background,
            stage: &self.stage,
            wardrobe: &self.wardrobe,
            unlocked: self.progress.unlocked(),
            events: &mut self.events,
        };
        let report = self.engine.run_to_completion(self.step_seconds, &mut ctx)?;
        Some(self.settle_report(report))
    }

    pub fn answer_quiz(&mut self, answer: usize) -> QuizFeedback {
        let Some(lesson) = self.catalog.get(self.lesson_index) else {
            return QuizFeedback::NotAQuiz;
        };
        let Some(quiz) = &lesson.quiz else {
            return QuizFeedback::NotAQuiz;
        };
        if !quiz.check(answer) {
            return QuizFeedback::Incorrect;
        }
        let (id, reward) = (lesson.id.clone(), lesson.reward());
        self.quest_success = true;
        let stars_awarded = self.record_completion(&id, reward);
        QuizFeedback::Correct { stars_awarded }
    }

    /// Buys (if needed) and wears a costume. Returns `None` for unknown costumes and
    /// while a run is going, since only the engine touches the sprite mid-run.
    pub fn buy_costume(&mut self, id: &CostumeId) -> Option<Purchase> {
        if self.engine.is_running() {
            return None;
        }
        let costume = self.wardrobe.costume(id)?.clone();
        let purchase = self.progress.buy(&costume);
        match purchase {
            Purchase::Bought { .. } | Purchase::AlreadyOwned => {
                self.sprite.costume = costume.id.clone();
                self.events.push(StageEvent::CostumeChanged { costume: costume.id });
                if matches!(purchase, Purchase::Bought { .. }) {
                    self.autosave();
                }
            }
            Purchase::NotEnoughStars { .. } => {}
        }
        Some(purchase)
    }

    fn settle_report(&mut self, report: RunReport) -> RunOutcome {
        self.quest_success = report.success;
        let mut stars_awarded = 0;
        if report.success {
            if let Some((id, reward)) = self.current_lesson().map(|lesson| (lesson.id.clone(), lesson.reward())) {
                stars_awarded = self.record_completion(&id, reward);
            }
        }
        RunOutcome { report, newly_completed: stars_awarded > 0, stars_awarded }
    }

    fn record_completion(&mut self, lesson: &str, reward: u32) -> u32 {
        if !self.progress.complete_lesson(lesson, reward) {
            return 0;
        }
        tracing::info!(lesson, stars = reward, "lesson completed");
        self.events.push(StageEvent::LessonCompleted { lesson: lesson.to_string(), stars_awarded: reward });
        self.autosave();
        reward
    }

    fn autosave(&self) {
        if let Some(path) = &self.progress_path {
            if let Err(err) = self.progress.save(path) {
                tracing::warn!("Progress save error: {err:?}");
            }
        }
    }
}

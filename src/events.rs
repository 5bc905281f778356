use glam::Vec2;
use std::fmt;

use crate::blocks::BlockId;
use crate::wardrobe::CostumeId;

/// State changes published for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    RunStarted { blocks: usize },
    BlockStarted { block: BlockId, kind: &'static str },
    SpriteMoved { from: Vec2, to: Vec2 },
    SpriteTurned { rotation: f32 },
    CostumeChanged { costume: CostumeId },
    BackgroundChanged { index: usize, name: String },
    RunFinished { position: Vec2, success: bool },
    SpriteReset,
    LessonCompleted { lesson: String, stars_awarded: u32 },
}

impl StageEvent {
    pub fn sprite_moved(from: Vec2, to: Vec2) -> Option<Self> {
        if from == to {
            None
        } else {
            Some(StageEvent::SpriteMoved { from, to })
        }
    }
}

impl fmt::Display for StageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageEvent::RunStarted { blocks } => write!(f, "RunStarted blocks={blocks}"),
            StageEvent::BlockStarted { block, kind } => write!(f, "BlockStarted block={block} kind={kind}"),
            StageEvent::SpriteMoved { from, to } => {
                write!(f, "SpriteMoved from=({:.1},{:.1}) to=({:.1},{:.1})", from.x, from.y, to.x, to.y)
            }
            StageEvent::SpriteTurned { rotation } => write!(f, "SpriteTurned rotation={rotation:.1}"),
            StageEvent::CostumeChanged { costume } => write!(f, "CostumeChanged costume={costume}"),
            StageEvent::BackgroundChanged { index, name } => {
                write!(f, "BackgroundChanged index={index} name={name}")
            }
            StageEvent::RunFinished { position, success } => {
                write!(f, "RunFinished position=({:.1},{:.1}) success={success}", position.x, position.y)
            }
            StageEvent::SpriteReset => f.write_str("SpriteReset"),
            StageEvent::LessonCompleted { lesson, stars_awarded } => {
                write!(f, "LessonCompleted lesson={lesson} stars={stars_awarded}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<StageEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<StageEvent> {
        self.events.drain(..).collect()
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MOVE_RANGE: (f32, f32) = (-240.0, 240.0);
pub const TURN_RANGE: (f32, f32) = (-360.0, 360.0);
pub const CHANGE_RANGE: (f32, f32) = (-240.0, 240.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Move { steps: f32 },
    Turn { degrees: f32 },
    GoTo { x: f32, y: f32 },
    GlideTo { x: f32, y: f32 },
    NextCostume,
    RandomBackground,
    ChangeX { delta: f32 },
    ChangeY { delta: f32 },
}

impl BlockKind {
    pub fn move_steps(steps: f32) -> Self {
        BlockKind::Move { steps: clamp_input(steps, MOVE_RANGE) }
    }

    pub fn turn(degrees: f32) -> Self {
        BlockKind::Turn { degrees: clamp_input(degrees, TURN_RANGE) }
    }

    pub fn change_x(delta: f32) -> Self {
        BlockKind::ChangeX { delta: clamp_input(delta, CHANGE_RANGE) }
    }

    pub fn change_y(delta: f32) -> Self {
        BlockKind::ChangeY { delta: clamp_input(delta, CHANGE_RANGE) }
    }

    /// Coordinates are clamped to the stage when the block runs; only non-finite
    /// values are replaced here.
    pub fn go_to(x: f32, y: f32) -> Self {
        BlockKind::GoTo { x: finite_or_zero(x), y: finite_or_zero(y) }
    }

    pub fn glide_to(x: f32, y: f32) -> Self {
        BlockKind::GlideTo { x: finite_or_zero(x), y: finite_or_zero(y) }
    }

    /// Re-applies the palette input ranges, e.g. for blocks read from a file.
    pub fn clamped(self) -> Self {
        match self {
            BlockKind::Move { steps } => Self::move_steps(steps),
            BlockKind::Turn { degrees } => Self::turn(degrees),
            BlockKind::ChangeX { delta } => Self::change_x(delta),
            BlockKind::ChangeY { delta } => Self::change_y(delta),
            BlockKind::GoTo { x, y } => Self::go_to(x, y),
            BlockKind::GlideTo { x, y } => Self::glide_to(x, y),
            other => other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Move { .. } => "move",
            BlockKind::Turn { .. } => "turn",
            BlockKind::GoTo { .. } => "goto",
            BlockKind::GlideTo { .. } => "glide",
            BlockKind::NextCostume => "costume",
            BlockKind::RandomBackground => "background",
            BlockKind::ChangeX { .. } => "changex",
            BlockKind::ChangeY { .. } => "changey",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Move { steps } => write!(f, "move {steps}"),
            BlockKind::Turn { degrees } => write!(f, "turn {degrees}"),
            BlockKind::GoTo { x, y } => write!(f, "goto ({x}, {y})"),
            BlockKind::GlideTo { x, y } => write!(f, "glide ({x}, {y})"),
            BlockKind::NextCostume => f.write_str("next costume"),
            BlockKind::RandomBackground => f.write_str("random background"),
            BlockKind::ChangeX { delta } => write!(f, "change x {delta}"),
            BlockKind::ChangeY { delta } => write!(f, "change y {delta}"),
        }
    }
}

pub(crate) fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp_input(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self { id: BlockId::new(), kind }
    }
}

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::wardrobe::CostumeId;

pub const STAGE_WIDTH: f32 = 480.0;
pub const STAGE_HEIGHT: f32 = 360.0;

/// Axis-aligned stage rectangle centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBounds {
    pub half_extents: Vec2,
}

impl Default for StageBounds {
    fn default() -> Self {
        Self { half_extents: Vec2::new(STAGE_WIDTH * 0.5, STAGE_HEIGHT * 0.5) }
    }
}

impl StageBounds {
    pub fn min(&self) -> Vec2 {
        -self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.half_extents
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= -self.half_extents.x
            && point.x <= self.half_extents.x
            && point.y >= -self.half_extents.y
            && point.y <= self.half_extents.y
    }

    /// Maps a normalized click (0..1 from the top-left corner) to rounded stage coordinates.
    pub fn from_normalized(&self, u: f32, v: f32) -> Vec2 {
        let x = (u * self.half_extents.x * 2.0 - self.half_extents.x).round();
        let y = (self.half_extents.y - v * self.half_extents.y * 2.0).round();
        self.clamp(Vec2::new(x, y))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteState {
    pub position: Vec2,
    /// Degrees, never normalized.
    pub rotation: f32,
    pub costume: CostumeId,
    pub visible: bool,
}

impl Default for SpriteState {
    fn default() -> Self {
        Self::wearing(CostumeId::default())
    }
}

impl SpriteState {
    pub fn wearing(costume: CostumeId) -> Self {
        Self { position: Vec2::ZERO, rotation: 0.0, costume, visible: true }
    }

    pub fn heading(&self) -> Vec2 {
        let radians = self.rotation.to_radians();
        Vec2::new(radians.cos(), radians.sin())
    }

    pub fn set_position(&mut self, position: Vec2, stage: &StageBounds) {
        self.position = stage.clamp(position);
    }

    pub fn translate(&mut self, delta: Vec2, stage: &StageBounds) {
        self.set_position(self.position + delta, stage);
    }

    pub fn advance(&mut self, steps: f32, stage: &StageBounds) {
        let delta = self.heading() * steps;
        self.translate(delta, stage);
    }

    pub fn turn(&mut self, degrees: f32) {
        self.rotation += degrees;
    }

    /// Back to origin facing right. Costume and visibility are kept.
    pub fn reset_pose(&mut self) {
        self.position = Vec2::ZERO;
        self.rotation = 0.0;
    }
}

use glam::Vec2;

pub const GOAL_THRESHOLD: f32 = 45.0;

/// True when `position` lies strictly within the default threshold of `target`.
/// A lesson without a target can never be won by running a script.
pub fn evaluate(position: Vec2, target: Option<Vec2>) -> bool {
    evaluate_with_threshold(position, target, GOAL_THRESHOLD)
}

pub fn evaluate_with_threshold(position: Vec2, target: Option<Vec2>, threshold: f32) -> bool {
    match target {
        Some(target) => position.distance(target) < threshold,
        None => false,
    }
}

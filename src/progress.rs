use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::wardrobe::{Costume, CostumeId, Wardrobe};

/// Stars, completed lessons and owned costumes. Persisted as a flat key-value JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(rename = "cq_stars", default)]
    stars: u32,
    #[serde(rename = "cq_completed", default)]
    completed: BTreeSet<String>,
    #[serde(rename = "cq_unlocked", default)]
    unlocked: BTreeSet<CostumeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchase {
    Bought { remaining: u32 },
    AlreadyOwned,
    NotEnoughStars { missing: u32 },
}

impl Progress {
    pub fn new(wardrobe: &Wardrobe) -> Self {
        Self { stars: 0, completed: BTreeSet::new(), unlocked: wardrobe.starter_costumes() }
    }

    pub fn load(path: impl AsRef<Path>, wardrobe: &Wardrobe) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(wardrobe));
        }
        let bytes = fs::read(path).with_context(|| format!("Failed to read progress {}", path.display()))?;
        let mut progress: Progress = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse progress {}", path.display()))?;
        if progress.unlocked.is_empty() {
            progress.unlocked = wardrobe.starter_costumes();
        }
        Ok(progress)
    }

    pub fn load_or_default(path: impl AsRef<Path>, wardrobe: &Wardrobe) -> Self {
        match Self::load(path, wardrobe) {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!("Progress load error: {err:?}. Starting fresh.");
                Self::new(wardrobe)
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating progress directory '{}'", parent.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(self).context("serializing progress")?;
        fs::write(path, json).with_context(|| format!("Failed to write progress {}", path.display()))
    }

    pub fn stars(&self) -> u32 {
        self.stars
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn unlocked(&self) -> &BTreeSet<CostumeId> {
        &self.unlocked
    }

    pub fn is_completed(&self, lesson: &str) -> bool {
        self.completed.contains(lesson)
    }

    pub fn owns(&self, costume: &CostumeId) -> bool {
        self.unlocked.contains(costume)
    }

    /// Replaces the owned costume set, e.g. when seeding a fixture.
    pub fn set_unlocked(&mut self, costumes: impl IntoIterator<Item = CostumeId>) {
        self.unlocked = costumes.into_iter().collect();
    }

    /// Marks `lesson` complete. Stars are only granted the first time; returns whether
    /// this call completed it.
    pub fn complete_lesson(&mut self, lesson: &str, reward: u32) -> bool {
        if !self.completed.insert(lesson.to_string()) {
            return false;
        }
        self.stars = self.stars.saturating_add(reward);
        true
    }

    pub fn buy(&mut self, costume: &Costume) -> Purchase {
        if self.owns(&costume.id) {
            return Purchase::AlreadyOwned;
        }
        if self.stars < costume.price {
            return Purchase::NotEnoughStars { missing: costume.price - self.stars };
        }
        self.stars -= costume.price;
        self.unlocked.insert(costume.id.clone());
        Purchase::Bought { remaining: self.stars }
    }

    pub fn completion_percent(&self, total_lessons: usize) -> u32 {
        if total_lessons == 0 {
            return 0;
        }
        ((self.completed.len() as f32 / total_lessons as f32) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_only_awarded_once_per_lesson() {
        let wardrobe = Wardrobe::builtin();
        let mut progress = Progress::new(&wardrobe);
        assert!(progress.complete_lesson("l1-coding", 1));
        assert!(!progress.complete_lesson("l1-coding", 1));
        assert!(progress.complete_lesson("l2-math", 2));
        assert_eq!(progress.stars(), 3);
        assert_eq!(progress.completion_percent(12), 17);
    }

    #[test]
    fn purchases_spend_stars() {
        let wardrobe = Wardrobe::builtin();
        let mut progress = Progress::new(&wardrobe);
        let rocket = wardrobe.costume(&CostumeId::from("rocket")).expect("rocket").clone();
        assert_eq!(progress.buy(&rocket), Purchase::NotEnoughStars { missing: 1 });
        progress.complete_lesson("l2-math", 2);
        assert_eq!(progress.buy(&rocket), Purchase::Bought { remaining: 1 });
        assert_eq!(progress.buy(&rocket), Purchase::AlreadyOwned);
        assert!(progress.owns(&rocket.id));
        let cat = wardrobe.costume(&CostumeId::from("cat")).expect("cat").clone();
        assert_eq!(progress.buy(&cat), Purchase::AlreadyOwned, "starters are owned from the start");
    }

    #[test]
    fn save_and_load_use_flat_keys() {
        let wardrobe = Wardrobe::builtin();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("progress.json");
        let mut progress = Progress::new(&wardrobe);
        progress.complete_lesson("l1-coding", 1);
        progress.save(&path).expect("save progress");

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).expect("read")).expect("json");
        assert_eq!(raw["cq_stars"], 1);
        assert_eq!(raw["cq_completed"][0], "l1-coding");
        assert_eq!(raw["cq_unlocked"].as_array().map(|a| a.len()), Some(2));

        let loaded = Progress::load(&path, &wardrobe).expect("load progress");
        assert_eq!(loaded, progress);
    }

    #[test]
    fn missing_or_broken_files_start_fresh() {
        let wardrobe = Wardrobe::builtin();
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = Progress::load(dir.path().join("none.json"), &wardrobe).expect("missing is fine");
        assert_eq!(missing, Progress::new(&wardrobe));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").expect("write");
        assert!(Progress::load(&broken, &wardrobe).is_err());
        assert_eq!(Progress::load_or_default(&broken, &wardrobe), Progress::new(&wardrobe));

        let partial = dir.path().join("partial.json");
        fs::write(&partial, r#"{"cq_stars": 4}"#).expect("write");
        let loaded = Progress::load(&partial, &wardrobe).expect("partial loads");
        assert_eq!(loaded.stars(), 4);
        assert_eq!(loaded.unlocked(), &wardrobe.starter_costumes());
    }
}

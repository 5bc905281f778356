use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::goal::GOAL_THRESHOLD;

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_settle_seconds")]
    pub settle_seconds: f32,
    #[serde(default = "TimingConfig::default_glide_seconds")]
    pub glide_seconds: f32,
    #[serde(default = "TimingConfig::default_step_seconds")]
    pub step_seconds: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalConfig {
    #[serde(default = "GoalConfig::default_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "ProgressConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "ProgressConfig::default_autosave")]
    pub autosave: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub goal: GoalConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub lessons_path: Option<PathBuf>,
    #[serde(default)]
    pub deterministic_seed: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub settle_seconds: Option<f32>,
    pub glide_seconds: Option<f32>,
    pub progress_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl TimingConfig {
    fn default_settle_seconds() -> f32 {
        0.4
    }

    fn default_glide_seconds() -> f32 {
        0.6
    }

    fn default_step_seconds() -> f32 {
        1.0 / 60.0
    }

    /// Fixed playback step; values that are not a usable duration fall back to 60 Hz.
    pub fn step(&self) -> Duration {
        let fallback = Duration::from_secs_f32(Self::default_step_seconds());
        if self.step_seconds > 0.0 {
            Duration::try_from_secs_f32(self.step_seconds).unwrap_or(fallback)
        } else {
            fallback
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_seconds: Self::default_settle_seconds(),
            glide_seconds: Self::default_glide_seconds(),
            step_seconds: Self::default_step_seconds(),
        }
    }
}

impl GoalConfig {
    fn default_threshold() -> f32 {
        GOAL_THRESHOLD
    }
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self { threshold: Self::default_threshold() }
    }
}

impl ProgressConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("codequest_progress.json")
    }

    const fn default_autosave() -> bool {
        true
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { path: Self::default_path(), autosave: Self::default_autosave() }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(settle) = overrides.settle_seconds {
            self.timing.settle_seconds = settle;
        }
        if let Some(glide) = overrides.glide_seconds {
            self.timing.glide_seconds = glide;
        }
        if let Some(path) = &overrides.progress_path {
            self.progress.path = path.clone();
        }
        if let Some(seed) = overrides.seed {
            self.deterministic_seed = Some(seed);
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.settle_seconds.is_none()
            && self.glide_seconds.is_none()
            && self.progress_path.is_none()
            && self.seed.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.settle_seconds.is_some() {
            fields.push("settle");
        }
        if self.glide_seconds.is_some() {
            fields.push("glide");
        }
        if self.progress_path.is_some() {
            fields.push("progress");
        }
        if self.seed.is_some() {
            fields.push("seed");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "timing": {{ "settle_seconds": 0.1 }}, "deterministic_seed": 9 }}"#).expect("write");
        let cfg = AppConfig::load(file.path()).expect("load config");
        assert!((cfg.timing.settle_seconds - 0.1).abs() < f32::EPSILON);
        assert!((cfg.timing.glide_seconds - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.goal.threshold, GOAL_THRESHOLD);
        assert_eq!(cfg.deterministic_seed, Some(9));
        assert!(cfg.progress.autosave);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default("does/not/exist.json");
        assert!((cfg.timing.settle_seconds - 0.4).abs() < f32::EPSILON);
        assert_eq!(cfg.progress.path, PathBuf::from("codequest_progress.json"));
    }

    #[test]
    fn unusable_step_falls_back_to_sixty_hz() {
        let sixty_hz = TimingConfig::default().step();
        for step_seconds in [0.0, -1.0, f32::NAN, f32::INFINITY, f32::MAX] {
            let timing = TimingConfig { step_seconds, ..TimingConfig::default() };
            assert_eq!(timing.step(), sixty_hz, "step_seconds = {step_seconds}");
        }
        let timing = TimingConfig { step_seconds: 0.5, ..TimingConfig::default() };
        assert_eq!(timing.step(), Duration::from_millis(500));
    }

    #[test]
    fn overrides_replace_fields() {
        let mut cfg = AppConfig::default();
        let overrides = AppConfigOverrides { glide_seconds: Some(0.0), seed: Some(3), ..Default::default() };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.timing.glide_seconds, 0.0);
        assert_eq!(cfg.deterministic_seed, Some(3));
        assert_eq!(overrides.applied_fields(), vec!["glide", "seed"]);
        assert!(!overrides.is_empty());
    }
}

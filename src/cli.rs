use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub lesson: Option<String>,
    pub script: Option<PathBuf>,
    pub realtime: Option<bool>,
    settle: Option<f32>,
    glide: Option<f32>,
    seed: Option<u64>,
    progress: Option<PathBuf>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "lesson" => overrides.lesson = Some(value),
                "script" => overrides.script = Some(PathBuf::from(value)),
                "progress" => overrides.progress = Some(PathBuf::from(value)),
                "settle" => {
                    overrides.settle = Some(parse_seconds("settle", &value)?);
                }
                "glide" => {
                    overrides.glide = Some(parse_seconds("glide", &value)?);
                }
                "seed" => {
                    overrides.seed = Some(value.parse::<u64>().with_context(|| format!("Invalid seed '{value}'"))?);
                }
                "realtime" => {
                    overrides.realtime = Some(parse_bool_flag("realtime", &value)?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --lesson, --script, --progress, \
                     --settle, --glide, --seed, --realtime."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_overrides(&self) -> AppConfigOverrides {
        AppConfigOverrides {
            settle_seconds: self.settle,
            glide_seconds: self.glide,
            progress_path: self.progress.clone(),
            seed: self.seed,
        }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<f32>, Option<f32>, Option<u64>, Option<bool>) {
        (self.settle, self.glide, self.seed, self.realtime)
    }
}

/// Flags for the fixture harness binary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessArgs {
    pub fixture: PathBuf,
    pub golden: Option<PathBuf>,
    pub write_output: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl HarnessArgs {
    pub const USAGE: &'static str = "Usage: codequest_harness --fixture <path> [--golden <path>] [--write-output <path>] [--seed <n>]
  -f, --fixture        Fixture JSON describing the lesson, blocks and timing
  -g, --golden         Compare the run against this golden output
  -o, --write-output   Write the run output here (refreshes a golden)
  -s, --seed           Replace the fixture's background seed";

    pub fn parse_from_env() -> Result<Option<Self>> {
        Self::parse(env::args())
    }

    /// Returns `None` when help was requested.
    pub fn parse<I, S>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fixture = None;
        let mut parsed = HarnessArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next();
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if matches!(flag, "--help" | "-h") {
                return Ok(None);
            }
            let value = iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match flag {
                "--fixture" | "-f" => fixture = Some(PathBuf::from(value)),
                "--golden" | "-g" => parsed.golden = Some(PathBuf::from(value)),
                "--write-output" | "-o" => parsed.write_output = Some(PathBuf::from(value)),
                "--seed" | "-s" => {
                    parsed.seed = Some(value.parse::<u64>().with_context(|| format!("Invalid seed '{value}'"))?);
                }
                _ => bail!("Unknown flag '{flag}'.\n{}", Self::USAGE),
            }
        }
        parsed.fixture = fixture.ok_or_else(|| anyhow!("--fixture <path> is required.\n{}", Self::USAGE))?;
        Ok(Some(parsed))
    }
}

fn parse_seconds(flag: &str, value: &str) -> Result<f32> {
    let seconds = value.parse::<f32>().with_context(|| format!("Invalid {flag} '{value}'"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("Invalid {flag} '{value}'. Use a non-negative number of seconds.");
    }
    Ok(seconds)
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timing_seed_and_realtime() {
        let args = ["app", "--settle", "0.2", "--glide", "0", "--seed", "42", "--realtime", "off"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.as_tuple(), (Some(0.2), Some(0.0), Some(42), Some(false)));
        assert_eq!(overrides.config_overrides().applied_fields(), vec!["settle", "glide", "seed"]);
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--lesson", "l1-coding", "--lesson", "l3-coding", "--seed", "1", "--seed", "2"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.lesson.as_deref(), Some("l3-coding"));
        assert_eq!(overrides.as_tuple().2, Some(2));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--script"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_negative_delays() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["app", "--settle", "-1"]).is_err());
    }

    #[test]
    fn harness_args_accept_short_and_long_flags() {
        let args = ["harness", "-f", "a.json", "--golden", "a.golden.json", "-s", "7"];
        let parsed = HarnessArgs::parse(args).expect("parse").expect("not help");
        assert_eq!(parsed.fixture, PathBuf::from("a.json"));
        assert_eq!(parsed.golden, Some(PathBuf::from("a.golden.json")));
        assert_eq!(parsed.write_output, None);
        assert_eq!(parsed.seed, Some(7));
    }

    #[test]
    fn harness_args_need_a_fixture() {
        let err = HarnessArgs::parse(["harness", "-o", "out.json"]).unwrap_err();
        assert!(err.to_string().contains("--fixture"));
        assert_eq!(HarnessArgs::parse(["harness", "--help"]).expect("help"), None);
        assert!(HarnessArgs::parse(["harness", "-f", "a.json", "--seed", "x"]).is_err());
    }
}

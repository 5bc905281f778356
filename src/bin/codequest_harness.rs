use std::fs::{self, File};
use std::path::Path;

use anyhow::{bail, Context, Result};
use codequest_engine::cli::HarnessArgs;
use codequest_engine::harness::{load_fixture, run_fixture, HarnessOutput};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
    let args = match HarnessArgs::parse_from_env() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", HarnessArgs::USAGE);
            return;
        }
        Err(err) => {
            eprintln!("[codequest-harness] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(&args) {
        eprintln!("[codequest-harness] error: {err:?}");
        std::process::exit(1);
    }
}

fn run(args: &HarnessArgs) -> Result<()> {
    let mut fixture = load_fixture(&args.fixture)?;
    if args.seed.is_some() {
        fixture.deterministic_seed = args.seed;
    }
    let output = run_fixture(&fixture)?;
    tracing::info!(ticks = output.ticks, success = output.success, "fixture {} played", args.fixture.display());

    if let Some(path) = &args.write_output {
        write_output(path, &output)?;
        println!("[codequest-harness] wrote {}", path.display());
    }
    match &args.golden {
        Some(path) => {
            compare_golden(path, &output)
                .with_context(|| format!("fixture {}", args.fixture.display()))?;
            println!("[codequest-harness] matched golden {}", path.display());
        }
        None if args.write_output.is_none() => {
            serde_json::to_writer_pretty(std::io::stdout(), &output)?;
            println!();
        }
        None => {}
    }
    Ok(())
}

fn write_output(path: &Path, output: &HarnessOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, output).context("serializing harness output")
}

fn compare_golden(path: &Path, output: &HarnessOutput) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening golden {}", path.display()))?;
    let expected: HarnessOutput = serde_json::from_reader(file).context("parsing golden JSON")?;
    if &expected != output {
        bail!(
            "golden mismatch (refresh with --write-output):\nexpected: {}\nactual:   {}",
            serde_json::to_string(&expected).unwrap_or_default(),
            serde_json::to_string(output).unwrap_or_default(),
        );
    }
    Ok(())
}

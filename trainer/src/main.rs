//! gridpeak-train - episode driver
//!
//! Runs Q-learning episodes on the grid maze, feeds every finished trajectory
//! to the density accumulator, logs concept peaks, and prints the final greedy
//! policy plus an evidence heat map.
//!
//! Examples:
//!   gridpeak-train
//!   gridpeak-train --episodes 500 --seed 7
//!   gridpeak-train --config run.json --summary out.json
//!
//! Logging honours `RUST_LOG` (default `info`).

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use gridpeak::observer::TrainerAdapter;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod paths;
mod render;

use config::TrainConfig;
use error::TrainError;
use paths::AppPaths;

const USAGE: &str = "\
gridpeak-train (tabular Q-learning + concept peak detection)
usage: gridpeak-train [options]

options:
  --config <path>     JSON config (default: <data dir>/gridpeak/config.json if present)
  --episodes <n>      Override episode count
  --seed <n>          Override both environment and agent seeds
  --summary <path>    Write a JSON run summary
  -h, --help          Show this help";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    episodes: Option<u32>,
    seed: Option<u64>,
    summary: Option<PathBuf>,
    help: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, TrainError> {
        let mut out = Args::default();
        let mut it = args.into_iter();
        while let Some(arg) = it.next() {
            let mut value = |name: &str| {
                it.next()
                    .ok_or_else(|| TrainError::Usage(format!("{name} needs a value")))
            };
            match arg.as_str() {
                "-h" | "--help" | "help" => out.help = true,
                "--config" => out.config = Some(PathBuf::from(value("--config")?)),
                "--summary" => out.summary = Some(PathBuf::from(value("--summary")?)),
                "--episodes" => out.episodes = Some(parse_num("--episodes", &value("--episodes")?)?),
                "--seed" => out.seed = Some(parse_num("--seed", &value("--seed")?)?),
                other => return Err(TrainError::Usage(format!("unknown argument: {other}"))),
            }
        }
        Ok(out)
    }

    fn apply(&self, cfg: &mut TrainConfig) {
        if let Some(n) = self.episodes {
            cfg.episodes = n;
        }
        if let Some(seed) = self.seed {
            cfg.env.seed = seed;
            cfg.agent_seed = seed.wrapping_add(1);
        }
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, v: &str) -> Result<T, TrainError> {
    v.parse()
        .map_err(|_| TrainError::Usage(format!("{name}: not a number: {v}")))
}

#[derive(Debug, Serialize)]
struct PeakRecord {
    episode: u32,
    row: usize,
    col: usize,
    strength: f64,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    episodes: u32,
    successes: u32,
    failures: u32,
    success_rate: f32,
    last_100_rate: f32,
    mean_success_steps: Option<f64>,
    final_epsilon: f64,
    mean_abs_q: f64,
    evidence_argmax: gridpeak::grid::Position,
    peaks: Vec<PeakRecord>,
}

fn run(args: Args) -> Result<(), TrainError> {
    let paths = AppPaths::discover();
    let mut cfg = TrainConfig::resolve(args.config.as_deref(), paths.as_ref())?;
    args.apply(&mut cfg);

    let mut trainer = cfg.build_trainer()?;
    info!(
        episodes = cfg.episodes,
        max_steps = cfg.max_steps,
        p_failure = cfg.env.p_failure,
        "training started"
    );

    let mut peaks = Vec::new();
    for _ in 0..cfg.episodes {
        let report = trainer.run_episode(cfg.max_steps);
        if let Some(peak) = report.peak {
            info!(
                episode = report.episode,
                row = peak.position.row,
                col = peak.position.col,
                strength = peak.strength,
                "concept peak"
            );
            peaks.push(PeakRecord {
                episode: report.episode,
                row: peak.position.row,
                col: peak.position.col,
                strength: peak.strength,
            });
        }

        let done = report.episode + 1;
        if cfg.log_every > 0 && done % cfg.log_every == 0 {
            let stats = trainer.stats();
            info!(
                episode = done,
                success_rate = stats.success_rate(),
                last_100 = stats.last_100_rate(),
                epsilon = trainer.schedule().epsilon(),
                mean_abs_q = trainer.table().mean_abs(),
                "progress"
            );
        }
    }

    let stats = trainer.stats();
    info!(
        successes = stats.successes,
        failures = stats.failures,
        peaks = peaks.len(),
        epsilon = trainer.schedule().epsilon(),
        "training finished"
    );

    let adapter = TrainerAdapter::new(&trainer);
    let evidence = adapter.evidence();
    println!("{}", render::render_policy(&adapter.policy()));
    println!("{}", render::render_evidence(&evidence));

    if let Some(path) = &args.summary {
        let summary = RunSummary {
            episodes: stats.episodes,
            successes: stats.successes,
            failures: stats.failures,
            success_rate: stats.success_rate(),
            last_100_rate: stats.last_100_rate(),
            mean_success_steps: stats.mean_success_steps(),
            final_epsilon: trainer.schedule().epsilon(),
            mean_abs_q: trainer.table().mean_abs(),
            evidence_argmax: evidence.argmax,
            peaks,
        };
        let file = File::create(path).map_err(|source| TrainError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary).map_err(TrainError::Summary)?;
        info!("Summary written to {:?}", path);
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(v: &[&str]) -> Result<Args, TrainError> {
        Args::parse(v.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_overrides() {
        let a = parse(&["--episodes", "25", "--seed", "4", "--summary", "s.json"]).unwrap();
        assert_eq!(a.episodes, Some(25));
        assert_eq!(a.seed, Some(4));
        assert_eq!(a.summary, Some(PathBuf::from("s.json")));

        let mut cfg = TrainConfig::default();
        a.apply(&mut cfg);
        assert_eq!(cfg.episodes, 25);
        assert_eq!(cfg.env.seed, 4);
        assert_eq!(cfg.agent_seed, 5);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(parse(&["--bogus"]), Err(TrainError::Usage(_))));
        assert!(matches!(parse(&["--episodes"]), Err(TrainError::Usage(_))));
        assert!(matches!(parse(&["--seed", "x"]), Err(TrainError::Usage(_))));
        assert!(parse(&["-h"]).unwrap().help);
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn short_run_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("cfg.json");
        std::fs::write(&cfg_path, r#"{ "episodes": 5, "max_steps": 50, "log_every": 2 }"#).unwrap();
        let summary = dir.path().join("summary.json");

        run(Args {
            config: Some(cfg_path),
            summary: Some(summary.clone()),
            ..Default::default()
        })
        .unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(v["episodes"], 5);
        assert_eq!(
            v["successes"].as_u64().unwrap() + v["failures"].as_u64().unwrap(),
            5
        );
        assert!(v["peaks"].as_array().unwrap().is_empty());
        let mean_abs_q = v["mean_abs_q"].as_f64().unwrap();
        assert!(mean_abs_q.is_finite() && mean_abs_q >= 0.0);
    }
}

//! `frankenpace` — run a paced test-case sweep against a pipeline worker.
//!
//! The worker is any program speaking the line-oriented JSON protocol: one
//! request object per stdin line, one reply object per stdout line. It is
//! spawned once and kept alive for the whole run.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use fpace_engine::{PipelineProcess, RunConfig, RunEngine, StopToken, ThreadSleeper};

#[derive(Debug)]
struct CliConfig {
    worker: String,
    worker_args: Vec<String>,
    target: Option<String>,
    run: RunConfig,
}

fn print_help() {
    let help = "\
frankenpace — paced test-case executor with rate-limit backpressure

USAGE:
    frankenpace --worker <PROGRAM> [OPTIONS]

OPTIONS:
    --worker <PROGRAM>          Pipeline worker to spawn (required)
    --worker-arg <ARG>          Extra worker argument (repeatable, in order)
    --target <URL>              Target address, passed to the worker as its
                                final argument
    --include <KINDS>           Comma-separated content kinds
                                (default microcopy,internal_comms,press_release)
    --replicates <N>            Repetitions per catalog entry (default 1)
    --delay-ms <MS>             Base delay between cases (default 1500)
    --jitter-ms <MS>            Uniform jitter bound added to the delay (default 400)
    --batch-size <N>            Cases per batch (default 12)
    --batch-pause-ms <MS>       Pause between batches (default 90000)
    --cooldown-threshold <N>    Consecutive rate-limit hits before cooldown (default 2)
    --cooldown-ms <MS>          Cooldown duration (default 90000)
    --out-dir <PATH>            Output directory (default runs_local)
    --tag <TAG>                 Tag embedded in output file names (default local)
    --seed <U64>                Fixed shuffle/jitter seed (entropy when omitted)
    -h, --help                  Show this help
";
    println!("{help}");
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut worker: Option<String> = None;
    let mut worker_args: Vec<String> = Vec::new();
    let mut target: Option<String> = None;
    let mut run = RunConfig::default();

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--worker" => {
                index += 1;
                if index >= args.len() {
                    return Err("--worker requires a value".to_owned());
                }
                worker = Some(args[index].clone());
            }
            "--worker-arg" => {
                index += 1;
                if index >= args.len() {
                    return Err("--worker-arg requires a value".to_owned());
                }
                worker_args.push(args[index].clone());
            }
            "--target" => {
                index += 1;
                if index >= args.len() {
                    return Err("--target requires a value".to_owned());
                }
                target = Some(args[index].clone());
            }
            "--include" => {
                index += 1;
                if index >= args.len() {
                    return Err("--include requires a value".to_owned());
                }
                run.include = args[index]
                    .split(',')
                    .map(|token| token.trim().to_owned())
                    .collect();
            }
            "--replicates" => {
                index += 1;
                if index >= args.len() {
                    return Err("--replicates requires a value".to_owned());
                }
                run.replicates = args[index]
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --replicates value: {}", args[index]))?;
            }
            "--delay-ms" => {
                index += 1;
                if index >= args.len() {
                    return Err("--delay-ms requires a value".to_owned());
                }
                run.pacer.base_delay = parse_ms("--delay-ms", &args[index])?;
            }
            "--jitter-ms" => {
                index += 1;
                if index >= args.len() {
                    return Err("--jitter-ms requires a value".to_owned());
                }
                run.pacer.jitter_bound = parse_ms("--jitter-ms", &args[index])?;
            }
            "--batch-size" => {
                index += 1;
                if index >= args.len() {
                    return Err("--batch-size requires a value".to_owned());
                }
                run.pacer.batch_size = args[index]
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --batch-size value: {}", args[index]))?;
            }
            "--batch-pause-ms" => {
                index += 1;
                if index >= args.len() {
                    return Err("--batch-pause-ms requires a value".to_owned());
                }
                run.pacer.batch_pause = parse_ms("--batch-pause-ms", &args[index])?;
            }
            "--cooldown-threshold" => {
                index += 1;
                if index >= args.len() {
                    return Err("--cooldown-threshold requires a value".to_owned());
                }
                run.pacer.cooldown_threshold = args[index]
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --cooldown-threshold value: {}", args[index]))?;
            }
            "--cooldown-ms" => {
                index += 1;
                if index >= args.len() {
                    return Err("--cooldown-ms requires a value".to_owned());
                }
                run.pacer.cooldown = parse_ms("--cooldown-ms", &args[index])?;
            }
            "--out-dir" => {
                index += 1;
                if index >= args.len() {
                    return Err("--out-dir requires a value".to_owned());
                }
                run.out_dir = PathBuf::from(&args[index]);
            }
            "--tag" => {
                index += 1;
                if index >= args.len() {
                    return Err("--tag requires a value".to_owned());
                }
                run.tag = args[index].clone();
            }
            "--seed" => {
                index += 1;
                if index >= args.len() {
                    return Err("--seed requires a value".to_owned());
                }
                run.seed = Some(
                    args[index]
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --seed value: {}", args[index]))?,
                );
            }
            "-h" | "--help" => {
                print_help();
                return Err(String::new());
            }
            unknown => return Err(format!("unknown option: {unknown}")),
        }
        index += 1;
    }

    Ok(CliConfig {
        worker: worker.ok_or_else(|| "--worker is required".to_owned())?,
        worker_args,
        target,
        run,
    })
}

fn parse_ms(flag: &str, value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| format!("invalid {flag} value: {value}"))
}

fn run(args: &[String]) -> Result<(), String> {
    let config = parse_args(args)?;

    let mut worker_args = config.worker_args.clone();
    if let Some(target) = &config.target {
        worker_args.push(target.clone());
    }
    let session = PipelineProcess::spawn(&config.worker, &worker_args)
        .map_err(|error| format!("worker setup failed: {error}"))?;
    let engine = RunEngine::new(&config.run, session, ThreadSleeper, StopToken::new())
        .map_err(|error| format!("run setup failed: {error}"))?;

    tracing::info!(
        worker = %config.worker,
        cases = engine.corpus_len(),
        out_dir = %config.run.out_dir.display(),
        "starting run"
    );

    let outcome = engine
        .run()
        .map_err(|error| format!("run failed: {error}"))?;

    println!("records: {}", outcome.records_path.display());
    println!("summary: {}", outcome.summary_path.display());
    println!(
        "total={} pass={} borderline={} fail={} avg_trs={} rate_limit_hits={}",
        outcome.summary.total_runs,
        outcome.summary.pass,
        outcome.summary.borderline,
        outcome.summary.fail,
        outcome.summary.avg_trs,
        outcome.summary.rate_limit_hits,
    );
    if outcome.interrupted {
        return Err("run interrupted before completing the corpus".to_owned());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_empty() => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ERROR frankenpace failed: {error}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| (*part).to_owned()).collect()
    }

    #[test]
    fn worker_is_required() {
        let err = parse_args(&args(&["--tag", "t"])).unwrap_err();
        assert!(err.contains("--worker"), "err={err}");
    }

    #[test]
    fn defaults_survive_minimal_invocation() {
        let config = parse_args(&args(&["--worker", "worker.sh"])).unwrap();
        assert_eq!(config.worker, "worker.sh");
        assert!(config.worker_args.is_empty());
        assert_eq!(config.target, None);
        assert_eq!(config.run, RunConfig::default());
    }

    #[test]
    fn target_is_captured_separately_from_worker_args() {
        let config = parse_args(&args(&[
            "--worker",
            "node",
            "--worker-arg",
            "pipeline.js",
            "--target",
            "http://localhost:3000",
        ]))
        .unwrap();
        assert_eq!(config.worker_args, vec!["pipeline.js".to_owned()]);
        assert_eq!(config.target.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn include_splits_and_trims() {
        let config = parse_args(&args(&[
            "--worker", "w", "--include", "microcopy, pr ,internal",
        ]))
        .unwrap();
        assert_eq!(
            config.run.include,
            vec!["microcopy".to_owned(), "pr".to_owned(), "internal".to_owned()]
        );
    }

    #[test]
    fn worker_args_accumulate_in_order() {
        let config = parse_args(&args(&[
            "--worker",
            "node",
            "--worker-arg",
            "pipeline.js",
            "--worker-arg",
            "--fast",
        ]))
        .unwrap();
        assert_eq!(
            config.worker_args,
            vec!["pipeline.js".to_owned(), "--fast".to_owned()]
        );
    }

    #[test]
    fn pacing_flags_override_defaults() {
        let config = parse_args(&args(&[
            "--worker", "w",
            "--delay-ms", "200",
            "--jitter-ms", "50",
            "--batch-size", "6",
            "--batch-pause-ms", "1000",
            "--cooldown-threshold", "3",
            "--cooldown-ms", "5000",
            "--replicates", "4",
            "--seed", "42",
            "--tag", "nightly",
        ]))
        .unwrap();
        assert_eq!(config.run.pacer.base_delay, Duration::from_millis(200));
        assert_eq!(config.run.pacer.jitter_bound, Duration::from_millis(50));
        assert_eq!(config.run.pacer.batch_size, 6);
        assert_eq!(config.run.pacer.batch_pause, Duration::from_millis(1000));
        assert_eq!(config.run.pacer.cooldown_threshold, 3);
        assert_eq!(config.run.pacer.cooldown, Duration::from_millis(5000));
        assert_eq!(config.run.replicates, 4);
        assert_eq!(config.run.seed, Some(42));
        assert_eq!(config.run.tag, "nightly");
    }

    #[test]
    fn missing_value_is_reported_per_flag() {
        for flag in ["--worker", "--include", "--delay-ms", "--seed"] {
            let err = parse_args(&args(&[flag])).unwrap_err();
            assert!(err.contains(flag), "flag={flag} err={err}");
        }
    }

    #[test]
    fn non_numeric_values_rejected() {
        let err = parse_args(&args(&["--worker", "w", "--batch-size", "many"])).unwrap_err();
        assert!(err.contains("--batch-size"), "err={err}");
    }

    #[test]
    fn unknown_option_rejected() {
        let err = parse_args(&args(&["--worker", "w", "--concurrency", "8"])).unwrap_err();
        assert!(err.contains("unknown option"), "err={err}");
    }
}

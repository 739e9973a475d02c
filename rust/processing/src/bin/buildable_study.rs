// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: run a buildable-volume study from a JSON request
//!
//! Usage:
//!   buildable-study [input.json | -] [options]

use anyhow::{bail, Context, Result};
use buildable_processing::{run_batch, run_study, CliConfig, StudyRequest};
use std::env;
use std::fs;
use std::io::{self, Read, Write};

struct Options {
    input: Option<String>,
    output: Option<String>,
    pretty: bool,
    batch: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let options = parse_args(&args)?;

    let cli = CliConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_filter))
        .with_writer(io::stderr)
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.worker_threads)
        .build_global()
        .context("Failed to configure worker threads")?;

    let study_config = cli.study_config();
    study_config
        .shadow
        .validate()
        .context("Invalid shadow settings in environment")?;

    let input = read_input(options.input.as_deref())?;
    let json = if options.batch {
        let requests: Vec<StudyRequest> =
            serde_json::from_str(&input).context("Failed to parse batch request")?;
        let outcomes = run_batch(&requests, &study_config);
        to_json(&outcomes, options.pretty)?
    } else {
        let request: StudyRequest =
            serde_json::from_str(&input).context("Failed to parse study request")?;
        let report = run_study(&request, &study_config)
            .with_context(|| format!("Study failed for site {}", request.site.site_id))?;
        to_json(&report, options.pretty)?
    };

    match options.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Failed to write {path}"))?;
            tracing::info!(path = %path, "Report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write report")?;
        }
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        input: None,
        output: None,
        pretty: false,
        batch: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pretty" => options.pretty = true,
            "--batch" => options.batch = true,
            "--output" | "-o" => {
                let path = iter.next().context("--output needs a path")?;
                options.output = Some(path.clone());
            }
            other if other.starts_with("--") => bail!("Unknown option: {other}"),
            other => {
                if options.input.is_some() {
                    bail!("Only one input file may be given");
                }
                options.input = Some(other.to_string());
            }
        }
    }

    Ok(options)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            Ok(buffer)
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {path}")),
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize report")
}

fn print_usage() {
    eprintln!(
        "Usage: buildable-study [input.json | -] [options]

Reads a study request as JSON (stdin when no file is given) and writes the
study report as JSON.

Options:
  --batch          Input is an array of requests, evaluated in parallel
  --pretty         Pretty-print the JSON output
  -o, --output     Write the report to a file instead of stdout
  -h, --help       Show this help

Environment:
  BUILDABLE_WORKER_THREADS     Batch worker threads (default: CPU count)
  BUILDABLE_LOG                Log filter (default: {})
  BUILDABLE_LATITUDE           Shadow simulation latitude, degrees north
  BUILDABLE_SHADOW_STEP_HOURS  Shadow sampling interval, hours",
        buildable_processing::config::DEFAULT_LOG_FILTER
    );
}

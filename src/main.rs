// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use the_stagehand::config::{load_and_validate_config, NetConfig, Precision};
use the_stagehand::engine::Net;
use the_stagehand::traits::{Element, Solver};

const DEFAULT_STEPS: usize = 5;

/// What a run produced, printed at the end as text or JSON.
#[derive(Debug, Serialize)]
struct RunSummary {
    net: String,
    element: &'static str,
    layers: Vec<String>,
    outputs: Vec<String>,
    solver: Option<String>,
    iterations: usize,
    learning_rate: Option<f64>,
    last_output_shape: Vec<usize>,
    last_output_head: Vec<f64>,
    elapsed_ms: u128,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <config.yaml|config.toml> [steps] [--json]\n\
         Example: {program} configs/synthetic.yaml 10"
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "stagehand".to_string());
    let json = match args.iter().position(|arg| arg == "--json") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let Some(config_path) = args.get(1) else {
        bail!(usage(&program));
    };
    let steps = match args.get(2) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("steps must be a non-negative integer, got '{raw}'"))?,
        None => DEFAULT_STEPS,
    };

    let config = load_and_validate_config(config_path)
        .with_context(|| format!("loading {config_path}"))?;

    let summary = match config.precision {
        Precision::F32 => run::<f32>(&config, steps)?,
        Precision::F64 => run::<f64>(&config, steps)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Build the net and drive it: through the configured solver when there is one,
/// otherwise with `steps` plain forward passes.
fn run<T: Element>(config: &NetConfig, steps: usize) -> Result<RunSummary> {
    let started = Instant::now();
    let mut net = Net::<T>::from_config(config).context("building net")?;

    let mut solver = match &config.solver {
        Some(solver_config) => Some(
            T::solver_registry()
                .create(solver_config)
                .context("creating solver")?,
        ),
        None => None,
    };

    let (iterations, learning_rate) = match solver.as_mut() {
        Some(solver) => {
            let stats = solver.step(&mut net, steps).context("running solver")?;
            (stats.iterations, Some(stats.learning_rate))
        }
        None => {
            for _ in 0..steps {
                net.forward().context("forward pass")?;
            }
            (steps, None)
        }
    };

    // One more pass so the summary shows a batch the caller has not consumed yet.
    let (last_output_shape, last_output_head) = {
        let outputs = net.forward().context("forward pass")?;
        match outputs.first() {
            Some(blob) => (
                blob.shape().to_vec(),
                blob.data().iter().take(8).map(|v| v.to_f64()).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        }
    };

    let summary = RunSummary {
        net: net.name().to_string(),
        element: T::NAME,
        layers: net.layer_names().to_vec(),
        outputs: net.output_names().to_vec(),
        solver: solver.as_ref().map(|s| s.type_name().to_string()),
        iterations,
        learning_rate,
        last_output_shape,
        last_output_head,
        elapsed_ms: 0,
    };

    net.teardown().context("tearing down net")?;
    Ok(RunSummary {
        elapsed_ms: started.elapsed().as_millis(),
        ..summary
    })
}

fn print_summary(summary: &RunSummary) {
    println!("Net:        {} ({})", summary.net, summary.element);
    println!("Layers:     {}", summary.layers.join(" -> "));
    println!("Outputs:    {}", summary.outputs.join(", "));
    match (&summary.solver, summary.learning_rate) {
        (Some(solver), Some(lr)) => println!("Solver:     {solver}, {} iterations, lr = {lr}", summary.iterations),
        _ => println!("Forward:    {} passes", summary.iterations),
    }
    println!("Last batch: shape {:?}, head {:?}", summary.last_output_shape, summary.last_output_head);
    println!("Elapsed:    {} ms", summary.elapsed_ms);
}

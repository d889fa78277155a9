// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! reachpack CLI: runs one package's pending pairings end-to-end.

use anyhow::{Context, Result};
use clap::Parser;
use reachpack::{distance, PackageRunner};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "reachpack")]
#[command(author = "Vivian Voss <ask@vvoss.dev>")]
#[command(version = "0.1.0")]
#[command(about = "Per-package k-nearest-neighbor distance list engine", long_about = None)]
struct Cli {
    /// Path to the package descriptor.
    #[arg(long = "app-in")]
    app_in: PathBuf,

    /// Neighbor-list capacity per point.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    maxk: u32,

    /// Distance function: euclidean, manhattan, or cosine.
    #[arg(long)]
    reachdistfunction: String,

    /// Use a worker pool sized to the available cores instead of one.
    #[arg(long)]
    multithreading: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("reachpack: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let distance_fn = distance::by_name(&cli.reachdistfunction).with_context(|| {
        format!(
            "unknown distance function {:?} (expected euclidean, manhattan, or cosine)",
            cli.reachdistfunction
        )
    })?;

    let metrics = PackageRunner::run(
        &cli.app_in,
        cli.maxk as usize,
        distance_fn.as_ref(),
        cli.multithreading,
    )
    .with_context(|| format!("package run failed for {}", cli.app_in.display()))?;

    println!(
        "completed {} pairings, {} total left-side items scanned",
        metrics.pairings_completed(),
        metrics.total_items()
    );
    Ok(())
}

// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `dwg2svg` command-line front end.
//!
//! Thin: parse args, wire up a `tracing` subscriber, call into the library,
//! map the result to a process exit code. The library itself never installs
//! a subscriber, so embedding it in a larger program never fights over
//! global logging state.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;

/// Render a DWG/DXF drawing to SVG.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Drawing file to render.
    dwgfile: PathBuf,

    /// Write SVG here instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Render model space even if a paper-space layout is present.
    #[arg(long)]
    mspace: bool,

    /// Accepted and ignored: the historical tool used this to skip its own
    /// `dwg_free` cleanup pass on exit, which has no analogue here.
    #[arg(long)]
    force_free: bool,

    /// Increase log verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn level_filter(verbosity: u8) -> tracing::level_filters::LevelFilter {
    match verbosity {
        0 => tracing::level_filters::LevelFilter::WARN,
        1 => tracing::level_filters::LevelFilter::INFO,
        2 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    }
}

fn run(args: &Args) -> dwg2svg::Result<()> {
    match &args.output {
        Some(out) => dwg2svg::write_svg(&args.dwgfile, out, args.mspace),
        None => {
            let svg = dwg2svg::to_svg(&args.dwgfile, args.mspace)?;
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(svg.as_bytes()).map_err(dwg2svg::Error::Write)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level_filter(args.verbose).into())
                .from_env_lossy(),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_monotonically() {
        assert_eq!(level_filter(0), tracing::level_filters::LevelFilter::WARN);
        assert_eq!(level_filter(9), tracing::level_filters::LevelFilter::TRACE);
    }
}

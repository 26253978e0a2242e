//! Command-line harness driving the buffer through its public operations.
//!
//! The library has no CLI surface of its own; this binary exists to exercise
//! it — load a capture and print its window statistics, or stream a
//! synthetic signal the way a live producer would.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::buffer::SampleBuffer;
use crate::range::{IndexRange, ValueRange};
use crate::spike::DetectorConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load samples from a file and print window statistics
    Stats {
        /// Input file: JSON array of floats, or whitespace-separated floats
        #[arg(long)]
        input: PathBuf,

        /// Buffer capacity; defaults to the number of input samples
        #[arg(long)]
        capacity: Option<usize>,

        /// Restrict the query to the last N live samples
        #[arg(long)]
        window: Option<u64>,

        /// Sampling stride for the scans
        #[arg(long, default_value_t = 1)]
        step: u64,

        /// Optional detector tuning as JSON, e.g. '{"threshold": 0.1}'
        #[arg(long)]
        detector: Option<String>,

        /// Emit the report as JSON instead of plain text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Stream a synthetic gated sine signal and print sliding-window stats
    Demo {
        /// Buffer capacity
        #[arg(long, default_value_t = 1000)]
        capacity: usize,

        /// Total samples to produce
        #[arg(long, default_value_t = 5000)]
        samples: usize,

        /// Width of the sliding query window
        #[arg(long, default_value_t = 250)]
        window: u64,

        /// Sampling stride for the scans
        #[arg(long, default_value_t = 4)]
        step: u64,
    },
}

/// Statistics over one query window, serialisable for downstream tooling.
#[derive(Serialize)]
struct StatsReport {
    capacity: usize,
    count: usize,
    overwritten: u64,
    value_range: ValueRange,
    average: f32,
    spikes: Vec<u64>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats {
            input,
            capacity,
            window,
            step,
            detector,
            json,
        } => stats(input, capacity, window, step, detector, json),
        Commands::Demo {
            capacity,
            samples,
            window,
            step,
        } => demo(capacity, samples, window, step),
    }
}

fn stats(
    input: PathBuf,
    capacity: Option<usize>,
    window: Option<u64>,
    step: u64,
    detector: Option<String>,
    json: bool,
) -> Result<()> {
    let contents = fs::read_to_string(&input)?;
    let samples: Vec<f32> = serde_json::from_str(&contents)
        .or_else(|_| {
            contents
                .split_whitespace()
                .map(|s| s.parse::<f32>())
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .map_err(|_| {
            anyhow::anyhow!(
                "failed to parse {:?} as a JSON array of floats or whitespace-separated floats",
                input
            )
        })?;

    let config = match detector {
        Some(text) => serde_json::from_str::<DetectorConfig>(&text)?,
        None => DetectorConfig::default(),
    };

    let capacity = capacity.unwrap_or(samples.len().max(1));
    let buffer = SampleBuffer::with_config(capacity, config)?;
    buffer.load(&samples, true);

    let live = buffer.range();
    let query = match window {
        Some(n) if !live.is_empty() => {
            IndexRange::new(live.max().saturating_sub(n.saturating_sub(1)), live.max())
        }
        _ => live,
    };

    let report = StatsReport {
        capacity: buffer.capacity(),
        count: buffer.count(),
        overwritten: buffer.count_overwritten(),
        value_range: buffer.get_value_range(query, step),
        average: buffer.get_average(query, step),
        spikes: buffer.spikes(query),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} samples live of {} pushed (capacity {})",
            report.count,
            report.overwritten + report.count as u64,
            report.capacity
        );
        println!(
            "window {:?}..{:?} step {}: min {} max {} average {}",
            query.min(),
            query.max(),
            step,
            report.value_range.min(),
            report.value_range.max(),
            report.average
        );
        if report.spikes.is_empty() {
            println!("no turning points in window");
        } else {
            println!("turning points at absolute indices {:?}", report.spikes);
        }
    }
    Ok(())
}

/// Gated rectified sine, modelled on the classic two-variable demo: a square
/// gate at twice the base frequency switching a |10·sin| lobe on and off.
fn demo_signal(i: usize, rate: f32) -> f32 {
    let freq = 2.0;
    let t = i as f32 / rate;

    let gate_phase = (t * 2.0 * freq).fract();
    if gate_phase > 0.6 {
        return 0.0;
    }
    let psi = (t * freq).fract() * 2.0 * std::f32::consts::PI;
    (10.0 * psi.sin()).abs()
}

fn demo(capacity: usize, samples: usize, window: u64, step: u64) -> Result<()> {
    let buffer = SampleBuffer::new(capacity)?;
    let rate = 100.0;
    let report_every = (window / 2).max(1) as usize;

    println!(
        "streaming {} samples into a buffer of capacity {}...",
        samples, capacity
    );
    for i in 0..samples {
        buffer.push(demo_signal(i, rate), true);

        if i % report_every == 0 && i > 0 {
            let live = buffer.range();
            let query = IndexRange::new(live.max().saturating_sub(window - 1), live.max());
            let range = buffer.get_value_range(query, step);
            let average = buffer.get_average(query, step);
            // Track the detector reference against the observed magnitude,
            // the way a renderer recalibrates it per frame.
            buffer.set_spike_noise_floor(range.center());
            println!(
                "t={:7.2}s live={:5} evicted={:6}  min={:6.2} max={:6.2} avg={:6.2}",
                i as f32 / rate,
                buffer.count(),
                buffer.count_overwritten(),
                range.min(),
                range.max(),
                average
            );
        }
    }

    let spikes = buffer.spikes(buffer.range());
    println!(
        "{} turning points recorded in the final window (spike ring capacity {})",
        spikes.len(),
        buffer.spike_capacity()
    );
    Ok(())
}

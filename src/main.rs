//! Disruption - Diode Clipping Distortion
//!
//! Runs raw PCM through the distortion pedal model.
//!
//! # Usage
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 1 -ar 44100 - | disruption --drive 0.8 | ffmpeg -f f32le -ac 1 -ar 44100 -i - output.wav
//! ```

use clap::Parser;
use disruption_core::{
    audio::process_audio,
    error::Result,
    ProcessSpec, Processor, ProcessorConfig, DEFAULT_SAMPLE_RATE,
};
use log::info;

/// Diode clipping distortion pedal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sample rate in Hz
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: f32,

    /// Interleaved channels in the stream
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    channels: u8,

    /// Frames per processing block
    #[arg(short, long, default_value_t = 256)]
    block_size: usize,

    /// Distortion knob, 0 to 1
    #[arg(short, long, default_value_t = 0.5)]
    drive: f32,

    /// Output level knob, 0 to 1
    #[arg(short, long, default_value_t = 0.5)]
    level: f32,

    /// Engage the tremolo and chorus
    #[arg(long)]
    tremolo: bool,

    /// Tremolo rate in Hz
    #[arg(long, default_value_t = 2.0)]
    tremolo_rate: f32,

    /// Pass the input through unprocessed
    #[arg(long)]
    bypass: bool,

    /// Maximum Newton-Raphson iterations per sample
    #[arg(long, default_value_t = disruption_core::stages::MAX_ITERATIONS)]
    max_iterations: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ProcessorConfig::new().with_max_iterations(args.max_iterations);
    let mut processor = Processor::new(config);
    processor.prepare(ProcessSpec::new(
        f64::from(args.sample_rate),
        args.block_size,
        usize::from(args.channels),
    ))?;

    let params = processor.parameters();
    params.set_drive(args.drive);
    params.set_level(args.level);
    params.set_tremolo_rate(args.tremolo_rate);
    params.set_tremolo_on(args.tremolo);
    params.set_bypass(args.bypass);

    let frames = process_audio(&mut processor)?;

    let stats = processor.convergence_stats();
    info!(
        "processed {} frames; clipping solver: {} samples, mean {:.2} iterations, max {}, {} unconverged",
        frames,
        stats.samples(),
        stats.mean_iterations(),
        stats.max_iterations().unwrap_or(0),
        stats.unconverged()
    );

    Ok(())
}

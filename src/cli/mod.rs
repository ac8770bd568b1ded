//! CLI Module
//!
//! Command-line interface for the databend renderer.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{EncodingAlgorithm, ParameterType};

/// Databend - glitch images by running their bytes through audio effects
#[derive(Parser, Debug)]
#[command(name = "databend")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a single glitched frame
    #[command(name = "render")]
    Render {
        /// Source image (BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the rendered image
        #[arg(short, long)]
        output: PathBuf,

        /// Effect settings as inline JSON or a path to a JSON file
        #[arg(short, long)]
        settings: String,

        /// Companding table (mu-law or a-law)
        #[arg(short, long)]
        codec: Option<EncodingAlgorithm>,

        /// Render configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render two keyframes and the transition between them
    #[command(name = "animate")]
    Animate(AnimateArgs),

    /// Print the amplitude envelope of a WAV file as JSON
    #[command(name = "envelope")]
    Envelope {
        /// Source audio (WAV)
        #[arg(short, long)]
        audio: PathBuf,

        /// Envelope values per second
        #[arg(long)]
        fps: Option<f64>,

        /// Moving-average window in samples
        #[arg(short, long)]
        window: Option<usize>,

        /// Render configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct AnimateArgs {
    /// Source image (BMP)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving image0000.bmp, image0001.bmp, ...
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Settings of the first keyframe (inline JSON or file)
    #[arg(long)]
    pub start: String,

    /// Settings of the last keyframe (inline JSON or file)
    #[arg(long)]
    pub end: String,

    /// Frames in the transition
    #[arg(short, long)]
    pub frames: Option<usize>,

    /// Audio driving one parameter per frame
    #[arg(short, long)]
    pub audio: Option<PathBuf>,

    /// Parameter the audio envelope is added to
    #[arg(long, default_value = "amp")]
    pub link: ParameterType,

    /// Scale applied to the envelope
    #[arg(long)]
    pub amount: Option<f64>,

    /// Companding table (mu-law or a-law)
    #[arg(short, long)]
    pub codec: Option<EncodingAlgorithm>,

    /// Render configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

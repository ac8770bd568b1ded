//! Databend - Image Glitching Through Audio Effects
//!
//! Image bytes are reinterpreted as companded audio, run through an audio
//! effect, and re-encoded into an image. Sequences of such frames animate
//! between two effect settings, optionally driven by an audio envelope.
//!
//! # Architecture
//!
//! - `dsp`: effects (amplitude modulation, delay, shuffle) and the signal
//!   processor that applies them past the image header
//! - `engine`: codec, frame renderer, interpolation, envelope extraction
//!   and the background render worker
//! - `state`: keyframes, transition framebanks, frame storage and the
//!   timeline
//! - `cli`: the `databend` command-line interface

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod state;

pub use config::RenderConfig;
pub use error::{DatabendError, Result};

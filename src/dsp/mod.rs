//! DSP Effects Library
//!
//! The three effects image bytes are run through once decoded to samples.
//! All effects implement the `Effect` trait and are selected by the
//! `EffectSettings` sum type.

mod amp_mod;
mod delay;
mod effect;
mod processor;
mod shuffle;

pub use effect::{AmpModSettings, DelaySettings, Effect, EffectSettings, ShuffleSettings};
pub use processor::{process, HEADER_LENGTH};
pub use shuffle::segment_order;

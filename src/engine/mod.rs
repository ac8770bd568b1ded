//! Render Engine Module
//!
//! Core rendering pipeline:
//! - Companding codec between image bytes and samples
//! - Audio envelope extraction and WAV input
//! - Animation interpolation
//! - Frame rendering and the background render worker

pub mod audio;
pub mod codec;
pub mod envelope;
pub mod interpolate;
pub mod renderer;

pub use audio::{load_wav, AudioClip};
pub use codec::{decode, encode, EncodingAlgorithm};
pub use envelope::{envelope_value_at, extract};
pub use interpolate::{frame_settings, progress_at, AudioLink, ParameterType};
pub use renderer::{
    render_animation, render_frame, AnimationRequest, RenderRequest, RenderResponse,
    RenderTicket, RenderWorker, RenderedFrame, RequestId,
};

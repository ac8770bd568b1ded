//! Timeline
//!
//! Owns the keyframes and one transition framebank per adjacent keyframe
//! pair. All mutation goes through methods on [`Timeline`]; callers observe
//! transitions through immutable [`TransitionSnapshot`]s.
//!
//! Transitions are keyed by the ids of the two keyframes they join. After
//! any insert, removal or reorder the pairs are re-derived: a pair that
//! still exists keeps its framebank, a pair that disappeared has its frames
//! disposed, and a new pair starts pending.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::dsp::EffectSettings;
use crate::engine::{
    AnimationRequest, AudioLink, EncodingAlgorithm, RenderRequest, RenderResponse, RenderWorker,
};
use crate::error::{DatabendError, Result};
use crate::state::export::{write_frames, ExportFrame};
use crate::state::framebank::{Status, TransitionFrame, TransitionFramebank};
use crate::state::keyframe::KeyFrame;
use crate::state::storage::FrameStore;

/// Immutable view of one transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionSnapshot {
    pub index: usize,
    pub from: Uuid,
    pub to: Uuid,
    pub status: Status,
    pub progress: f64,
    pub frame_count: usize,
    pub total_frames: usize,
}

#[derive(Debug)]
struct Transition {
    from: Uuid,
    to: Uuid,
    bank: TransitionFramebank,
}

/// Keyframes and the transitions between them
pub struct Timeline {
    keyframes: Vec<KeyFrame>,
    transitions: Vec<Transition>,
    store: Arc<dyn FrameStore>,
}

impl Timeline {
    /// Create an empty timeline persisting transition frames to `store`
    pub fn new(store: Arc<dyn FrameStore>) -> Self {
        Self {
            keyframes: Vec::new(),
            transitions: Vec::new(),
            store,
        }
    }

    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    // ========================================================================
    // Keyframe editing
    // ========================================================================

    /// Append a keyframe, returning its index
    pub fn push_keyframe(&mut self, keyframe: KeyFrame) -> Result<usize> {
        self.keyframes.push(keyframe);
        self.relink()?;
        Ok(self.keyframes.len() - 1)
    }

    /// Insert a keyframe at `index`
    pub fn insert_keyframe(&mut self, index: usize, keyframe: KeyFrame) -> Result<()> {
        if index > self.keyframes.len() {
            return Err(DatabendError::IndexOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        self.keyframes.insert(index, keyframe);
        self.relink()
    }

    /// Remove the keyframe at `index`
    pub fn remove_keyframe(&mut self, index: usize) -> Result<KeyFrame> {
        self.check_keyframe(index)?;
        let keyframe = self.keyframes.remove(index);
        self.relink()?;
        Ok(keyframe)
    }

    /// Move the keyframe at `from` so it ends up at index `to`
    pub fn move_keyframe(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_keyframe(from)?;
        self.check_keyframe(to)?;
        let keyframe = self.keyframes.remove(from);
        self.keyframes.insert(to, keyframe);
        self.relink()
    }

    fn check_keyframe(&self, index: usize) -> Result<()> {
        if index >= self.keyframes.len() {
            return Err(DatabendError::IndexOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        Ok(())
    }

    /// Re-derive transitions from the current keyframe order
    fn relink(&mut self) -> Result<()> {
        let mut old = std::mem::take(&mut self.transitions);
        let mut transitions = Vec::with_capacity(self.keyframes.len().saturating_sub(1));

        for pair in self.keyframes.windows(2) {
            let (from, to) = (pair[0].id(), pair[1].id());
            let transition = match old.iter().position(|t| t.from == from && t.to == to) {
                Some(pos) => old.swap_remove(pos),
                None => {
                    debug!("new transition {} -> {}", from, to);
                    Transition {
                        from,
                        to,
                        bank: TransitionFramebank::new(),
                    }
                }
            };
            transitions.push(transition);
        }
        self.transitions = transitions;

        let mut first_error = None;
        for mut stale in old {
            debug!("invalidating transition {} -> {}", stale.from, stale.to);
            if let Err(e) = stale.bank.clear() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Transition state
    // ========================================================================

    fn check_transition(&self, index: usize) -> Result<()> {
        if index >= self.transitions.len() {
            return Err(DatabendError::IndexOutOfRange {
                index,
                len: self.transitions.len(),
            });
        }
        Ok(())
    }

    /// Snapshot of transition `index`
    pub fn snapshot(&self, index: usize) -> Result<TransitionSnapshot> {
        self.check_transition(index)?;
        let transition = &self.transitions[index];
        Ok(TransitionSnapshot {
            index,
            from: transition.from,
            to: transition.to,
            status: transition.bank.status(),
            progress: transition.bank.progress(),
            frame_count: transition.bank.frames().len(),
            total_frames: transition.bank.total_frames(),
        })
    }

    /// Snapshots of every transition in order
    pub fn snapshots(&self) -> Vec<TransitionSnapshot> {
        (0..self.transitions.len())
            .filter_map(|i| self.snapshot(i).ok())
            .collect()
    }

    /// Apply `update` to transition `index` and return its new snapshot
    pub fn update_transition<F>(&mut self, index: usize, update: F) -> Result<TransitionSnapshot>
    where
        F: FnOnce(&mut TransitionFramebank) -> Result<()>,
    {
        self.check_transition(index)?;
        update(&mut self.transitions[index].bank)?;
        self.snapshot(index)
    }

    /// Whether any transition is currently rendering
    pub fn any_rendering(&self) -> bool {
        self.transitions.iter().any(|t| t.bank.is_rendering())
    }

    /// Refuse a destructive operation while any transition renders
    pub fn ensure_idle(&self, operation: &'static str) -> Result<()> {
        if self.any_rendering() {
            warn!("refusing to {}: a transition is rendering", operation);
            return Err(DatabendError::RenderInProgress { operation });
        }
        Ok(())
    }

    /// Discard the frames of transition `index` so it can be rendered again
    pub fn rerender_transition(&mut self, index: usize) -> Result<TransitionSnapshot> {
        self.update_transition(index, |bank| {
            if bank.is_rendering() {
                return Err(DatabendError::RenderInProgress {
                    operation: "re-render transition",
                });
            }
            bank.clear()
        })
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render `source` with `settings` and append the result as a keyframe
    pub fn render_keyframe(
        &mut self,
        worker: &RenderWorker,
        source: &[u8],
        settings: EffectSettings,
        codec: EncodingAlgorithm,
    ) -> Result<usize> {
        if source.is_empty() {
            return Err(DatabendError::MissingInput {
                what: "source image".to_string(),
            });
        }
        settings.validate()?;

        let ticket = worker.submit(RenderRequest::RenderFrame {
            buffer: source.to_vec(),
            settings,
            encoding_algorithm: codec,
        })?;
        let output = ticket.wait_frame()?;
        self.push_keyframe(KeyFrame::new(output, settings))
    }

    /// Render transition `index` between its two keyframes
    ///
    /// Each frame is persisted and handed to the framebank as it arrives.
    /// Inputs are checked before the framebank is touched; a failure part way
    /// through clears the framebank.
    pub fn render_transition(
        &mut self,
        index: usize,
        worker: &RenderWorker,
        source: &[u8],
        frame_count: usize,
        codec: EncodingAlgorithm,
        audio_link: AudioLink,
    ) -> Result<TransitionSnapshot> {
        self.check_transition(index)?;
        let request = AnimationRequest {
            buffer: source.to_vec(),
            frame_count,
            first_frame_settings: *self.keyframes[index].settings(),
            last_frame_settings: *self.keyframes[index + 1].settings(),
            encoding_algorithm: codec,
            audio_link,
        };
        request.validate()?;

        self.update_transition(index, |bank| bank.start_render(frame_count))?;
        info!("Rendering transition {} ({} frames)", index, frame_count);

        match self.pump_transition(index, worker, request) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!("transition {} failed: {}", index, e);
                if let Err(clear_err) = self.transitions[index].bank.clear() {
                    warn!("failed to clear transition {}: {}", index, clear_err);
                }
                Err(e)
            }
        }
    }

    fn pump_transition(
        &mut self,
        index: usize,
        worker: &RenderWorker,
        request: AnimationRequest,
    ) -> Result<TransitionSnapshot> {
        let ticket = worker.submit(RenderRequest::RenderAnimation(request))?;
        let store = self.store.clone();

        for response in ticket.responses() {
            match response {
                RenderResponse::Frame {
                    frame_index,
                    frame,
                    settings,
                    ..
                } => {
                    let frame = TransitionFrame::new(store.clone(), &frame, frame_index, settings)?;
                    self.transitions[index].bank.receive_frame(frame)?;
                }
                RenderResponse::Progress { progress, .. } => {
                    self.transitions[index].bank.set_progress(progress)?;
                }
                RenderResponse::Done { frames, .. } => {
                    debug!("transition {} received {} frames", index, frames);
                    return self.update_transition(index, |bank| bank.complete());
                }
                RenderResponse::Failed { code, message, .. } => {
                    return Err(DatabendError::RenderFailed {
                        reason: format!("{}: {}", code, message),
                    });
                }
                RenderResponse::RenderFrame { .. } => {
                    warn!("unexpected single-frame response during transition render");
                }
            }
        }

        Err(DatabendError::WorkerUnavailable {
            reason: format!("request {} ended without a terminal response", ticket.id().0),
        })
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Every frame in playback order: keyframe 0, transition 0, keyframe 1...
    fn export_order(&self) -> Vec<ExportFrame<'_>> {
        let mut frames = Vec::new();
        for (i, keyframe) in self.keyframes.iter().enumerate() {
            frames.push(ExportFrame::Key(keyframe));
            if let Some(transition) = self.transitions.get(i) {
                frames.extend(transition.bank.frames().iter().map(ExportFrame::Transition));
            }
        }
        frames
    }

    /// Write every frame to `dir` as numbered bitmaps
    pub fn export_frames(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.ensure_idle("export frames")?;
        write_frames(dir, &self.export_order())
    }

    /// Stream every frame in order to an external GIF encoder
    ///
    /// Returns the number of frames delivered.
    pub fn gif_frames<F>(&self, mut sink: F) -> Result<usize>
    where
        F: FnMut(usize, Vec<u8>) -> Result<()>,
    {
        self.ensure_idle("export GIF")?;
        let frames = self.export_order();
        for (i, frame) in frames.iter().enumerate() {
            sink(i, frame.load()?)?;
        }
        Ok(frames.len())
    }

    /// Destroy every keyframe and dispose every transition frame
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_idle("clear timeline")?;

        let mut first_error = None;
        for mut transition in self.transitions.drain(..) {
            if let Err(e) = transition.bank.clear() {
                first_error.get_or_insert(e);
            }
        }
        for keyframe in self.keyframes.drain(..) {
            keyframe.destroy();
        }
        info!("Timeline cleared");
        first_error.map_or(Ok(()), Err)
    }
}

//! Transition Framebank
//!
//! Holds the frames rendered for one transition together with its render
//! status and progress. Frames themselves live in a [`FrameStore`]; the bank
//! only keeps their handles, so memory stays flat however long the
//! transition is.
//!
//! State machine:
//! - `Pending` (initial) → `Rendering` via `start_render`
//! - `Complete` → `Rendering` via `start_render` (re-render)
//! - `Rendering` → `Complete` via `complete`
//! - any state → `Pending` via `clear`
//!
//! [`FrameStore`]: crate::state::storage::FrameStore

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dsp::EffectSettings;
use crate::error::{DatabendError, Result};
use crate::state::storage::{FrameStore, StoredFrame};

/// Render status of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Rendering,
    Complete,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Rendering => write!(f, "rendering"),
            Status::Complete => write!(f, "complete"),
        }
    }
}

/// One persisted frame of a transition
#[derive(Debug)]
pub struct TransitionFrame {
    stored: StoredFrame,
    pub frame_index: usize,
    pub settings: EffectSettings,
    pub created_at: DateTime<Utc>,
}

impl TransitionFrame {
    /// Persist `bytes` and wrap the handle
    pub fn new(
        store: Arc<dyn FrameStore>,
        bytes: &[u8],
        frame_index: usize,
        settings: EffectSettings,
    ) -> Result<Self> {
        Ok(Self {
            stored: StoredFrame::put(store, bytes)?,
            frame_index,
            settings,
            created_at: Utc::now(),
        })
    }

    /// Storage id of this frame
    pub fn id(&self) -> &str {
        self.stored.id()
    }

    /// Read the frame bytes back from storage
    pub fn load(&self) -> Result<Vec<u8>> {
        self.stored.load()
    }

    /// Release the persisted bytes
    pub fn dispose(self) -> Result<()> {
        self.stored.dispose()
    }
}

/// Frames and render state of one transition
#[derive(Debug, Default)]
pub struct TransitionFramebank {
    status: Status,
    progress: f64,
    frames: Vec<TransitionFrame>,
    total_frames: usize,
}

impl TransitionFramebank {
    /// Create an empty, pending bank
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn frames(&self) -> &[TransitionFrame] {
        &self.frames
    }

    /// Frame count requested by the current or last render
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn is_rendering(&self) -> bool {
        self.status == Status::Rendering
    }

    fn require(&self, allowed: &[Status], operation: &'static str) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DatabendError::InvalidTransition {
                from: self.status.to_string(),
                operation,
            })
        }
    }

    /// Begin rendering `total_frames` frames
    ///
    /// Frames left over from a previous render are disposed first. If one of
    /// them cannot be deleted the bank is reset to pending and the error
    /// returned.
    pub fn start_render(&mut self, total_frames: usize) -> Result<()> {
        self.require(&[Status::Pending, Status::Complete], "start render")?;
        if let Err(e) = self.dispose_frames() {
            self.status = Status::Pending;
            self.progress = 0.0;
            self.total_frames = 0;
            return Err(e);
        }
        self.status = Status::Rendering;
        self.progress = 0.0;
        self.total_frames = total_frames;
        debug!("framebank rendering {} frames", total_frames);
        Ok(())
    }

    /// Append a rendered frame
    pub fn receive_frame(&mut self, frame: TransitionFrame) -> Result<()> {
        self.require(&[Status::Rendering], "receive frame")?;
        if self.frames.len() >= self.total_frames {
            return Err(DatabendError::FramebankFull {
                total_frames: self.total_frames,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Record render progress
    ///
    /// Values are clamped to [0, 1]; a value below the current progress is
    /// ignored.
    pub fn set_progress(&mut self, progress: f64) -> Result<()> {
        self.require(&[Status::Rendering], "set progress")?;
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        if progress < self.progress {
            warn!(
                "ignoring progress regression {:.3} -> {:.3}",
                self.progress, progress
            );
            return Ok(());
        }
        self.progress = progress;
        Ok(())
    }

    /// Finish rendering
    pub fn complete(&mut self) -> Result<()> {
        self.require(&[Status::Rendering], "complete")?;
        self.status = Status::Complete;
        self.progress = 1.0;
        Ok(())
    }

    /// Dispose every frame and return to pending
    ///
    /// The bank is reset even if a delete fails; the first failure is
    /// returned.
    pub fn clear(&mut self) -> Result<()> {
        let result = self.dispose_frames();
        self.status = Status::Pending;
        self.progress = 0.0;
        self.total_frames = 0;
        result
    }

    fn dispose_frames(&mut self) -> Result<()> {
        let mut first_error = None;
        for frame in self.frames.drain(..) {
            if let Err(e) = frame.dispose() {
                warn!("failed to dispose transition frame: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

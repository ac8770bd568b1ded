//! Keyframes
//!
//! A keyframe is one user-authored rendered frame anchoring the end of a
//! transition. Keyframes stay resident; only transition frames go to the
//! frame store.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dsp::EffectSettings;

/// Presentation-side resource showing a keyframe (a texture, an object URL)
///
/// Released exactly once when its keyframe is destroyed.
pub trait DisplayHandle: Send {
    fn release(self: Box<Self>);
}

/// One rendered keyframe
pub struct KeyFrame {
    id: Uuid,
    bytes: Vec<u8>,
    settings: EffectSettings,
    created_at: DateTime<Utc>,
    display: Option<Box<dyn DisplayHandle>>,
}

impl KeyFrame {
    pub fn new(bytes: Vec<u8>, settings: EffectSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes,
            settings,
            created_at: Utc::now(),
            display: None,
        }
    }

    /// Attach a display handle, releasing any previous one
    pub fn with_display(mut self, handle: Box<dyn DisplayHandle>) -> Self {
        self.release_display();
        self.display = Some(handle);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Destroy the keyframe, releasing its display handle
    pub fn destroy(mut self) {
        self.release_display();
    }

    fn release_display(&mut self) {
        if let Some(handle) = self.display.take() {
            handle.release();
        }
    }
}

impl fmt::Debug for KeyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFrame")
            .field("id", &self.id)
            .field("bytes", &self.bytes.len())
            .field("settings", &self.settings)
            .field("created_at", &self.created_at)
            .field("display", &self.display.is_some())
            .finish()
    }
}

impl Drop for KeyFrame {
    fn drop(&mut self) {
        self.release_display();
    }
}

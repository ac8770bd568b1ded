//! State Management Module
//!
//! Keyframes, transition framebanks, frame storage, the timeline that ties
//! them together, and frame export.

pub mod export;
pub mod framebank;
pub mod keyframe;
pub mod storage;
pub mod timeline;

pub use export::{export_file_name, write_frames, ExportFrame, EXPORT_BATCH_SIZE};
pub use framebank::{Status, TransitionFrame, TransitionFramebank};
pub use keyframe::{DisplayHandle, KeyFrame};
pub use storage::{DiskFrameStore, FrameStore, MemoryFrameStore, StoredFrame};
pub use timeline::{Timeline, TransitionSnapshot};

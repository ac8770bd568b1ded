//! Frame export
//!
//! Writes timeline frames to a directory as `image0000.bmp`,
//! `image0001.bmp`, ... Frames are loaded and written in batches of
//! [`EXPORT_BATCH_SIZE`], and each batch is released before the next one
//! is read.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;
use crate::state::framebank::TransitionFrame;
use crate::state::keyframe::KeyFrame;

/// Frames held in memory at once while exporting
pub const EXPORT_BATCH_SIZE: usize = 10;

/// File name for the frame at `index` in timeline order
pub fn export_file_name(index: usize) -> String {
    format!("image{:04}.bmp", index)
}

/// A frame in timeline export order
#[derive(Debug, Clone, Copy)]
pub enum ExportFrame<'a> {
    Key(&'a KeyFrame),
    Transition(&'a TransitionFrame),
}

impl ExportFrame<'_> {
    /// Frame bytes, read from storage for transition frames
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            ExportFrame::Key(keyframe) => Ok(keyframe.bytes().to_vec()),
            ExportFrame::Transition(frame) => frame.load(),
        }
    }
}

/// Write `frames` into `dir`, returning the written paths in order
pub fn write_frames(dir: &Path, frames: &[ExportFrame<'_>]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(frames.len());
    for (batch_index, batch) in frames.chunks(EXPORT_BATCH_SIZE).enumerate() {
        let first = batch_index * EXPORT_BATCH_SIZE;
        let loaded = batch
            .iter()
            .map(|frame| frame.load())
            .collect::<Result<Vec<_>>>()?;

        for (offset, bytes) in loaded.into_iter().enumerate() {
            let path = dir.join(export_file_name(first + offset));
            fs::write(&path, bytes)?;
            written.push(path);
        }
        debug!(
            "exported batch {} (frames {}..{})",
            batch_index,
            first,
            first + batch.len()
        );
    }

    info!("Exported {} frames to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::EffectSettings;
    use crate::state::storage::MemoryFrameStore;
    use std::sync::Arc;

    #[test]
    fn test_file_names() {
        assert_eq!(export_file_name(0), "image0000.bmp");
        assert_eq!(export_file_name(42), "image0042.bmp");
        assert_eq!(export_file_name(12345), "image12345.bmp");
    }

    #[test]
    fn test_write_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryFrameStore::new());

        let keyframe = KeyFrame::new(vec![0xAA; 4], EffectSettings::default());
        let transition: Vec<TransitionFrame> = (0..12)
            .map(|i| {
                TransitionFrame::new(store.clone(), &[i as u8; 4], i, EffectSettings::default())
                    .unwrap()
            })
            .collect();

        let mut frames = vec![ExportFrame::Key(&keyframe)];
        frames.extend(transition.iter().map(ExportFrame::Transition));

        let written = write_frames(dir.path(), &frames).unwrap();
        assert_eq!(written.len(), 13);
        assert_eq!(written[12], dir.path().join("image0012.bmp"));
        assert_eq!(fs::read(&written[0]).unwrap(), vec![0xAA; 4]);
        assert_eq!(fs::read(&written[11]).unwrap(), vec![10u8; 4]);
    }
}

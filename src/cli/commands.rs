//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::cli::AnimateArgs;
use crate::config::RenderConfig;
use crate::dsp::EffectSettings;
use crate::engine::{extract, load_wav, AudioLink, EncodingAlgorithm, RenderRequest, RenderWorker};
use crate::error::{DatabendError, Result};
use crate::state::{DiskFrameStore, Timeline};

/// Directory under the output folder holding transition frames mid-render
const FRAME_STORE_DIR: &str = ".frames";

/// Load the config file if given, otherwise defaults
pub fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => {
            info!("Loading config: {}", path.display());
            RenderConfig::load(path)
        }
        None => Ok(RenderConfig::default()),
    }
}

/// Parse effect settings from inline JSON or a JSON file
pub fn parse_settings(arg: &str) -> Result<EffectSettings> {
    let trimmed = arg.trim();
    let json = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        fs::read_to_string(trimmed).map_err(|e| DatabendError::FileNotFound {
            path: trimmed.to_string(),
            source: Some(e),
        })?
    };
    let settings: EffectSettings = serde_json::from_str(&json)?;
    settings.validate()?;
    Ok(settings)
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|e| DatabendError::FileNotFound {
        path: path.display().to_string(),
        source: Some(e),
    })?;
    if bytes.is_empty() {
        return Err(DatabendError::MissingInput {
            what: format!("image data in {}", path.display()),
        });
    }
    Ok(bytes)
}

/// Render one frame and write it to `output`.
pub fn render(
    input: &Path,
    output: &Path,
    settings: &str,
    codec: Option<EncodingAlgorithm>,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let codec = codec.unwrap_or(config.encoding);
    let settings = parse_settings(settings)?;
    let source = read_source(input)?;

    info!(
        "Rendering {} with {} ({})",
        input.display(),
        settings.effect_type(),
        codec
    );

    let worker = RenderWorker::spawn(config.queue_capacity)?;
    let ticket = worker.submit(RenderRequest::RenderFrame {
        buffer: source,
        settings,
        encoding_algorithm: codec,
    })?;
    let frame = ticket.wait_frame()?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, &frame)?;

    println!("Rendered: {} ({} bytes)", output.display(), frame.len());
    Ok(())
}

/// Render start and end keyframes plus the transition, then export every
/// frame to the output directory.
pub fn animate(args: &AnimateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let codec = args.codec.unwrap_or(config.encoding);
    let frames = args.frames.unwrap_or(config.frames_per_transition);
    let start = parse_settings(&args.start)?;
    let end = parse_settings(&args.end)?;
    let source = read_source(&args.input)?;

    let audio_link = match &args.audio {
        Some(path) => {
            let clip = load_wav(path)?;
            let values = extract(
                &clip.samples,
                config.smoothing_window,
                config.frame_rate,
                clip.sample_rate as f64,
            );
            info!(
                "Linked {} envelope values from {} to {:?}",
                values.len(),
                path.display(),
                args.link
            );
            AudioLink::new(values, args.link, args.amount.unwrap_or(config.link_amount))
        }
        None => AudioLink::none(),
    };

    let store_dir = args.out_dir.join(FRAME_STORE_DIR);
    let store = Arc::new(DiskFrameStore::new(&store_dir)?);
    let worker = RenderWorker::spawn(config.queue_capacity)?;
    let mut timeline = Timeline::new(store);

    timeline.render_keyframe(&worker, &source, start, codec)?;
    timeline.render_keyframe(&worker, &source, end, codec)?;
    let snapshot = timeline.render_transition(0, &worker, &source, frames, codec, audio_link)?;
    debug!("transition finished: {:?}", snapshot);

    let written = timeline.export_frames(&args.out_dir)?;
    timeline.clear()?;

    if let Err(e) = fs::remove_dir(&store_dir) {
        warn!("could not remove {}: {}", store_dir.display(), e);
    }

    println!(
        "Exported {} frames to {}",
        written.len(),
        args.out_dir.display()
    );
    Ok(())
}

/// Print the envelope of a WAV file.
pub fn envelope(
    audio: &Path,
    fps: Option<f64>,
    window: Option<usize>,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let clip = load_wav(audio)?;
    info!(
        "Extracting envelope from {} ({:.2}s at {} Hz)",
        audio.display(),
        clip.duration_secs(),
        clip.sample_rate
    );

    let values = extract(
        &clip.samples,
        window.unwrap_or(config.smoothing_window),
        fps.unwrap_or(config.frame_rate),
        clip.sample_rate as f64,
    );

    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::AmpModSettings;

    #[test]
    fn test_parse_inline_settings() {
        let settings =
            parse_settings(r#"{"type": "amp_mod", "frequency": 0, "phase": 0, "amp": 2, "offset": 1}"#)
                .unwrap();
        assert_eq!(
            settings,
            EffectSettings::AmpMod(AmpModSettings {
                frequency: 0.0,
                phase: 0.0,
                amp: 2.0,
                offset: 1.0,
            })
        );
    }

    #[test]
    fn test_parse_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delay.json");
        fs::write(&path, r#"{"type": "delay", "delay": 10, "feedback": 0.2, "mix": 0.5}"#)
            .unwrap();

        let settings = parse_settings(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.effect_type(), "delay");
    }

    #[test]
    fn test_parse_settings_errors() {
        let err = parse_settings("/no/such/settings.json").unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");

        let err = parse_settings(r#"{"type": "delay", "delay": -1, "feedback": 0, "mix": 0}"#)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SETTINGS");
    }

    #[test]
    fn test_render_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.bmp");
        let output = dir.path().join("out").join("out.bmp");
        let source: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
        fs::write(&input, &source).unwrap();

        render(&input, &output, r#"{"type": "amp_mod"}"#, None, None).unwrap();
        let rendered = fs::read(&output).unwrap();
        assert_eq!(rendered.len(), source.len());
        assert_eq!(&rendered[..54], &source[..54]);
    }

    #[test]
    fn test_render_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.bmp");
        fs::write(&input, b"").unwrap();

        let err = render(
            &input,
            &dir.path().join("o.bmp"),
            r#"{"type": "amp_mod"}"#,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_INPUT");
    }
}

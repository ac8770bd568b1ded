//! Frame rendering
//!
//! `render_frame` runs one buffer through decode → process → encode.
//! `render_animation` sequences that over an interpolated transition.
//! `RenderWorker` moves both off the caller's thread: requests travel over a
//! bounded queue to a single worker thread, and every response comes back
//! tagged with its request id on that request's own reply channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::dsp::{self, EffectSettings, HEADER_LENGTH};
use crate::engine::codec::{self, EncodingAlgorithm};
use crate::engine::interpolate::{frame_settings, progress_at, AudioLink};
use crate::error::{DatabendError, Result};

/// Render one frame
///
/// The source header bytes are copied over the result so the container
/// header survives the lossy codec round trip.
pub fn render_frame(buffer: &[u8], settings: &EffectSettings, codec: EncodingAlgorithm) -> Vec<u8> {
    let samples = codec::decode(buffer, codec);
    let processed = dsp::process(&samples, settings);
    let mut output = codec::encode(&processed, codec);

    let header = HEADER_LENGTH.min(buffer.len());
    output[..header].copy_from_slice(&buffer[..header]);
    output
}

/// An interpolated animation between two settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRequest {
    pub buffer: Vec<u8>,
    pub frame_count: usize,
    pub first_frame_settings: EffectSettings,
    pub last_frame_settings: EffectSettings,
    pub encoding_algorithm: EncodingAlgorithm,
    #[serde(default)]
    pub audio_link: AudioLink,
}

impl AnimationRequest {
    /// Check inputs before any frame is rendered
    pub fn validate(&self) -> Result<()> {
        if self.buffer.is_empty() {
            return Err(DatabendError::MissingInput {
                what: "source image".to_string(),
            });
        }
        if self.frame_count == 0 {
            return Err(DatabendError::MissingInput {
                what: "at least one frame".to_string(),
            });
        }
        self.first_frame_settings.validate()?;
        self.last_frame_settings.validate()?;
        EffectSettings::lerp(&self.first_frame_settings, &self.last_frame_settings, 0.0)?;
        Ok(())
    }
}

/// One finished animation frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub frame_index: usize,
    pub progress: f64,
    pub frame: Vec<u8>,
    pub settings: EffectSettings,
}

/// Render every frame of `request` in order, handing each to `on_frame`
/// before starting the next
///
/// Returns the number of frames rendered. An error from `on_frame` stops
/// the animation.
pub fn render_animation<F>(request: &AnimationRequest, mut on_frame: F) -> Result<usize>
where
    F: FnMut(RenderedFrame) -> Result<()>,
{
    request.validate()?;

    for frame_index in 0..request.frame_count {
        let settings = frame_settings(
            &request.first_frame_settings,
            &request.last_frame_settings,
            frame_index,
            request.frame_count,
            &request.audio_link,
        )?;
        let frame = render_frame(&request.buffer, &settings, request.encoding_algorithm);
        let progress = progress_at(frame_index, request.frame_count);
        debug!(
            "rendered frame {}/{} ({:.0}%)",
            frame_index + 1,
            request.frame_count,
            progress * 100.0
        );

        on_frame(RenderedFrame {
            frame_index,
            progress,
            frame,
            settings,
        })?;
    }

    Ok(request.frame_count)
}

/// Correlation id carried by every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// Message sent to the render worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderRequest {
    #[serde(rename_all = "camelCase")]
    RenderFrame {
        buffer: Vec<u8>,
        settings: EffectSettings,
        encoding_algorithm: EncodingAlgorithm,
    },
    RenderAnimation(AnimationRequest),
}

/// Message sent back by the render worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderResponse {
    RenderFrame {
        id: RequestId,
        output: Vec<u8>,
    },
    #[serde(rename_all = "camelCase")]
    Frame {
        id: RequestId,
        frame_index: usize,
        progress: f64,
        frame: Vec<u8>,
        settings: EffectSettings,
    },
    Progress {
        id: RequestId,
        progress: f64,
    },
    Done {
        id: RequestId,
        frames: usize,
    },
    Failed {
        id: RequestId,
        code: String,
        message: String,
    },
}

impl RenderResponse {
    pub fn id(&self) -> RequestId {
        match self {
            RenderResponse::RenderFrame { id, .. }
            | RenderResponse::Frame { id, .. }
            | RenderResponse::Progress { id, .. }
            | RenderResponse::Done { id, .. }
            | RenderResponse::Failed { id, .. } => *id,
        }
    }

    /// Whether this is the last response for its request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderResponse::RenderFrame { .. }
                | RenderResponse::Done { .. }
                | RenderResponse::Failed { .. }
        )
    }
}

struct Job {
    id: RequestId,
    request: RenderRequest,
    reply: Sender<RenderResponse>,
}

/// Handle to the responses of one submitted request
pub struct RenderTicket {
    id: RequestId,
    responses: Receiver<RenderResponse>,
}

impl RenderTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Block for the next response
    pub fn recv(&self) -> Result<RenderResponse> {
        self.responses
            .recv()
            .map_err(|_| DatabendError::WorkerUnavailable {
                reason: format!("request {} ended without a terminal response", self.id.0),
            })
    }

    /// Responses in arrival order, ending after the terminal one
    pub fn responses(&self) -> impl Iterator<Item = RenderResponse> + '_ {
        self.responses.iter()
    }

    /// Wait for the output of a single-frame request
    pub fn wait_frame(self) -> Result<Vec<u8>> {
        loop {
            match self.recv()? {
                RenderResponse::RenderFrame { output, .. } => return Ok(output),
                RenderResponse::Failed { code, message, .. } => {
                    return Err(DatabendError::RenderFailed {
                        reason: format!("{}: {}", code, message),
                    })
                }
                other => debug!("skipping {:?} while waiting for a frame", other.id()),
            }
        }
    }
}

/// Background renderer reached only through message passing
///
/// Requests run one at a time in submission order. The queue is bounded, so
/// `submit` blocks once `queue_capacity` requests are waiting.
pub struct RenderWorker {
    jobs: Option<SyncSender<Job>>,
    handle: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl RenderWorker {
    /// Start the worker thread
    pub fn spawn(queue_capacity: usize) -> Result<Self> {
        let (jobs, queue) = mpsc::sync_channel::<Job>(queue_capacity.max(1));
        let handle = thread::Builder::new()
            .name("databend-render".to_string())
            .spawn(move || run_jobs(queue))?;

        info!("Render worker started (queue capacity {})", queue_capacity.max(1));
        Ok(Self {
            jobs: Some(jobs),
            handle: Some(handle),
            next_id: AtomicU64::new(1),
        })
    }

    /// Queue a request and get a ticket for its responses
    pub fn submit(&self, request: RenderRequest) -> Result<RenderTicket> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, responses) = mpsc::channel();

        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| DatabendError::WorkerUnavailable {
                reason: "worker has shut down".to_string(),
            })?;
        jobs.send(Job { id, request, reply })
            .map_err(|_| DatabendError::WorkerUnavailable {
                reason: "worker thread has exited".to_string(),
            })?;

        Ok(RenderTicket { id, responses })
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        // Closing the queue lets the worker finish what it has and exit
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("render worker panicked");
            }
        }
    }
}

fn run_jobs(queue: Receiver<Job>) {
    for job in queue {
        run_job(job);
    }
    debug!("render queue closed");
}

fn run_job(job: Job) {
    let Job { id, request, reply } = job;

    let result = match request {
        RenderRequest::RenderFrame {
            buffer,
            settings,
            encoding_algorithm,
        } => render_single(&buffer, &settings, encoding_algorithm)
            .and_then(|output| send(&reply, RenderResponse::RenderFrame { id, output })),
        RenderRequest::RenderAnimation(request) => {
            info!("Request {}: rendering {} frames", id.0, request.frame_count);
            render_animation(&request, |rendered| {
                send(
                    &reply,
                    RenderResponse::Frame {
                        id,
                        frame_index: rendered.frame_index,
                        progress: rendered.progress,
                        frame: rendered.frame,
                        settings: rendered.settings,
                    },
                )?;
                send(
                    &reply,
                    RenderResponse::Progress {
                        id,
                        progress: rendered.progress,
                    },
                )
            })
            .and_then(|frames| send(&reply, RenderResponse::Done { id, frames }))
        }
    };

    if let Err(e) = result {
        warn!("Request {} failed: {}", id.0, e);
        // The caller may have dropped its ticket; nothing left to tell
        let _ = reply.send(RenderResponse::Failed {
            id,
            code: e.error_code().to_string(),
            message: e.to_string(),
        });
    }
}

fn render_single(
    buffer: &[u8],
    settings: &EffectSettings,
    codec: EncodingAlgorithm,
) -> Result<Vec<u8>> {
    if buffer.is_empty() {
        return Err(DatabendError::MissingInput {
            what: "source image".to_string(),
        });
    }
    settings.validate()?;
    Ok(render_frame(buffer, settings, codec))
}

fn send(reply: &Sender<RenderResponse>, response: RenderResponse) -> Result<()> {
    reply
        .send(response)
        .map_err(|_| DatabendError::WorkerUnavailable {
            reason: "response receiver dropped".to_string(),
        })
}

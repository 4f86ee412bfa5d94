use std::sync::{Arc, Mutex};

use crate::error::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A live local capture track.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    /// Disabled tracks keep their sender but transmit silence or black frames.
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Releases the underlying device. Irreversible.
    fn stop(&self);

    fn is_live(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const AUDIO_ONLY: MediaConstraints = MediaConstraints {
        audio: true,
        video: false,
    };

    pub const AUDIO_VIDEO: MediaConstraints = MediaConstraints {
        audio: true,
        video: true,
    };

    pub fn with_video(video: bool) -> Self {
        if video {
            Self::AUDIO_VIDEO
        } else {
            Self::AUDIO_ONLY
        }
    }
}

/// Tracks produced by one capture request.
#[derive(Clone, Default)]
pub struct MediaStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        MediaStream { tracks }
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Video)
    }

    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        for track in self.tracks.iter().filter(|t| t.kind() == kind) {
            track.set_enabled(enabled);
        }
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// True when both streams came from the same capture request.
    pub fn same_capture(&self, other: &MediaStream) -> bool {
        self.tracks.len() == other.tracks.len()
            && self
                .tracks
                .iter()
                .zip(&other.tracks)
                .all(|(a, b)| a.id() == b.id())
    }
}

pub trait MediaDevices: Send + Sync {
    fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError>;
}

/// The one camera/microphone of the process.
///
/// At most one capture is live: acquiring stops every track of the previous
/// capture first.
pub struct ExclusiveCapture {
    devices: Arc<dyn MediaDevices>,
    current: Mutex<Option<MediaStream>>,
    logger: logging::Logger,
}

impl ExclusiveCapture {
    pub fn new(devices: Arc<dyn MediaDevices>, logger: logging::Logger) -> Self {
        ExclusiveCapture {
            devices,
            current: Mutex::new(None),
            logger,
        }
    }

    pub fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError> {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = current.take() {
            self.logger.debug("Stopping previous capture");
            previous.stop();
        }

        let stream = self.devices.acquire(constraints)?;
        *current = Some(stream.clone());
        Ok(stream)
    }

    /// Tries `preferred`, then audio only. The flag says whether the stream
    /// that was obtained carries video.
    pub fn acquire_with_fallback(
        &self,
        preferred: MediaConstraints,
    ) -> Result<(MediaStream, bool), MediaError> {
        match self.acquire(preferred) {
            Ok(stream) => Ok((stream, preferred.video)),
            Err(e) if preferred.video => {
                self.logger
                    .warn(&format!("Camera capture failed ({}), retrying audio only", e));
                self.acquire(MediaConstraints::AUDIO_ONLY)
                    .map(|stream| (stream, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Stops `stream` and forgets it if it is still the live capture.
    pub fn release(&self, stream: &MediaStream) {
        stream.stop();
        if let Ok(mut current) = self.current.lock()
            && current.as_ref().is_some_and(|live| live.same_capture(stream))
        {
            *current = None;
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.current
            .lock()
            .map(|current| current.is_some())
            .unwrap_or(false)
    }
}

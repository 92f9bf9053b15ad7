use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Something that can hand out a capture stream, e.g. a screen grabber.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;
}

/// A captured stream owned by a session.
///
/// Dropping or stopping it tells the producer to release the device.
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
    ended: watch::Receiver<bool>,
    stopped: watch::Sender<bool>,
}

/// Producer side of a [`LocalMedia`].
pub struct MediaFeed {
    ended: watch::Sender<bool>,
    stopped: watch::Receiver<bool>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> (Self, MediaFeed) {
        let (ended_tx, ended_rx) = watch::channel(false);
        let (stopped_tx, stopped_rx) = watch::channel(false);

        let media = Self {
            tracks,
            ended: ended_rx,
            stopped: stopped_tx,
        };
        let feed = MediaFeed {
            ended: ended_tx,
            stopped: stopped_rx,
        };
        (media, feed)
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    /// Receiver that flips to `true` once the source stops producing.
    pub fn ended_signal(&self) -> watch::Receiver<bool> {
        self.ended.clone()
    }

    /// Stops every track and lets the producer release the capture device.
    pub fn stop(self) {
        info!("Stopping {} local track(s)", self.tracks.len());
        let _ = self.stopped.send(true);
    }
}

impl MediaFeed {
    /// Signals that the source ended on its own (e.g. the user stopped sharing).
    pub fn end(&self) {
        let _ = self.ended.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Resolves once the owning session released the media.
    pub async fn stopped(&mut self) {
        let _ = self.stopped.wait_for(|stopped| *stopped).await;
    }
}

/// Resolves when the watched source ends. A dropped feed counts as ended.
pub async fn media_ended(signal: Option<watch::Receiver<bool>>) {
    match signal {
        Some(mut rx) => {
            let _ = rx.wait_for(|ended| *ended).await;
        }
        None => std::future::pending().await,
    }
}

/// Handle a capture pipeline receives for each acquired stream.
pub struct CaptureHandle {
    pub track: Arc<TrackLocalStaticSample>,
    pub feed: MediaFeed,
}

/// Media source producing a single VP8 video track.
///
/// Frames are written by whoever consumes the [`CaptureHandle`]s, typically a
/// screen capture loop calling `write_sample` on the track.
pub struct SampleTrackSource {
    stream_id: String,
    captures: mpsc::UnboundedSender<CaptureHandle>,
}

impl SampleTrackSource {
    pub fn new(stream_id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<CaptureHandle>) {
        let (captures, rx) = mpsc::unbounded_channel();
        let source = Self {
            stream_id: stream_id.into(),
            captures,
        };
        (source, rx)
    }
}

#[async_trait]
impl MediaSource for SampleTrackSource {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "screen".to_owned(),
            self.stream_id.clone(),
        ));

        let (media, feed) = LocalMedia::new(vec![track.clone() as LocalTrack]);

        self.captures
            .send(CaptureHandle { track, feed })
            .map_err(|_| MediaError::Unavailable("no capture pipeline attached".to_owned()))?;

        Ok(media)
    }
}

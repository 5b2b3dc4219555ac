//! [`VoiceCapture`] — the recording lifecycle.
//!
//! ```text
//!   Idle ──start ok──▶ Recording ──stop / ceiling / source closed──▶ Stopped
//!     └──start failed──▶ Failed
//! ```
//!
//! While recording, a spawned task owns the device and the fragment
//! stream. Stopping (for any reason) closes the stream, drains what was
//! already queued, releases the device, then publishes the artifact. Only
//! `start()` and `reset()` move a capture back to `Idle`.

use std::{sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use checkin_core::checkin::Artifact;
use parking_lot::Mutex;
use tokio::{
  sync::{mpsc, oneshot, watch},
  task::JoinHandle,
  time::Instant,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{CaptureError, DeviceHandle, Microphone};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
  Idle,
  Recording,
  Stopped,
  Failed(CaptureError),
}

/// Tunables for [`VoiceCapture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
  /// Longest a single recording may run before it is stopped automatically.
  pub ceiling: Duration,
}

impl Default for CaptureConfig {
  fn default() -> Self { Self { ceiling: Duration::from_secs(30) } }
}

/// Why a recording ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  Requested,
  Ceiling,
  SourceClosed,
}

/// The current capture session, shared with the recording task.
struct Session {
  capture_id:  Option<Uuid>,
  state:       CaptureState,
  started_at:  Option<DateTime<Utc>>,
  artifact:    Option<Artifact>,
  stop_reason: Option<StopReason>,
}

impl Session {
  fn idle() -> Self {
    Self {
      capture_id:  None,
      state:       CaptureState::Idle,
      started_at:  None,
      artifact:    None,
      stop_reason: None,
    }
  }
}

struct Shared {
  session: Mutex<Session>,
  state:   watch::Sender<CaptureState>,
}

impl Shared {
  fn update(&self, f: impl FnOnce(&mut Session)) {
    let state = {
      let mut session = self.session.lock();
      f(&mut session);
      session.state.clone()
    };
    self.state.send_replace(state);
  }
}

struct ActiveRecording {
  capture_id: Uuid,
  stop:       oneshot::Sender<()>,
  task:       JoinHandle<()>,
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Owns the microphone for one recording at a time.
pub struct VoiceCapture<M: Microphone> {
  microphone: M,
  config:     CaptureConfig,
  shared:     Arc<Shared>,
  active:     Option<ActiveRecording>,
}

impl<M: Microphone> VoiceCapture<M> {
  pub fn new(microphone: M, config: CaptureConfig) -> Self {
    let (state, _) = watch::channel(CaptureState::Idle);
    Self {
      microphone,
      config,
      shared: Arc::new(Shared {
        session: Mutex::new(Session::idle()),
        state,
      }),
      active: None,
    }
  }

  pub fn state(&self) -> CaptureState { self.shared.session.lock().state.clone() }

  pub fn is_recording(&self) -> bool { self.state() == CaptureState::Recording }

  /// The finished artifact; `Some` only in [`CaptureState::Stopped`].
  pub fn artifact(&self) -> Option<Artifact> {
    let session = self.shared.session.lock();
    match session.state {
      CaptureState::Stopped => session.artifact.clone(),
      _ => None,
    }
  }

  pub fn started_at(&self) -> Option<DateTime<Utc>> {
    self.shared.session.lock().started_at
  }

  /// Why the last recording ended; `Some` only in [`CaptureState::Stopped`].
  pub fn stop_reason(&self) -> Option<StopReason> {
    let session = self.shared.session.lock();
    match session.state {
      CaptureState::Stopped => session.stop_reason,
      _ => None,
    }
  }

  /// Watch state changes, including the automatic stop at the ceiling.
  pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
    self.shared.state.subscribe()
  }

  /// Acquire the microphone and begin recording.
  ///
  /// Refused with [`CaptureError::AlreadyRecording`] while a recording is
  /// running; the running recording is untouched. Any earlier artifact is
  /// discarded.
  pub async fn start(&mut self) -> Result<(), CaptureError> {
    if self.is_recording() {
      return Err(CaptureError::AlreadyRecording);
    }
    self.join_active().await;
    self.shared.update(|s| *s = Session::idle());

    let input = match self.microphone.request_access().await {
      Ok(input) => input,
      Err(error) => {
        warn!(%error, "microphone unavailable");
        let failed = CaptureState::Failed(error.clone());
        self.shared.update(|s| s.state = failed);
        return Err(error);
      }
    };

    let capture_id = Uuid::new_v4();
    let started_at = Utc::now();
    self.shared.update(|s| {
      s.capture_id = Some(capture_id);
      s.state = CaptureState::Recording;
      s.started_at = Some(started_at);
    });

    // Guarded before the spawn: a task dropped before its first poll still
    // releases the device.
    let source = Source {
      fragments:    input.fragments,
      content_type: input.content_type,
      device:       DeviceGuard(Some(input.device)),
    };

    let (stop, stop_rx) = oneshot::channel();
    let task = tokio::spawn(record(
      self.shared.clone(),
      source,
      capture_id,
      started_at,
      self.config.ceiling,
      stop_rx,
    ));
    self.active = Some(ActiveRecording { capture_id, stop, task });

    info!(%capture_id, ceiling_secs = self.config.ceiling.as_secs(), "recording started");
    Ok(())
  }

  /// Stop recording and return the artifact.
  ///
  /// Outside of a recording this changes nothing: it returns the last
  /// artifact if there is one, else [`CaptureError::NotRecording`].
  pub async fn stop(&mut self) -> Result<Artifact, CaptureError> {
    self.join_active().await;

    let session = self.shared.session.lock();
    match (&session.state, &session.artifact) {
      (CaptureState::Stopped, Some(artifact)) => Ok(artifact.clone()),
      (CaptureState::Failed(error), _) => Err(error.clone()),
      _ => Err(CaptureError::NotRecording),
    }
  }

  /// Back to `Idle`, releasing the device if a recording is running and
  /// discarding any artifact.
  pub async fn reset(&mut self) {
    self.join_active().await;
    self.shared.update(|s| *s = Session::idle());
    debug!("capture reset");
  }

  /// Signal the running recording (if any) to stop and wait for it to
  /// publish its result. A recording that already stopped itself is just
  /// reaped.
  async fn join_active(&mut self) {
    let Some(active) = self.active.take() else {
      return;
    };
    // The task may already be gone after a ceiling stop.
    let _ = active.stop.send(());
    if let Err(error) = active.task.await {
      warn!(capture_id = %active.capture_id, %error, "capture task ended abnormally");
      let failed =
        CaptureState::Failed(CaptureError::Device("capture task ended abnormally".into()));
      self.shared.update(|s| {
        s.state = failed;
        s.artifact = None;
      });
    }
  }
}

impl<M: Microphone> Drop for VoiceCapture<M> {
  fn drop(&mut self) {
    // The task releases the device once it sees the stop signal.
    if let Some(active) = self.active.take() {
      let _ = active.stop.send(());
    }
  }
}

// ─── Recording task ──────────────────────────────────────────────────────────

/// Owns the granted device. Releases it exactly once: through
/// [`DeviceGuard::release`] when a recording ends, or on drop if the
/// recording task is torn down first (runtime shutdown, panic).
struct DeviceGuard(Option<Box<dyn DeviceHandle>>);

impl DeviceGuard {
  /// Release on the blocking pool; a cpal device joins its stream thread.
  /// If the blocking task never runs, dropping the closure still releases.
  async fn release(self) {
    if let Err(error) = tokio::task::spawn_blocking(move || drop(self)).await {
      warn!(%error, "releasing the input device failed");
    }
  }
}

impl Drop for DeviceGuard {
  fn drop(&mut self) {
    if let Some(device) = self.0.take() {
      device.release();
    }
  }
}

/// A [`crate::AudioInput`] whose device is guarded.
struct Source {
  fragments:    mpsc::UnboundedReceiver<Bytes>,
  content_type: String,
  device:       DeviceGuard,
}

async fn record(
  shared: Arc<Shared>,
  source: Source,
  capture_id: Uuid,
  started_at: DateTime<Utc>,
  ceiling: Duration,
  mut stop: oneshot::Receiver<()>,
) {
  let Source { mut fragments, content_type, device } = source;
  let clock = Instant::now();
  let deadline = tokio::time::sleep(ceiling);
  tokio::pin!(deadline);

  let mut chunks: Vec<Bytes> = Vec::new();
  let reason = loop {
    tokio::select! {
      biased;
      // A dropped sender means the controller is gone; stop all the same.
      _ = &mut stop => break StopReason::Requested,
      () = &mut deadline => break StopReason::Ceiling,
      fragment = fragments.recv() => match fragment {
        Some(fragment) => chunks.push(fragment),
        None => break StopReason::SourceClosed,
      },
    }
  };

  // Nothing sent after this point is accepted; everything queued before it
  // is kept.
  fragments.close();
  while let Ok(fragment) = fragments.try_recv() {
    chunks.push(fragment);
  }
  let duration = clock.elapsed();
  device.release().await;

  let artifact = Artifact {
    capture_id,
    bytes: concat(&chunks),
    content_type,
    started_at,
    duration,
  };

  match reason {
    StopReason::Ceiling => {
      info!(%capture_id, bytes = artifact.len(), "recording reached its ceiling; stopped")
    }
    StopReason::SourceClosed => {
      warn!(%capture_id, bytes = artifact.len(), "audio source closed; recording stopped")
    }
    StopReason::Requested => {
      info!(%capture_id, bytes = artifact.len(), "recording stopped")
    }
  }
  debug!(%capture_id, fragments = chunks.len(), "fragments assembled");

  shared.update(|s| {
    if s.capture_id == Some(capture_id) {
      s.state = CaptureState::Stopped;
      s.artifact = Some(artifact);
      s.stop_reason = Some(reason);
    }
  });
}

fn concat(chunks: &[Bytes]) -> Bytes {
  let total = chunks.iter().map(Bytes::len).sum();
  let mut buf = BytesMut::with_capacity(total);
  for chunk in chunks {
    buf.extend_from_slice(chunk);
  }
  buf.freeze()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ChannelMicrophone;

  const WEBM: &str = "audio/webm";

  fn capture() -> (ChannelMicrophone, VoiceCapture<ChannelMicrophone>) {
    let mic = ChannelMicrophone::new(WEBM);
    let capture = VoiceCapture::new(mic.clone(), CaptureConfig::default());
    (mic, capture)
  }

  #[tokio::test]
  async fn starts_idle() {
    let (_, capture) = capture();
    assert_eq!(capture.state(), CaptureState::Idle);
    assert!(capture.artifact().is_none());
    assert!(capture.started_at().is_none());
  }

  #[tokio::test]
  async fn fragments_are_concatenated_in_order() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    assert_eq!(capture.state(), CaptureState::Recording);
    assert!(capture.started_at().is_some());

    assert!(mic.push(&b"fragment1"[..]));
    assert!(mic.push(&b"fragment2"[..]));

    let artifact = capture.stop().await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from_static(b"fragment1fragment2"));
    assert_eq!(artifact.content_type, WEBM);
    assert_eq!(capture.state(), CaptureState::Stopped);
    assert_eq!(capture.stop_reason(), Some(StopReason::Requested));
    assert_eq!(capture.artifact(), Some(artifact));
  }

  #[tokio::test]
  async fn stop_releases_the_device() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    capture.stop().await.unwrap();

    assert!(!mic.is_open());
    assert_eq!(mic.releases(), 1);
    assert!(!mic.push(&b"too late"[..]));
    assert!(capture.stop().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn second_start_while_recording_is_rejected() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    mic.push(&b"keep me"[..]);

    assert_eq!(capture.start().await, Err(CaptureError::AlreadyRecording));
    assert_eq!(capture.state(), CaptureState::Recording);
    assert_eq!(mic.grants(), 1);

    let artifact = capture.stop().await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from_static(b"keep me"));
  }

  #[tokio::test]
  async fn stop_without_recording_is_a_noop() {
    let (_, mut capture) = capture();
    assert_eq!(capture.stop().await, Err(CaptureError::NotRecording));
    assert_eq!(capture.state(), CaptureState::Idle);
  }

  #[tokio::test]
  async fn repeated_stop_returns_the_same_artifact() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    mic.push(&b"once"[..]);
    let first = capture.stop().await.unwrap();
    let second = capture.stop().await.unwrap();
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn permission_denied_fails_and_allows_retry() {
    let (mic, mut capture) = capture();
    mic.deny_next(CaptureError::PermissionDenied);

    assert_eq!(capture.start().await, Err(CaptureError::PermissionDenied));
    assert_eq!(
      capture.state(),
      CaptureState::Failed(CaptureError::PermissionDenied)
    );
    assert!(capture.artifact().is_none());

    capture.start().await.unwrap();
    assert_eq!(capture.state(), CaptureState::Recording);
  }

  #[tokio::test(start_paused = true)]
  async fn ceiling_stops_recording_automatically() {
    let mic = ChannelMicrophone::new(WEBM);
    let mut capture = VoiceCapture::new(
      mic.clone(),
      CaptureConfig { ceiling: Duration::from_secs(30) },
    );
    let mut states = capture.subscribe();

    capture.start().await.unwrap();
    mic.push(&b"partial"[..]);

    states
      .wait_for(|s| *s == CaptureState::Stopped)
      .await
      .unwrap();

    assert!(!mic.is_open());
    assert_eq!(capture.stop_reason(), Some(StopReason::Ceiling));
    let artifact = capture.artifact().unwrap();
    assert_eq!(artifact.bytes, Bytes::from_static(b"partial"));
    assert_eq!(artifact.duration, Duration::from_secs(30));

    // A manual stop afterwards just hands back the same artifact.
    assert_eq!(capture.stop().await.unwrap(), artifact);
    assert_eq!(mic.releases(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn ceiling_with_no_fragments_yields_empty_artifact() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(capture.state(), CaptureState::Stopped);
    assert!(capture.artifact().unwrap().is_empty());
    assert!(!mic.is_open());
  }

  #[tokio::test(start_paused = true)]
  async fn manual_stop_disarms_the_ceiling() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    mic.push(&b"short"[..]);
    tokio::time::sleep(Duration::from_secs(5)).await;
    let artifact = capture.stop().await.unwrap();
    assert_eq!(artifact.duration, Duration::from_secs(5));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(capture.artifact(), Some(artifact));
    assert_eq!(mic.releases(), 1);
  }

  #[tokio::test]
  async fn disconnected_source_stops_recording() {
    let (mic, mut capture) = capture();
    let mut states = capture.subscribe();
    capture.start().await.unwrap();
    mic.push(&b"before unplug"[..]);
    mic.disconnect();

    states
      .wait_for(|s| *s == CaptureState::Stopped)
      .await
      .unwrap();
    assert_eq!(capture.stop_reason(), Some(StopReason::SourceClosed));
    let artifact = capture.stop().await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from_static(b"before unplug"));
  }

  #[tokio::test]
  async fn reset_discards_and_releases() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    mic.push(&b"abandoned"[..]);

    capture.reset().await;

    assert_eq!(capture.state(), CaptureState::Idle);
    assert!(capture.artifact().is_none());
    assert!(capture.stop_reason().is_none());
    assert!(!mic.is_open());
    assert_eq!(mic.releases(), 1);
  }

  #[tokio::test]
  async fn new_start_discards_previous_artifact() {
    let (mic, mut capture) = capture();
    capture.start().await.unwrap();
    mic.push(&b"first take"[..]);
    capture.stop().await.unwrap();

    capture.start().await.unwrap();
    assert!(capture.artifact().is_none());
    mic.push(&b"second take"[..]);
    let artifact = capture.stop().await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from_static(b"second take"));
  }

  #[tokio::test]
  async fn dropping_the_controller_releases_the_device() {
    let (mic, mut capture) = capture();
    let mut states = capture.subscribe();
    capture.start().await.unwrap();
    drop(capture);

    states
      .wait_for(|s| *s == CaptureState::Stopped)
      .await
      .unwrap();
    assert!(!mic.is_open());
  }

  #[test]
  fn runtime_shutdown_mid_recording_releases_the_device() {
    let mic = ChannelMicrophone::new(WEBM);
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .unwrap();

    let capture = runtime.block_on(async {
      let mut capture = VoiceCapture::new(mic.clone(), CaptureConfig::default());
      capture.start().await.unwrap();
      assert!(mic.push(&b"never assembled"[..]));
      capture
    });
    assert!(mic.is_open());

    drop(runtime);
    assert!(!mic.is_open());
    assert_eq!(mic.releases(), 1);

    drop(capture);
    assert_eq!(mic.releases(), 1);
  }

  mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
      #[test]
      fn artifact_is_exactly_the_fragments_before_stop(
        before in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..16),
        after in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..16), 0..4),
      ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
          .enable_all()
          .build()
          .unwrap();

        let (artifact, expected) = runtime.block_on(async {
          let (mic, mut capture) = capture();
          capture.start().await.unwrap();
          for fragment in &before {
            mic.push(Bytes::from(fragment.clone()));
          }
          let artifact = capture.stop().await.unwrap();
          for fragment in &after {
            mic.push(Bytes::from(fragment.clone()));
          }
          (artifact, before.concat())
        });

        prop_assert_eq!(artifact.bytes.as_ref(), expected.as_slice());
      }
    }
  }
}

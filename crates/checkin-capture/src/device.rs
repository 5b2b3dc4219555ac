//! [`CpalMicrophone`] — the default input device through cpal.
//!
//! cpal streams are not `Send` on every platform, so each recording gets a
//! dedicated thread that builds the stream, keeps it alive, and drops it
//! when the device is released. The audio callback mixes down to mono and
//! forwards big-endian PCM16 fragments, matching `audio/L16`.

use std::{sync::mpsc as std_mpsc, thread::JoinHandle};

use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};

use crate::{AudioInput, CaptureError, DeviceHandle, Microphone};

/// Records from a cpal input device.
///
/// Always opens the host's default input device.
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone;

impl CpalMicrophone {
  pub fn new() -> Self { Self }
}

impl Microphone for CpalMicrophone {
  async fn request_access(&self) -> Result<AudioInput, CaptureError> {
    let (ready_tx, ready_rx) = oneshot::channel();
    let (release_tx, release_rx) = std_mpsc::channel::<()>();
    let (fragment_tx, fragments) = mpsc::unbounded_channel();

    let thread = std::thread::Builder::new()
      .name("checkin-mic".into())
      .spawn(move || {
        let (stream, content_type) = match open_stream(fragment_tx) {
          Ok(opened) => opened,
          Err(error) => {
            let _ = ready_tx.send(Err(error));
            return;
          }
        };
        let _ = ready_tx.send(Ok(content_type));
        // Blocks until the handle is released or dropped.
        let _ = release_rx.recv();
        drop(stream);
        tracing::debug!("input stream closed");
      })
      .map_err(|e| CaptureError::Device(format!("spawning capture thread: {e}")))?;

    match ready_rx.await {
      Ok(Ok(content_type)) => Ok(AudioInput {
        fragments,
        content_type,
        device: Box::new(CpalDevice {
          release: Some(release_tx),
          thread:  Some(thread),
        }),
      }),
      Ok(Err(error)) => {
        let _ = thread.join();
        Err(error)
      }
      Err(_) => Err(CaptureError::Device("capture thread exited".into())),
    }
  }
}

fn open_stream(
  fragments: mpsc::UnboundedSender<Bytes>,
) -> Result<(cpal::Stream, String), CaptureError> {
  let device = cpal::default_host()
    .default_input_device()
    .ok_or_else(|| CaptureError::Device("no default input device available".into()))?;

  let supported = device.default_input_config().map_err(device_error)?;
  let rate = supported.sample_rate().0;
  let channels = usize::from(supported.channels());
  let sample_format = supported.sample_format();
  let config: cpal::StreamConfig = supported.into();

  tracing::info!(
    device = %device.name().unwrap_or_else(|_| "unknown".into()),
    rate,
    channels,
    ?sample_format,
    "opening input stream"
  );

  let on_error = |err: cpal::StreamError| tracing::error!("audio stream error: {err}");
  let stream = match sample_format {
    cpal::SampleFormat::F32 => device.build_input_stream(
      &config,
      move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let _ = fragments.send(to_pcm16_be(data, channels, |s| s));
      },
      on_error,
      None,
    ),
    cpal::SampleFormat::I16 => device.build_input_stream(
      &config,
      move |data: &[i16], _: &cpal::InputCallbackInfo| {
        let _ = fragments.send(to_pcm16_be(data, channels, |s| {
          f32::from(s) / f32::from(i16::MAX)
        }));
      },
      on_error,
      None,
    ),
    other => {
      return Err(CaptureError::Device(format!(
        "unsupported sample format {other:?}"
      )));
    }
  }
  .map_err(device_error)?;

  stream.play().map_err(device_error)?;
  Ok((stream, format!("audio/L16;rate={rate};channels=1")))
}

/// Mix interleaved frames down to mono and encode as big-endian i16.
fn to_pcm16_be<T: Copy>(
  samples: &[T],
  channels: usize,
  to_f32: impl Fn(T) -> f32,
) -> Bytes {
  let channels = channels.max(1);
  let mut out = Vec::with_capacity(samples.len() / channels * 2);
  for frame in samples.chunks(channels) {
    let mono = frame.iter().map(|s| to_f32(*s)).sum::<f32>() / frame.len() as f32;
    let sample = (mono * 32767.0).clamp(-32768.0, 32767.0) as i16;
    out.extend_from_slice(&sample.to_be_bytes());
  }
  Bytes::from(out)
}

/// cpal has no dedicated permission error; backends spell it out in text.
fn device_error(error: impl std::fmt::Display) -> CaptureError {
  let message = error.to_string();
  let lower = message.to_lowercase();
  if lower.contains("permission") || lower.contains("denied") {
    CaptureError::PermissionDenied
  } else {
    CaptureError::Device(message)
  }
}

struct CpalDevice {
  release: Option<std_mpsc::Sender<()>>,
  thread:  Option<JoinHandle<()>>,
}

impl CpalDevice {
  fn shutdown(&mut self) {
    if let Some(release) = self.release.take() {
      let _ = release.send(());
    }
    if let Some(thread) = self.thread.take()
      && thread.join().is_err()
    {
      tracing::warn!("capture thread panicked");
    }
  }
}

impl DeviceHandle for CpalDevice {
  fn release(mut self: Box<Self>) { self.shutdown(); }
}

impl Drop for CpalDevice {
  fn drop(&mut self) { self.shutdown(); }
}

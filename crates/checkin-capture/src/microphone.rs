//! The `Microphone` capability — everything the controller needs from an
//! audio-capture binding.
//!
//! A binding grants access, delivers fragments progressively on a channel,
//! and gives the hardware back when asked.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::CaptureError;

/// A source of live audio.
pub trait Microphone: Send + Sync + 'static {
  /// Ask for exclusive use of the input device.
  ///
  /// Denial must be reported as [`CaptureError::PermissionDenied`]; every
  /// other failure as [`CaptureError::Device`].
  fn request_access(
    &self,
  ) -> impl Future<Output = Result<AudioInput, CaptureError>> + Send + '_;
}

/// A granted device: its fragment stream and the handle that releases it.
pub struct AudioInput {
  /// Fragments in capture order. The sender side is dropped when the device
  /// goes away by itself.
  pub fragments:    mpsc::UnboundedReceiver<Bytes>,
  /// MIME type of the concatenated fragments.
  pub content_type: String,
  pub device:       Box<dyn DeviceHandle>,
}

impl std::fmt::Debug for AudioInput {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AudioInput")
      .field("content_type", &self.content_type)
      .finish_non_exhaustive()
  }
}

/// Ownership of the physical input device.
pub trait DeviceHandle: Send {
  /// Stop capturing and hand the device back. Called exactly once, on every
  /// way out of a recording.
  fn release(self: Box<Self>);
}

//! [`ChannelMicrophone`] — a microphone whose audio is pushed in by the
//! embedding program (a file, a pipe, another capture stack).

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{AudioInput, CaptureError, DeviceHandle, Microphone};

/// A software microphone. Clones share one device.
///
/// While a recording holds the device, [`push`](Self::push) delivers
/// fragments to it; otherwise pushes are dropped.
#[derive(Clone)]
pub struct ChannelMicrophone {
  content_type: String,
  inner:        Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
  live:           Option<mpsc::UnboundedSender<Bytes>>,
  pending_denial: Option<CaptureError>,
  grants:         usize,
  releases:       usize,
}

impl ChannelMicrophone {
  pub fn new(content_type: impl Into<String>) -> Self {
    Self {
      content_type: content_type.into(),
      inner:        Arc::new(Mutex::new(Inner::default())),
    }
  }

  /// Deliver one fragment. Returns `false` if no recording holds the device.
  pub fn push(&self, fragment: impl Into<Bytes>) -> bool {
    let inner = self.inner.lock();
    match &inner.live {
      Some(tx) => tx.send(fragment.into()).is_ok(),
      None => false,
    }
  }

  /// Make the next [`Microphone::request_access`] fail with `error`.
  pub fn deny_next(&self, error: CaptureError) {
    self.inner.lock().pending_denial = Some(error);
  }

  /// End the fragment stream from the source side, as an unplugged device
  /// would.
  pub fn disconnect(&self) {
    self.inner.lock().live = None;
  }

  /// `true` while a recording holds the device.
  pub fn is_open(&self) -> bool { self.inner.lock().live.is_some() }

  /// How many times access has been granted.
  pub fn grants(&self) -> usize { self.inner.lock().grants }

  /// How many times the device has been released.
  pub fn releases(&self) -> usize { self.inner.lock().releases }
}

impl Microphone for ChannelMicrophone {
  async fn request_access(&self) -> Result<AudioInput, CaptureError> {
    let mut inner = self.inner.lock();
    if let Some(error) = inner.pending_denial.take() {
      return Err(error);
    }
    if inner.live.is_some() {
      return Err(CaptureError::Device("device is busy".into()));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    inner.live = Some(tx);
    inner.grants += 1;

    Ok(AudioInput {
      fragments:    rx,
      content_type: self.content_type.clone(),
      device:       Box::new(ChannelDevice { inner: self.inner.clone() }),
    })
  }
}

struct ChannelDevice {
  inner: Arc<Mutex<Inner>>,
}

impl DeviceHandle for ChannelDevice {
  fn release(self: Box<Self>) {
    let mut inner = self.inner.lock();
    inner.live = None;
    inner.releases += 1;
  }
}

//! The microphone the binary records from.

#[cfg(feature = "cpal")]
pub type DefaultMicrophone = checkin_capture::CpalMicrophone;

#[cfg(not(feature = "cpal"))]
pub type DefaultMicrophone = NoMicrophone;

#[cfg(feature = "cpal")]
pub fn default_microphone() -> DefaultMicrophone { checkin_capture::CpalMicrophone::new() }

#[cfg(not(feature = "cpal"))]
pub fn default_microphone() -> DefaultMicrophone { NoMicrophone }

/// Stands in when no capture backend is compiled in. Every request fails
/// with a device error, so the rest of the flow still works.
#[cfg(not(feature = "cpal"))]
pub struct NoMicrophone;

#[cfg(not(feature = "cpal"))]
impl checkin_capture::Microphone for NoMicrophone {
  async fn request_access(
    &self,
  ) -> Result<checkin_capture::AudioInput, checkin_capture::CaptureError> {
    Err(checkin_capture::CaptureError::Device(
      "built without the `cpal` feature".into(),
    ))
  }
}

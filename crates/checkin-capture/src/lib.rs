//! Microphone capture for check-ins.
//!
//! [`VoiceCapture`] owns one recording at a time: it acquires a
//! [`Microphone`], accumulates fragments in arrival order, force-stops at a
//! ceiling, and hands back a single [`checkin_core::checkin::Artifact`].

mod channel;
mod controller;
#[cfg(feature = "cpal")]
mod device;

pub mod error;
pub mod microphone;

pub use channel::ChannelMicrophone;
pub use controller::{CaptureConfig, CaptureState, StopReason, VoiceCapture};
#[cfg(feature = "cpal")]
pub use device::CpalMicrophone;
pub use error::CaptureError;
pub use microphone::{AudioInput, DeviceHandle, Microphone};

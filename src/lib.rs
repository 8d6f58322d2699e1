//! Sentinel: device-side bridge between an embedded web UI and the phone.
//!
//! The UI layer invokes two commands, `requestPhotoCapture()` and
//! `initiateEmergencyCall(number)`. The bridge gates them on runtime
//! permissions, drives the camera session and the dialer, encodes captured
//! frames into JPEG data URLs, and pushes results back as UI events.
//!
//! Platform services sit behind the traits in [`platform`]; the host binary
//! wires them to [`platform::sim`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub mod codec;
pub mod permission;
pub mod platform;

pub mod call;
pub mod camera;

pub mod bridge;

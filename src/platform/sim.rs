//! Simulated device platform for running the bridge on a desktop host.
//!
//! The camera produces a synthetic planar YUV test pattern, permission
//! prompts are surfaced on a channel for the host to answer, the dialer
//! only logs, and the UI surface prints to stdout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{
    CameraHardware, CaptureConfig, Dialer, PermissionPrompter, PlatformError, ProviderHandle,
    UiSurface, UseCaseHandle,
};
use crate::bridge::event::{Notice, UiEvent};
use crate::call::CallIntent;
use crate::codec::RawFrame;
use crate::config::SimulationConfig;
use crate::permission::Capability;

/// Characters of a data URL shown before eliding the rest.
const PREVIEW_ELLIPSIS_AT: usize = 48;

/// Permission facility backed by an in-memory "OS settings" table.
///
/// Prompts are forwarded on a channel; the host decides the answer and
/// records it with [`SimPrompter::set_granted`].
#[derive(Debug)]
pub struct SimPrompter {
    granted: Mutex<HashMap<Capability, bool>>,
    prompts: mpsc::UnboundedSender<Capability>,
}

impl SimPrompter {
    /// Create the prompter and the receiver the host reads prompts from.
    pub fn new(config: &SimulationConfig) -> (Self, mpsc::UnboundedReceiver<Capability>) {
        let (prompts, rx) = mpsc::unbounded_channel();
        let granted = HashMap::from([
            (Capability::Camera, config.grant_camera),
            (Capability::Telephony, config.grant_telephony),
        ]);
        let prompter = Self {
            granted: Mutex::new(granted),
            prompts,
        };
        (prompter, rx)
    }

    /// Change what the OS reports for a capability.
    pub fn set_granted(&self, capability: Capability, granted: bool) {
        if let Ok(mut map) = self.granted.lock() {
            map.insert(capability, granted);
        }
    }
}

impl PermissionPrompter for SimPrompter {
    fn check(&self, capability: Capability) -> bool {
        match self.granted.lock() {
            Ok(map) => map.get(&capability).copied().unwrap_or(false),
            Err(_) => false,
        }
    }

    fn prompt(&self, capability: Capability) {
        info!(%capability, "permission prompt shown");
        if self.prompts.send(capability).is_err() {
            debug!(%capability, "nobody is answering permission prompts");
        }
    }
}

/// Camera that renders a synthetic test pattern.
#[derive(Debug)]
pub struct SimCamera {
    width: u32,
    height: u32,
    acquire_delay: Duration,
    capture_delay: Duration,
    next_handle: AtomicU64,
    frame_counter: AtomicU64,
}

impl SimCamera {
    /// Camera sized and paced from the simulation config.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            width: config.frame_width.max(2),
            height: config.frame_height.max(2),
            acquire_delay: Duration::from_millis(config.acquire_delay_ms),
            capture_delay: Duration::from_millis(config.capture_delay_ms),
            next_handle: AtomicU64::new(1),
            frame_counter: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// Horizontal luma gradient shifted by the frame number, with
    /// constant chroma planes.
    fn test_pattern(&self, frame: u64) -> RawFrame {
        let w = usize::try_from(self.width).unwrap_or(2);
        let h = usize::try_from(self.height).unwrap_or(2);
        let shift = u8::try_from(frame.wrapping_mul(8) & 0xFF).unwrap_or(0);

        let luma: Vec<u8> = (0..h)
            .flat_map(|_| (0..w).map(|x| u8::try_from(x & 0xFF).unwrap_or(0)))
            .map(|v| v.wrapping_mul(4).wrapping_add(shift))
            .collect();
        let chroma_len = w.div_ceil(2).saturating_mul(h.div_ceil(2));
        let u = vec![96; chroma_len];
        let v = vec![160; chroma_len];

        RawFrame::yuv420(self.width, self.height, luma, u, v)
    }
}

#[async_trait]
impl CameraHardware for SimCamera {
    async fn acquire_provider(&self) -> Result<ProviderHandle, PlatformError> {
        tokio::time::sleep(self.acquire_delay).await;
        Ok(ProviderHandle(self.next_id()))
    }

    fn unbind_all(&self, provider: ProviderHandle) {
        debug!(%provider, "sim: unbind all");
    }

    fn bind(
        &self,
        provider: ProviderHandle,
        config: &CaptureConfig,
    ) -> Result<UseCaseHandle, PlatformError> {
        let use_case = UseCaseHandle(self.next_id());
        debug!(%provider, %use_case, ?config, "sim: bound still capture");
        Ok(use_case)
    }

    fn take_picture(&self, use_case: UseCaseHandle) -> Result<RawFrame, PlatformError> {
        std::thread::sleep(self.capture_delay);
        let frame = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        debug!(%use_case, frame, "sim: frame captured");
        Ok(self.test_pattern(frame))
    }

    fn release(&self, provider: ProviderHandle) {
        debug!(%provider, "sim: provider released");
    }
}

/// Dialer that only records the intent.
#[derive(Debug, Default)]
pub struct LogDialer;

impl Dialer for LogDialer {
    fn start_call(&self, intent: &CallIntent) -> Result<(), PlatformError> {
        info!(uri = %intent.uri, action = ?intent.action, "sim: dialing");
        println!("[dialer] {:?} {}", intent.action, intent.uri);
        Ok(())
    }
}

/// Surface that prints scripts and notices to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl UiSurface for ConsoleSurface {
    fn emit(&mut self, event: &UiEvent) {
        match event {
            UiEvent::PreviewImage(data_url) => {
                let head: String = data_url.chars().take(PREVIEW_ELLIPSIS_AT).collect();
                println!("[ui] previewImage('{head}...') ({} bytes)", data_url.len());
            }
            UiEvent::StopAutoCapture => println!("[ui] {}", event.to_script()),
        }
    }

    fn notify(&mut self, notice: &Notice) {
        println!("[notice] {notice}");
    }
}

//! Runtime permission gate for the camera and telephony capabilities.
//!
//! [`PermissionGate::ensure`] answers synchronously when a capability is
//! already granted and otherwise launches exactly one platform prompt.
//! The OS answer arrives later through [`PermissionGate::resolve`], which
//! the bridge calls on the UI-owning context before running the
//! capability's continuation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::platform::PermissionPrompter;

/// A platform-gated permission domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Access to the capture hardware.
    Camera,
    /// Permission to place calls directly.
    Telephony,
}

impl Capability {
    /// Parse the lower-case name used by the host CLI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "camera" => Some(Self::Camera),
            "telephony" | "phone" | "call" => Some(Self::Telephony),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => f.write_str("camera"),
            Self::Telephony => f.write_str("telephony"),
        }
    }
}

/// Grant state of one capability. Reset to `Unknown` at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Never checked in this process.
    #[default]
    Unknown,
    /// A platform prompt is outstanding.
    Requesting,
    /// The user granted the capability.
    Granted,
    /// The user denied the capability.
    Denied,
}

/// Result of [`PermissionGate::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The caller may proceed right away.
    AlreadyGranted,
    /// A prompt is (or already was) outstanding; the answer comes later.
    Requested,
}

/// Tracks grant state per capability and coalesces prompts.
///
/// Uses a sync [`Mutex`] since the critical section is brief (no awaits).
pub struct PermissionGate {
    states: Mutex<HashMap<Capability, PermissionState>>,
    prompter: Arc<dyn PermissionPrompter>,
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("camera", &self.state(Capability::Camera))
            .field("telephony", &self.state(Capability::Telephony))
            .finish_non_exhaustive()
    }
}

impl PermissionGate {
    /// Create a gate with every capability in `Unknown`.
    pub fn new(prompter: Arc<dyn PermissionPrompter>) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            prompter,
        }
    }

    /// Current state of a capability.
    pub fn state(&self, capability: Capability) -> PermissionState {
        match self.states.lock() {
            Ok(map) => map.get(&capability).copied().unwrap_or_default(),
            Err(_) => PermissionState::Unknown,
        }
    }

    /// Make sure `capability` is granted, prompting if needed.
    ///
    /// A second call while a prompt is outstanding does not prompt again.
    /// A previous denial is not retried on its own; a fresh call (which
    /// only happens when the user retriggers an action) checks the OS
    /// again and prompts if it still reports no grant.
    pub fn ensure(&self, capability: Capability) -> EnsureOutcome {
        let current = match self.states.lock() {
            Ok(map) => map.get(&capability).copied().unwrap_or_default(),
            Err(_) => {
                warn!(%capability, "permission state lock poisoned");
                return EnsureOutcome::Requested;
            }
        };
        match current {
            PermissionState::Granted => return EnsureOutcome::AlreadyGranted,
            PermissionState::Requesting => {
                debug!(%capability, "prompt already outstanding, coalescing");
                return EnsureOutcome::Requested;
            }
            PermissionState::Unknown | PermissionState::Denied => {}
        }

        // Platform calls run without the lock held.
        let os_granted = self.prompter.check(capability);

        let mut map = match self.states.lock() {
            Ok(m) => m,
            Err(_) => {
                warn!(%capability, "permission state lock poisoned");
                return EnsureOutcome::Requested;
            }
        };
        match map.get(&capability).copied().unwrap_or_default() {
            PermissionState::Granted => return EnsureOutcome::AlreadyGranted,
            PermissionState::Requesting => {
                debug!(%capability, "prompt raised meanwhile, coalescing");
                return EnsureOutcome::Requested;
            }
            PermissionState::Unknown | PermissionState::Denied => {}
        }

        if os_granted {
            debug!(%capability, "platform reports capability granted");
            map.insert(capability, PermissionState::Granted);
            return EnsureOutcome::AlreadyGranted;
        }

        info!(%capability, previous = ?current, "requesting permission");
        map.insert(capability, PermissionState::Requesting);
        drop(map);
        self.prompter.prompt(capability);
        EnsureOutcome::Requested
    }

    /// Record the OS answer to a prompt and return the new state.
    pub fn resolve(&self, capability: Capability, granted: bool) -> PermissionState {
        let next = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };

        match self.states.lock() {
            Ok(mut map) => {
                let previous = map.insert(capability, next).unwrap_or_default();
                if previous != PermissionState::Requesting {
                    debug!(%capability, ?previous, "permission result without outstanding prompt");
                }
            }
            Err(_) => warn!(%capability, "permission state lock poisoned"),
        }

        if granted {
            info!(%capability, "permission granted by user");
        } else {
            warn!(%capability, "permission denied by user");
        }
        next
    }

    /// Forget a cached grant so the next [`ensure`](Self::ensure) asks the OS.
    pub fn invalidate(&self, capability: Capability) {
        if let Ok(mut map) = self.states.lock() {
            map.insert(capability, PermissionState::Unknown);
        }
    }
}

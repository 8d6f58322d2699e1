//! Emergency call dispatch: number validation and direct-call intents.
//!
//! [`CallDispatcher::dispatch`] walks candidates in order and acts on the
//! first one that validates. At most one intent is issued per batch; a
//! missing telephony grant stops the batch after prompting, and the UI
//! layer must re-issue the command once the grant arrives.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ErrorKind;
use crate::permission::{Capability, EnsureOutcome, PermissionGate};
use crate::platform::{Dialer, PlatformError};

/// Optional leading `+`, then digits, spaces, hyphens and parentheses.
static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-]+$").ok());

/// A phone number that passed [`validate`]. Trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedNumber(String);

impl ValidatedNumber {
    /// The number as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim `raw` and accept it only if it looks like a dialable number.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidPhoneNumber`] for empty, blank, or
/// out-of-alphabet input.
pub fn validate(raw: &str) -> Result<ValidatedNumber, ErrorKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ErrorKind::InvalidPhoneNumber);
    }
    match PHONE_PATTERN.as_ref() {
        Some(pattern) if pattern.is_match(trimmed) => Ok(ValidatedNumber(trimmed.to_owned())),
        Some(_) => Err(ErrorKind::InvalidPhoneNumber),
        None => {
            warn!("phone number pattern failed to compile");
            Err(ErrorKind::InvalidPhoneNumber)
        }
    }
}

/// Intent action understood by the platform dialer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    /// Place the call immediately, without showing the dial pad.
    Call,
}

/// Platform request to place a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallIntent {
    /// Intent action.
    pub action: CallAction,
    /// `tel:` URI of the recipient.
    pub uri: Url,
    /// Start the dialer in a new task.
    pub new_task: bool,
}

impl CallIntent {
    /// Direct-call intent for a validated number.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::CallIntentFailed`] if the `tel:` URI cannot be
    /// built.
    pub fn direct_call(number: &ValidatedNumber) -> Result<Self, ErrorKind> {
        let uri = Url::parse(&format!("tel:{}", number.as_str()))
            .map_err(|e| ErrorKind::CallIntentFailed(format!("bad tel uri: {e}")))?;
        Ok(Self {
            action: CallAction::Call,
            uri,
            new_task: true,
        })
    }
}

/// How one call command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The intent was issued.
    Dispatched,
    /// Telephony permission was requested; nothing was dialed.
    PermissionPending,
    /// Nothing was dialed.
    Rejected(ErrorKind),
}

/// Record of one call command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAttempt {
    /// The candidate acted on, if any validated.
    pub number: Option<ValidatedNumber>,
    /// Result.
    pub outcome: CallOutcome,
    /// When the attempt was made.
    pub at: DateTime<Utc>,
}

impl CallAttempt {
    fn new(number: Option<ValidatedNumber>, outcome: CallOutcome) -> Self {
        Self {
            number,
            outcome,
            at: Utc::now(),
        }
    }
}

/// Validates candidates and issues direct-call intents.
pub struct CallDispatcher {
    gate: Arc<PermissionGate>,
    dialer: Arc<dyn Dialer>,
}

impl fmt::Debug for CallDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallDispatcher")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl CallDispatcher {
    /// Create a dispatcher sharing the process permission gate.
    pub fn new(gate: Arc<PermissionGate>, dialer: Arc<dyn Dialer>) -> Self {
        Self { gate, dialer }
    }

    /// Act on the first valid candidate.
    ///
    /// Invalid candidates are skipped. The first valid one is dialed if
    /// telephony is granted; otherwise permission is requested and the
    /// batch ends. Any intent failure also ends the batch.
    pub fn dispatch<S: AsRef<str>>(&self, candidates: &[S]) -> CallAttempt {
        let number = candidates.iter().find_map(|candidate| {
            let raw = candidate.as_ref();
            match validate(raw) {
                Ok(number) => Some(number),
                Err(_) => {
                    debug!(candidate = %raw.trim(), "skipping invalid phone number");
                    None
                }
            }
        });

        let Some(number) = number else {
            warn!(count = candidates.len(), "no valid phone number in batch");
            return CallAttempt::new(None, CallOutcome::Rejected(ErrorKind::InvalidPhoneNumber));
        };

        if self.gate.ensure(Capability::Telephony) == EnsureOutcome::Requested {
            info!(%number, "telephony permission needed, call not placed");
            return CallAttempt::new(Some(number), CallOutcome::PermissionPending);
        }

        let outcome = match self.issue(&number) {
            Ok(()) => {
                info!(%number, "emergency call initiated");
                CallOutcome::Dispatched
            }
            Err(reason) => CallOutcome::Rejected(reason),
        };
        CallAttempt::new(Some(number), outcome)
    }

    fn issue(&self, number: &ValidatedNumber) -> Result<(), ErrorKind> {
        let intent = CallIntent::direct_call(number)?;
        match self.dialer.start_call(&intent) {
            Ok(()) => Ok(()),
            Err(PlatformError::Security(message)) => {
                warn!(%number, error = %message, "dialer rejected call for lack of permission");
                self.gate.invalidate(Capability::Telephony);
                Err(ErrorKind::CallPermissionDenied)
            }
            Err(e) => {
                warn!(%number, error = %e, "failed to initiate call");
                Err(ErrorKind::CallIntentFailed(e.to_string()))
            }
        }
    }
}

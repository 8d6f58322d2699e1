//! Inbound command table.
//!
//! The UI layer invokes commands by name with JSON arguments. Names are
//! resolved through an explicit table built and checked at startup;
//! unknown names are rejected with [`BridgeError::UnknownCommand`].

use std::collections::HashMap;

use serde_json::Value;

use crate::error::BridgeError;

/// Name of the capture command.
pub const REQUEST_PHOTO_CAPTURE: &str = "requestPhotoCapture";

/// Name of the call command.
pub const INITIATE_EMERGENCY_CALL: &str = "initiateEmergencyCall";

/// A resolved inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Capture one image if the session is ready.
    RequestPhotoCapture,
    /// Place a call to a single number.
    InitiateEmergencyCall {
        /// Raw number from the UI layer; `None` when it passed null.
        phone_number: Option<String>,
    },
}

/// Argument parser for one command.
pub type ArgParser = fn(&[Value]) -> Result<Command, String>;

/// One table entry.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    name: &'static str,
    parse: ArgParser,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    /// Entry binding `name` to `parse`.
    pub const fn new(name: &'static str, parse: ArgParser) -> Self {
        Self { name, parse }
    }

    /// Command name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Name-to-parser table for inbound commands.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: HashMap<&'static str, CommandSpec>,
}

impl CommandTable {
    /// The two commands the UI layer may invoke.
    ///
    /// # Errors
    ///
    /// Propagates [`CommandTable::from_specs`] validation errors.
    pub fn standard() -> Result<Self, BridgeError> {
        Self::from_specs(&[
            CommandSpec::new(REQUEST_PHOTO_CAPTURE, parse_request_photo_capture),
            CommandSpec::new(INITIATE_EMERGENCY_CALL, parse_initiate_emergency_call),
        ])
    }

    /// Build a table, rejecting blank and duplicate names.
    ///
    /// # Errors
    ///
    /// [`BridgeError::DuplicateCommand`] for a repeated name,
    /// [`BridgeError::BlankCommandName`] for an empty one.
    pub fn from_specs(specs: &[CommandSpec]) -> Result<Self, BridgeError> {
        let mut entries = HashMap::with_capacity(specs.len());
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(BridgeError::BlankCommandName);
            }
            if entries.insert(spec.name, *spec).is_some() {
                return Err(BridgeError::DuplicateCommand(spec.name.to_owned()));
            }
        }
        Ok(Self { entries })
    }

    /// Resolve an invocation to a command.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownCommand`] or [`BridgeError::InvalidArguments`].
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<Command, BridgeError> {
        let spec = self
            .entries
            .get(name)
            .ok_or_else(|| BridgeError::UnknownCommand(name.to_owned()))?;
        (spec.parse)(args).map_err(|reason| BridgeError::InvalidArguments {
            command: name.to_owned(),
            reason,
        })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn parse_request_photo_capture(args: &[Value]) -> Result<Command, String> {
    if !args.is_empty() {
        return Err(format!("expected no arguments, got {}", args.len()));
    }
    Ok(Command::RequestPhotoCapture)
}

fn parse_initiate_emergency_call(args: &[Value]) -> Result<Command, String> {
    let phone_number = match args {
        [] | [Value::Null] => None,
        [Value::String(number)] => Some(number.clone()),
        [Value::Number(number)] => Some(number.to_string()),
        [other] => return Err(format!("phoneNumber must be a string or null, got {other}")),
        _ => return Err(format!("expected at most one argument, got {}", args.len())),
    };
    Ok(Command::InitiateEmergencyCall { phone_number })
}

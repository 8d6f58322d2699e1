//! Command table validation and argument parsing.

use serde_json::{json, Value};
use sentinel::bridge::command::{
    Command, CommandSpec, CommandTable, INITIATE_EMERGENCY_CALL, REQUEST_PHOTO_CAPTURE,
};
use sentinel::error::BridgeError;

fn any_command(_args: &[Value]) -> Result<Command, String> {
    Ok(Command::RequestPhotoCapture)
}

fn table() -> CommandTable {
    CommandTable::standard().expect("standard table should be valid")
}

#[test]
fn unknown_command_is_rejected() {
    let err = table()
        .resolve("takeSelfie", &[])
        .expect_err("unknown name should fail");
    assert_eq!(err, BridgeError::UnknownCommand("takeSelfie".to_owned()));
}

#[test]
fn names_are_case_sensitive() {
    assert!(matches!(
        table().resolve("RequestPhotoCapture", &[]),
        Err(BridgeError::UnknownCommand(_))
    ));
}

#[test]
fn capture_takes_no_arguments() {
    assert_eq!(
        table().resolve(REQUEST_PHOTO_CAPTURE, &[]),
        Ok(Command::RequestPhotoCapture)
    );
    assert!(matches!(
        table().resolve(REQUEST_PHOTO_CAPTURE, &[json!(1)]),
        Err(BridgeError::InvalidArguments { .. })
    ));
}

#[test]
fn call_accepts_string_null_or_nothing() {
    let table = table();
    assert_eq!(
        table.resolve(INITIATE_EMERGENCY_CALL, &[json!("911")]),
        Ok(Command::InitiateEmergencyCall {
            phone_number: Some("911".to_owned())
        })
    );
    assert_eq!(
        table.resolve(INITIATE_EMERGENCY_CALL, &[Value::Null]),
        Ok(Command::InitiateEmergencyCall { phone_number: None })
    );
    assert_eq!(
        table.resolve(INITIATE_EMERGENCY_CALL, &[]),
        Ok(Command::InitiateEmergencyCall { phone_number: None })
    );
}

#[test]
fn call_rejects_objects_and_extra_arguments() {
    let table = table();
    let err = table
        .resolve(INITIATE_EMERGENCY_CALL, &[json!({"number": "911"})])
        .expect_err("object should be rejected");
    match err {
        BridgeError::InvalidArguments { command, .. } => {
            assert_eq!(command, INITIATE_EMERGENCY_CALL);
        }
        other => panic!("expected invalid arguments, got {other:?}"),
    }
    assert!(table
        .resolve(INITIATE_EMERGENCY_CALL, &[json!("911"), json!("112")])
        .is_err());
}

#[test]
fn duplicate_names_fail_validation() {
    let err = CommandTable::from_specs(&[
        CommandSpec::new("ping", any_command),
        CommandSpec::new("ping", any_command),
    ])
    .expect_err("duplicate should fail");
    assert_eq!(err, BridgeError::DuplicateCommand("ping".to_owned()));
}

#[test]
fn blank_names_fail_validation() {
    let err = CommandTable::from_specs(&[CommandSpec::new("  ", any_command)])
        .expect_err("blank name should fail");
    assert_eq!(err, BridgeError::BlankCommandName);
}

#[test]
fn names_are_sorted() {
    let table = CommandTable::from_specs(&[
        CommandSpec::new("zeta", any_command),
        CommandSpec::new("alpha", any_command),
    ])
    .expect("valid table");
    assert_eq!(table.names(), vec!["alpha", "zeta"]);
}

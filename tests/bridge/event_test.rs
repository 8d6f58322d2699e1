//! Outbound events, notices, and error reporting.

use std::sync::{Arc, Mutex};

use sentinel::bridge::event::{escape_script_literal, Notice, UiEvent};
use sentinel::bridge::report::{notice_for, Reporter};
use sentinel::error::ErrorKind;
use sentinel::platform::UiSurface;

#[derive(Clone, Default)]
struct SharedSurface {
    events: Arc<Mutex<Vec<UiEvent>>>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl UiSurface for SharedSurface {
    fn emit(&mut self, event: &UiEvent) {
        self.events.lock().expect("lock").push(event.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.lock().expect("lock").push(notice.clone());
    }
}

#[test]
fn event_names_match_ui_functions() {
    assert_eq!(UiEvent::PreviewImage(String::new()).name(), "previewImage");
    assert_eq!(UiEvent::StopAutoCapture.name(), "stopAutoCapture");
}

#[test]
fn data_url_survives_script_quoting() {
    let url = "data:image/jpeg;base64,/9j/4AAQSkZJRg+/==";
    let script = UiEvent::PreviewImage(url.to_owned()).to_script();
    assert_eq!(script, format!("previewImage('{url}')"));
}

#[test]
fn line_breaks_are_escaped() {
    assert_eq!(escape_script_literal("a\nb\r"), "a\\nb\\r");
}

#[test]
fn call_notice_names_the_number() {
    assert_eq!(
        Notice::CallInitiated("911".to_owned()).to_string(),
        "Initiating emergency call to 911..."
    );
}

#[test]
fn error_kinds_map_to_notices() {
    assert_eq!(notice_for(&ErrorKind::NotReady), Notice::CameraNotReady);
    assert_eq!(
        notice_for(&ErrorKind::CaptureFailed("3".to_owned())),
        Notice::CaptureFailed("3".to_owned())
    );
    assert_eq!(
        notice_for(&ErrorKind::InvalidBuffer("empty".to_owned())),
        Notice::ImageProcessingFailed
    );
    assert_eq!(notice_for(&ErrorKind::InvalidPhoneNumber), Notice::InvalidNumber);
    assert_eq!(
        notice_for(&ErrorKind::CallPermissionDenied),
        Notice::CallPermissionError
    );
}

#[test]
fn camera_failures_halt_auto_capture() {
    let surface = SharedSurface::default();
    let mut reporter = Reporter::new(Box::new(surface.clone()));

    reporter.report(&ErrorKind::NotReady);
    assert_eq!(
        *surface.notices.lock().expect("lock"),
        vec![Notice::CameraNotReady]
    );
    assert_eq!(
        *surface.events.lock().expect("lock"),
        vec![UiEvent::StopAutoCapture]
    );
}

#[test]
fn call_failures_only_notify() {
    let surface = SharedSurface::default();
    let mut reporter = Reporter::new(Box::new(surface.clone()));

    reporter.report(&ErrorKind::CallIntentFailed("no dialer".to_owned()));
    assert_eq!(
        *surface.notices.lock().expect("lock"),
        vec![Notice::CallFailed]
    );
    assert!(surface.events.lock().expect("lock").is_empty());
}

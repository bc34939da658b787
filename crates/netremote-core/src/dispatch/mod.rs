//! Command validation and dispatch.
//!
//! [`dispatch_frame`] is a pure function from one framed text message and a
//! radio handle to an explicit [`Outcome`]. Every rejectable condition maps
//! to an error response; nothing in the taxonomy is raised as a Rust error,
//! so the transports only ever deal with the four outcome variants.

use serde_json::Value;

use crate::control::RadioControl;
use crate::protocol::{codec, Command, Decoded, DecodeError, ErrorKind, Response};

pub mod registry;

use registry::{Access, MethodDescriptor};

/// What the transport should do with one received frame.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Send this response.
    Reply(Response),
    /// A recognized frame that warrants no reply (the JSON `null` frame).
    Silent,
    /// `exe close`: terminate this session without replying. Not an error.
    CloseSession,
    /// The frame never tokenized as JSON. TCP drops the peer, serial
    /// discards the frame; neither replies.
    Garbage,
}

struct Fault {
    kind: ErrorKind,
    message: String,
}

impl Fault {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }
}

enum Handled {
    Reply(Response),
    Close,
}

/// Decode and dispatch one frame against the radio.
pub fn dispatch_frame(raw: &str, control: &dyn RadioControl) -> Outcome {
    let command = match codec::decode(raw) {
        Ok(Decoded::Command(command)) => command,
        Ok(Decoded::Empty) => return Outcome::Silent,
        Err(DecodeError::Garbage) => return Outcome::Garbage,
        Err(DecodeError::Shape(text)) => {
            return Outcome::Reply(Response::error(ErrorKind::Syntax, text));
        }
    };

    match execute(&command, control) {
        Ok(Handled::Reply(response)) => Outcome::Reply(response),
        Ok(Handled::Close) => Outcome::CloseSession,
        Err(fault) => Outcome::Reply(Response::error(fault.kind, fault.message)),
    }
}

fn execute(command: &Command, control: &dyn RadioControl) -> Result<Handled, Fault> {
    let verb = command
        .command
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Fault::new(ErrorKind::Command, "Command key not found"))?;
    if !matches!(verb, "get" | "set" | "exe") {
        return Err(Fault::new(
            ErrorKind::Command,
            format!("Unknown command: {verb}"),
        ));
    }

    let method = command
        .method
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Fault::new(ErrorKind::Method, "Method key not found"))?;

    if verb == "exe" {
        return execute_verb(method, control);
    }

    let descriptor = registry::lookup(method).ok_or_else(|| {
        Fault::new(ErrorKind::Method, format!("Unknown method: {method}"))
    })?;

    if verb == "set" {
        set_property(descriptor, command.value.as_ref(), control).map(Handled::Reply)
    } else {
        Ok(Handled::Reply(get_property(descriptor, control)))
    }
}

fn execute_verb(method: &str, control: &dyn RadioControl) -> Result<Handled, Fault> {
    match method {
        "start" => {
            control.start_radio();
            Ok(Handled::Reply(Response::Ok))
        }
        "stop" => {
            control.stop_radio();
            Ok(Handled::Reply(Response::Ok))
        }
        "close" => Ok(Handled::Close),
        other => Err(Fault::new(
            ErrorKind::Method,
            format!("Unknown Exe method: {other}"),
        )),
    }
}

fn get_property(descriptor: &MethodDescriptor, control: &dyn RadioControl) -> Response {
    let value = match &descriptor.access {
        Access::Bool { get, .. } => Value::from(get(control)),
        Access::Int { get, .. } => Value::from(get(control)),
        Access::Enum { get, .. } => Value::from(get(control)),
    };
    Response::OkValue {
        method: descriptor.display,
        value,
    }
}

fn set_property(
    descriptor: &MethodDescriptor,
    value: Option<&Value>,
    control: &dyn RadioControl,
) -> Result<Response, Fault> {
    let value = value.ok_or_else(|| Fault::value("Value missing"))?;
    if descriptor.read_only() {
        return Err(Fault::new(ErrorKind::Method, "Read only"));
    }

    let applied = match &descriptor.access {
        Access::Bool { set, .. } => {
            let flag = value
                .as_bool()
                .ok_or_else(|| Fault::value("Expected a boolean"))?;
            set.as_ref().map(|f| f(control, flag))
        }
        Access::Int { min, max, set, .. } => {
            let number = value
                .as_i64()
                .ok_or_else(|| Fault::value("Expected an integer"))?;
            check_range(number, *min, *max)?;
            if descriptor.needs_tunable && !control.source_is_tunable() {
                return Err(Fault::new(ErrorKind::Source, "Not tunable"));
            }
            set.as_ref().map(|f| f(control, number))
        }
        Access::Enum { names, set, .. } => {
            let name = value
                .as_str()
                .ok_or_else(|| Fault::value("Expected a string"))?;
            let index = names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    Fault::value(format!("Expected one of {}", names.join(", ")))
                })?;
            set.as_ref().map(|f| f(control, index))
        }
    };

    match applied {
        Some(Ok(())) => Ok(Response::Ok),
        Some(Err(_)) => Err(Fault::new(ErrorKind::Set, "Could not set value")),
        // Unreachable for a writable descriptor; read_only() gated above.
        None => Err(Fault::new(ErrorKind::Method, "Read only")),
    }
}

fn check_range(value: i64, min: i64, max: i64) -> Result<(), Fault> {
    if value < min {
        return Err(Fault::value(format!("Smaller than {min}")));
    }
    if value > max {
        return Err(Fault::value(format!("Greater than {max}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{DetectorType, MockRadio, SetRejected};

    fn reply(outcome: Outcome) -> Response {
        match outcome {
            Outcome::Reply(response) => response,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    fn error_of(outcome: Outcome) -> (ErrorKind, String) {
        match reply(outcome) {
            Response::Error { kind, message } => (kind, message),
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let radio = MockRadio::new();
        let set = dispatch_frame(
            r#"{"command":"set","method":"audiogain","value":40}"#,
            &radio,
        );
        assert_eq!(set, Outcome::Reply(Response::Ok));

        let get = dispatch_frame(r#"{"command":"get","method":"audiogain"}"#, &radio);
        assert_eq!(
            reply(get),
            Response::OkValue {
                method: "AudioGain",
                value: 40.into(),
            }
        );
    }

    #[test]
    fn missing_command_key() {
        let radio = MockRadio::new();
        let (kind, message) = error_of(dispatch_frame(r#"{"method":"audiogain"}"#, &radio));
        assert_eq!(kind, ErrorKind::Command);
        assert_eq!(message, "Command key not found");
    }

    #[test]
    fn unknown_command_wins_over_unknown_method() {
        let radio = MockRadio::new();
        let (kind, message) =
            error_of(dispatch_frame(r#"{"command":"put","method":"nosuch"}"#, &radio));
        assert_eq!(kind, ErrorKind::Command);
        assert_eq!(message, "Unknown command: put");
    }

    #[test]
    fn missing_method_key() {
        let radio = MockRadio::new();
        let (kind, message) = error_of(dispatch_frame(r#"{"command":"get"}"#, &radio));
        assert_eq!(kind, ErrorKind::Method);
        assert_eq!(message, "Method key not found");
    }

    #[test]
    fn unknown_method_regardless_of_verb() {
        let radio = MockRadio::new();
        for verb in ["get", "set"] {
            let frame = format!(r#"{{"command":"{verb}","method":"volume"}}"#);
            let (kind, message) = error_of(dispatch_frame(&frame, &radio));
            assert_eq!(kind, ErrorKind::Method);
            assert_eq!(message, "Unknown method: volume");
        }
    }

    #[test]
    fn exe_verbs_do_not_resolve_for_get() {
        let radio = MockRadio::new();
        let (kind, message) =
            error_of(dispatch_frame(r#"{"command":"get","method":"start"}"#, &radio));
        assert_eq!(kind, ErrorKind::Method);
        assert_eq!(message, "Unknown method: start");
    }

    #[test]
    fn set_without_value() {
        let radio = MockRadio::new();
        let (kind, message) =
            error_of(dispatch_frame(r#"{"command":"set","method":"audiogain"}"#, &radio));
        assert_eq!(kind, ErrorKind::Value);
        assert_eq!(message, "Value missing");
    }

    #[test]
    fn value_type_mismatches_name_the_expected_kind() {
        let radio = MockRadio::new();
        let cases = [
            (r#"{"command":"set","method":"audiogain","value":true}"#, "Expected an integer"),
            (r#"{"command":"set","method":"audiogain","value":30.5}"#, "Expected an integer"),
            (r#"{"command":"set","method":"fmstereo","value":1}"#, "Expected a boolean"),
            (r#"{"command":"set","method":"detectortype","value":7}"#, "Expected a string"),
        ];
        for (frame, expected) in cases {
            let (kind, message) = error_of(dispatch_frame(frame, &radio));
            assert_eq!(kind, ErrorKind::Value, "{frame}");
            assert_eq!(message, expected, "{frame}");
        }
    }

    #[test]
    fn out_of_range_rejected_and_state_unchanged() {
        let radio = MockRadio::new();
        let before = radio.audio_gain();

        let (kind, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"audiogain","value":1000}"#,
            &radio,
        ));
        assert_eq!(kind, ErrorKind::Value);
        assert_eq!(message, "Greater than 60");

        let (_, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"audiogain","value":3}"#,
            &radio,
        ));
        assert_eq!(message, "Smaller than 25");

        assert_eq!(radio.audio_gain(), before);
    }

    #[test]
    fn frequency_accepts_64_bit_values() {
        let radio = MockRadio::new();
        let set = dispatch_frame(
            r#"{"command":"set","method":"frequency","value":144800000000}"#,
            &radio,
        );
        assert_eq!(set, Outcome::Reply(Response::Ok));
        assert_eq!(radio.frequency(), 144_800_000_000);
    }

    #[test]
    fn frequency_set_requires_tunable_source() {
        let radio = MockRadio::fixed_source();
        for method in ["frequency", "centrefrequency"] {
            let frame = format!(r#"{{"command":"set","method":"{method}","value":100000000}}"#);
            let (kind, message) = error_of(dispatch_frame(&frame, &radio));
            assert_eq!(kind, ErrorKind::Source);
            assert_eq!(message, "Not tunable");
        }
        // Reads stay available on a fixed source.
        let get = dispatch_frame(r#"{"command":"get","method":"frequency"}"#, &radio);
        assert!(matches!(reply(get), Response::OkValue { .. }));
    }

    #[test]
    fn detector_type_matches_case_insensitively() {
        let radio = MockRadio::new();
        // The codec lower-cases the whole frame, so the name arrives as "nfm".
        let set = dispatch_frame(
            r#"{"command":"set","method":"detectortype","value":"NFM"}"#,
            &radio,
        );
        assert_eq!(set, Outcome::Reply(Response::Ok));
        assert_eq!(radio.detector_type(), DetectorType::Nfm);

        let get = dispatch_frame(r#"{"command":"get","method":"detectortype"}"#, &radio);
        assert_eq!(
            reply(get),
            Response::OkValue {
                method: "DetectorType",
                value: "NFM".into(),
            }
        );
    }

    #[test]
    fn unknown_enum_name_lists_the_choices() {
        let radio = MockRadio::new();
        let (kind, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"detectortype","value":"ssb"}"#,
            &radio,
        ));
        assert_eq!(kind, ErrorKind::Value);
        assert_eq!(
            message,
            "Expected one of AM, CW, DSB, LSB, USB, NFM, RAW, WFM"
        );
    }

    #[test]
    fn read_only_set_is_a_method_error() {
        let radio = MockRadio::new();
        let (kind, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"isplaying","value":true}"#,
            &radio,
        ));
        assert_eq!(kind, ErrorKind::Method);
        assert_eq!(message, "Read only");
    }

    #[test]
    fn exe_start_stop_reply_empty_ok() {
        let radio = MockRadio::new();
        let start = dispatch_frame(r#"{"command":"exe","method":"start"}"#, &radio);
        assert_eq!(start, Outcome::Reply(Response::Ok));
        assert!(radio.is_playing());

        let stop = dispatch_frame(r#"{"command":"exe","method":"stop"}"#, &radio);
        assert_eq!(stop, Outcome::Reply(Response::Ok));
        assert!(!radio.is_playing());
    }

    #[test]
    fn exe_close_is_a_session_signal() {
        let radio = MockRadio::new();
        let outcome = dispatch_frame(r#"{"command":"exe","method":"close"}"#, &radio);
        assert_eq!(outcome, Outcome::CloseSession);
    }

    #[test]
    fn exe_with_property_method_is_rejected() {
        let radio = MockRadio::new();
        let (kind, message) =
            error_of(dispatch_frame(r#"{"command":"exe","method":"audiogain"}"#, &radio));
        assert_eq!(kind, ErrorKind::Method);
        assert_eq!(message, "Unknown Exe method: audiogain");
    }

    #[test]
    fn shape_failure_echoes_sanitized_text() {
        let radio = MockRadio::new();
        let (kind, message) = error_of(dispatch_frame(r#"{"command":[1]}"#, &radio));
        assert_eq!(kind, ErrorKind::Syntax);
        assert_eq!(message, r#"{"command":[1]}"#);
    }

    #[test]
    fn garbage_and_null_have_no_reply() {
        let radio = MockRadio::new();
        assert_eq!(dispatch_frame("not json at all", &radio), Outcome::Garbage);
        assert_eq!(dispatch_frame("null", &radio), Outcome::Silent);
    }

    #[test]
    fn set_rejected_by_the_radio_maps_to_set_error() {
        struct Stubborn(MockRadio);
        impl RadioControl for Stubborn {
            fn set_audio_gain(&self, _gain: i32) -> Result<(), SetRejected> {
                Err(SetRejected)
            }
            fn audio_gain(&self) -> i32 {
                self.0.audio_gain()
            }
            fn audio_is_muted(&self) -> bool {
                self.0.audio_is_muted()
            }
            fn set_audio_is_muted(&self, muted: bool) -> Result<(), SetRejected> {
                self.0.set_audio_is_muted(muted)
            }
            fn center_frequency(&self) -> i64 {
                self.0.center_frequency()
            }
            fn set_center_frequency(&self, hz: i64) -> Result<(), SetRejected> {
                self.0.set_center_frequency(hz)
            }
            fn frequency(&self) -> i64 {
                self.0.frequency()
            }
            fn set_frequency(&self, hz: i64) -> Result<(), SetRejected> {
                self.0.set_frequency(hz)
            }
            fn detector_type(&self) -> DetectorType {
                self.0.detector_type()
            }
            fn set_detector_type(&self, detector: DetectorType) -> Result<(), SetRejected> {
                self.0.set_detector_type(detector)
            }
            fn is_playing(&self) -> bool {
                self.0.is_playing()
            }
            fn source_is_tunable(&self) -> bool {
                self.0.source_is_tunable()
            }
            fn squelch_enabled(&self) -> bool {
                self.0.squelch_enabled()
            }
            fn set_squelch_enabled(&self, enabled: bool) -> Result<(), SetRejected> {
                self.0.set_squelch_enabled(enabled)
            }
            fn squelch_threshold(&self) -> i32 {
                self.0.squelch_threshold()
            }
            fn set_squelch_threshold(&self, threshold: i32) -> Result<(), SetRejected> {
                self.0.set_squelch_threshold(threshold)
            }
            fn fm_stereo(&self) -> bool {
                self.0.fm_stereo()
            }
            fn set_fm_stereo(&self, stereo: bool) -> Result<(), SetRejected> {
                self.0.set_fm_stereo(stereo)
            }
            fn filter_type(&self) -> i32 {
                self.0.filter_type()
            }
            fn set_filter_type(&self, window: i32) -> Result<(), SetRejected> {
                self.0.set_filter_type(window)
            }
            fn filter_bandwidth(&self) -> i32 {
                self.0.filter_bandwidth()
            }
            fn set_filter_bandwidth(&self, hz: i32) -> Result<(), SetRejected> {
                self.0.set_filter_bandwidth(hz)
            }
            fn filter_order(&self) -> i32 {
                self.0.filter_order()
            }
            fn set_filter_order(&self, order: i32) -> Result<(), SetRejected> {
                self.0.set_filter_order(order)
            }
            fn start_radio(&self) {
                self.0.start_radio()
            }
            fn stop_radio(&self) {
                self.0.stop_radio()
            }
        }

        let radio = Stubborn(MockRadio::new());
        let (kind, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"audiogain","value":30}"#,
            &radio,
        ));
        assert_eq!(kind, ErrorKind::Set);
        assert_eq!(message, "Could not set value");
    }

    #[test]
    fn filter_type_range_tracks_window_cardinality() {
        let radio = MockRadio::new();
        let ok = dispatch_frame(r#"{"command":"set","method":"filtertype","value":7}"#, &radio);
        assert_eq!(ok, Outcome::Reply(Response::Ok));

        let (_, message) = error_of(dispatch_frame(
            r#"{"command":"set","method":"filtertype","value":8}"#,
            &radio,
        ));
        assert_eq!(message, "Greater than 7");
    }
}

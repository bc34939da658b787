//! The radio-control seam.
//!
//! [`RadioControl`] is the capability interface the dispatch layer calls
//! into; the host application implements it over whatever device API it
//! owns. Every accessor takes `&self` so one control handle can be shared
//! across connection tasks; interior thread-safety is the implementor's
//! contract.

use thiserror::Error;

pub mod mock;

pub use mock::MockRadio;

/// Returned by a setter when the radio rejects a value at apply time,
/// even though it passed protocol-level validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not set value")]
pub struct SetRejected;

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Case-insensitive lookup by wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(name))
            }
        }
    };
}

named_enum! {
    /// Demodulator selection exposed through the `detectortype` method.
    DetectorType {
        Am => "AM",
        Cw => "CW",
        Dsb => "DSB",
        Lsb => "LSB",
        Usb => "USB",
        Nfm => "NFM",
        Raw => "RAW",
        Wfm => "WFM",
    }
}

named_enum! {
    /// FIR window selection behind the integer `filtertype` method. Only the
    /// cardinality matters on the wire: valid values are `1..=COUNT`.
    FilterWindow {
        None => "None",
        Hamming => "Hamming",
        Blackman => "Blackman",
        BlackmanHarris4 => "BlackmanHarris4",
        BlackmanHarris7 => "BlackmanHarris7",
        HannPoisson => "HannPoisson",
        Youssef => "Youssef",
    }
}

impl FilterWindow {
    pub const COUNT: i64 = Self::ALL.len() as i64;
}

/// Typed property accessors of the controlled radio.
///
/// Getters are infallible; setters may reject a value the device cannot
/// apply, which the dispatcher reports as a `Set error`.
pub trait RadioControl: Send + Sync {
    fn audio_gain(&self) -> i32;
    fn set_audio_gain(&self, gain: i32) -> Result<(), SetRejected>;

    fn audio_is_muted(&self) -> bool;
    fn set_audio_is_muted(&self, muted: bool) -> Result<(), SetRejected>;

    fn center_frequency(&self) -> i64;
    fn set_center_frequency(&self, hz: i64) -> Result<(), SetRejected>;

    fn frequency(&self) -> i64;
    fn set_frequency(&self, hz: i64) -> Result<(), SetRejected>;

    fn detector_type(&self) -> DetectorType;
    fn set_detector_type(&self, detector: DetectorType) -> Result<(), SetRejected>;

    fn is_playing(&self) -> bool;

    /// Whether the signal source can be retuned; gates the frequency setters.
    fn source_is_tunable(&self) -> bool;

    fn squelch_enabled(&self) -> bool;
    fn set_squelch_enabled(&self, enabled: bool) -> Result<(), SetRejected>;

    fn squelch_threshold(&self) -> i32;
    fn set_squelch_threshold(&self, threshold: i32) -> Result<(), SetRejected>;

    fn fm_stereo(&self) -> bool;
    fn set_fm_stereo(&self, stereo: bool) -> Result<(), SetRejected>;

    fn filter_type(&self) -> i32;
    fn set_filter_type(&self, window: i32) -> Result<(), SetRejected>;

    fn filter_bandwidth(&self) -> i32;
    fn set_filter_bandwidth(&self, hz: i32) -> Result<(), SetRejected>;

    fn filter_order(&self) -> i32;
    fn set_filter_order(&self, order: i32) -> Result<(), SetRejected>;

    fn start_radio(&self);
    fn stop_radio(&self);
}

//! The fixed method registry.
//!
//! Every remotely addressable radio property is one [`MethodDescriptor`]:
//! a lower-case lookup key, a display name for `get` replies, and a typed
//! accessor pair into [`RadioControl`]. The table is immutable and built
//! once; `start`/`stop`/`close` are `exe`-only verbs handled by the
//! dispatcher and deliberately absent here.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::control::{DetectorType, FilterWindow, RadioControl, SetRejected};

const FREQUENCY_MIN: i64 = 1;
const FREQUENCY_MAX: i64 = 999_999_999_999;

type GetBool = fn(&dyn RadioControl) -> bool;
type SetBool = fn(&dyn RadioControl, bool) -> Result<(), SetRejected>;
type GetInt = fn(&dyn RadioControl) -> i64;
type SetInt = fn(&dyn RadioControl, i64) -> Result<(), SetRejected>;
type GetEnum = fn(&dyn RadioControl) -> &'static str;
type SetEnum = fn(&dyn RadioControl, usize) -> Result<(), SetRejected>;

/// Value kind, validation rule and bound accessors, in one place so the
/// dispatcher cannot pair a check with the wrong setter. A `None` setter
/// marks the property read-only.
pub enum Access {
    Bool {
        get: GetBool,
        set: Option<SetBool>,
    },
    Int {
        min: i64,
        max: i64,
        get: GetInt,
        set: Option<SetInt>,
    },
    /// String-valued properties matched case-insensitively against a fixed
    /// name set; the setter receives the matched index.
    Enum {
        names: &'static [&'static str],
        get: GetEnum,
        set: Option<SetEnum>,
    },
}

pub struct MethodDescriptor {
    /// Lower-case wire name, the registry key.
    pub name: &'static str,
    /// Name echoed in `get` replies.
    pub display: &'static str,
    /// Setting this property requires the source to report tunable.
    pub needs_tunable: bool,
    pub access: Access,
}

impl MethodDescriptor {
    pub fn read_only(&self) -> bool {
        match &self.access {
            Access::Bool { set, .. } => set.is_none(),
            Access::Int { set, .. } => set.is_none(),
            Access::Enum { set, .. } => set.is_none(),
        }
    }
}

pub static REGISTRY: LazyLock<HashMap<&'static str, MethodDescriptor>> = LazyLock::new(build);

pub fn lookup(method: &str) -> Option<&'static MethodDescriptor> {
    REGISTRY.get(method)
}

fn build() -> HashMap<&'static str, MethodDescriptor> {
    let methods = [
        MethodDescriptor {
            name: "audiogain",
            display: "AudioGain",
            needs_tunable: false,
            access: Access::Int {
                min: 25,
                max: 60,
                get: |c| i64::from(c.audio_gain()),
                set: Some(|c, v| c.set_audio_gain(v as i32)),
            },
        },
        MethodDescriptor {
            name: "audioismuted",
            display: "AudioIsMuted",
            needs_tunable: false,
            access: Access::Bool {
                get: |c| c.audio_is_muted(),
                set: Some(|c, v| c.set_audio_is_muted(v)),
            },
        },
        MethodDescriptor {
            name: "centrefrequency",
            display: "CenterFrequency",
            needs_tunable: true,
            access: Access::Int {
                min: FREQUENCY_MIN,
                max: FREQUENCY_MAX,
                get: |c| c.center_frequency(),
                set: Some(|c, v| c.set_center_frequency(v)),
            },
        },
        MethodDescriptor {
            name: "frequency",
            display: "Frequency",
            needs_tunable: true,
            access: Access::Int {
                min: FREQUENCY_MIN,
                max: FREQUENCY_MAX,
                get: |c| c.frequency(),
                set: Some(|c, v| c.set_frequency(v)),
            },
        },
        MethodDescriptor {
            name: "detectortype",
            display: "DetectorType",
            needs_tunable: false,
            access: Access::Enum {
                names: DetectorType::NAMES,
                get: |c| c.detector_type().name(),
                set: Some(|c, index| c.set_detector_type(DetectorType::ALL[index])),
            },
        },
        MethodDescriptor {
            name: "isplaying",
            display: "IsPlaying",
            needs_tunable: false,
            access: Access::Bool {
                get: |c| c.is_playing(),
                set: None,
            },
        },
        MethodDescriptor {
            name: "sourceistunable",
            display: "SourceIsTunable",
            needs_tunable: false,
            access: Access::Bool {
                get: |c| c.source_is_tunable(),
                set: None,
            },
        },
        MethodDescriptor {
            name: "squelchenabled",
            display: "SquelchEnabled",
            needs_tunable: false,
            access: Access::Bool {
                get: |c| c.squelch_enabled(),
                set: Some(|c, v| c.set_squelch_enabled(v)),
            },
        },
        MethodDescriptor {
            name: "squelchthreshold",
            display: "SquelchThreshold",
            needs_tunable: false,
            access: Access::Int {
                min: 0,
                max: 100,
                get: |c| i64::from(c.squelch_threshold()),
                set: Some(|c, v| c.set_squelch_threshold(v as i32)),
            },
        },
        MethodDescriptor {
            name: "fmstereo",
            display: "FmStereo",
            needs_tunable: false,
            access: Access::Bool {
                get: |c| c.fm_stereo(),
                set: Some(|c, v| c.set_fm_stereo(v)),
            },
        },
        MethodDescriptor {
            name: "filtertype",
            display: "FilterType",
            needs_tunable: false,
            access: Access::Int {
                min: 1,
                max: FilterWindow::COUNT,
                get: |c| i64::from(c.filter_type()),
                set: Some(|c, v| c.set_filter_type(v as i32)),
            },
        },
        MethodDescriptor {
            name: "filterbandwidth",
            display: "FilterBandwidth",
            needs_tunable: false,
            access: Access::Int {
                min: 10,
                max: 250_000,
                get: |c| i64::from(c.filter_bandwidth()),
                set: Some(|c, v| c.set_filter_bandwidth(v as i32)),
            },
        },
        MethodDescriptor {
            name: "filterorder",
            display: "FilterOrder",
            needs_tunable: false,
            access: Access::Int {
                min: 10,
                max: 9999,
                get: |c| i64::from(c.filter_order()),
                set: Some(|c, v| c.set_filter_order(v as i32)),
            },
        },
    ];

    methods.into_iter().map(|m| (m.name, m)).collect()
}

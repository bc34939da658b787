//! In-memory radio for tests and for running the daemon without hardware.

use std::sync::Mutex;

use super::{DetectorType, RadioControl, SetRejected};

#[derive(Debug, Clone)]
struct State {
    audio_gain: i32,
    audio_is_muted: bool,
    center_frequency: i64,
    frequency: i64,
    detector_type: DetectorType,
    is_playing: bool,
    source_is_tunable: bool,
    squelch_enabled: bool,
    squelch_threshold: i32,
    fm_stereo: bool,
    filter_type: i32,
    filter_bandwidth: i32,
    filter_order: i32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            audio_gain: 30,
            audio_is_muted: false,
            center_frequency: 97_000_000,
            frequency: 97_000_000,
            detector_type: DetectorType::Wfm,
            is_playing: false,
            source_is_tunable: true,
            squelch_enabled: false,
            squelch_threshold: 50,
            fm_stereo: true,
            filter_type: 1,
            filter_bandwidth: 180_000,
            filter_order: 500,
        }
    }
}

/// A plain mutex-backed [`RadioControl`] with sensible FM-broadcast defaults.
#[derive(Debug, Default)]
pub struct MockRadio {
    state: Mutex<State>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// A radio whose source refuses retuning, for exercising the
    /// `Source error` path.
    pub fn fixed_source() -> Self {
        let radio = Self::new();
        radio.state.lock().unwrap().source_is_tunable = false;
        radio
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    fn write(&self, f: impl FnOnce(&mut State)) -> Result<(), SetRejected> {
        f(&mut self.state.lock().unwrap());
        Ok(())
    }
}

impl RadioControl for MockRadio {
    fn audio_gain(&self) -> i32 {
        self.read(|s| s.audio_gain)
    }

    fn set_audio_gain(&self, gain: i32) -> Result<(), SetRejected> {
        self.write(|s| s.audio_gain = gain)
    }

    fn audio_is_muted(&self) -> bool {
        self.read(|s| s.audio_is_muted)
    }

    fn set_audio_is_muted(&self, muted: bool) -> Result<(), SetRejected> {
        self.write(|s| s.audio_is_muted = muted)
    }

    fn center_frequency(&self) -> i64 {
        self.read(|s| s.center_frequency)
    }

    fn set_center_frequency(&self, hz: i64) -> Result<(), SetRejected> {
        self.write(|s| s.center_frequency = hz)
    }

    fn frequency(&self) -> i64 {
        self.read(|s| s.frequency)
    }

    fn set_frequency(&self, hz: i64) -> Result<(), SetRejected> {
        self.write(|s| s.frequency = hz)
    }

    fn detector_type(&self) -> DetectorType {
        self.read(|s| s.detector_type)
    }

    fn set_detector_type(&self, detector: DetectorType) -> Result<(), SetRejected> {
        self.write(|s| s.detector_type = detector)
    }

    fn is_playing(&self) -> bool {
        self.read(|s| s.is_playing)
    }

    fn source_is_tunable(&self) -> bool {
        self.read(|s| s.source_is_tunable)
    }

    fn squelch_enabled(&self) -> bool {
        self.read(|s| s.squelch_enabled)
    }

    fn set_squelch_enabled(&self, enabled: bool) -> Result<(), SetRejected> {
        self.write(|s| s.squelch_enabled = enabled)
    }

    fn squelch_threshold(&self) -> i32 {
        self.read(|s| s.squelch_threshold)
    }

    fn set_squelch_threshold(&self, threshold: i32) -> Result<(), SetRejected> {
        self.write(|s| s.squelch_threshold = threshold)
    }

    fn fm_stereo(&self) -> bool {
        self.read(|s| s.fm_stereo)
    }

    fn set_fm_stereo(&self, stereo: bool) -> Result<(), SetRejected> {
        self.write(|s| s.fm_stereo = stereo)
    }

    fn filter_type(&self) -> i32 {
        self.read(|s| s.filter_type)
    }

    fn set_filter_type(&self, window: i32) -> Result<(), SetRejected> {
        self.write(|s| s.filter_type = window)
    }

    fn filter_bandwidth(&self) -> i32 {
        self.read(|s| s.filter_bandwidth)
    }

    fn set_filter_bandwidth(&self, hz: i32) -> Result<(), SetRejected> {
        self.write(|s| s.filter_bandwidth = hz)
    }

    fn filter_order(&self) -> i32 {
        self.read(|s| s.filter_order)
    }

    fn set_filter_order(&self, order: i32) -> Result<(), SetRejected> {
        self.write(|s| s.filter_order = order)
    }

    fn start_radio(&self) {
        let _ = self.write(|s| s.is_playing = true);
    }

    fn stop_radio(&self) {
        let _ = self.write(|s| s.is_playing = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_stop_toggle_playing() {
        let radio = MockRadio::new();
        assert!(!radio.is_playing());
        radio.start_radio();
        assert!(radio.is_playing());
        radio.stop_radio();
        assert!(!radio.is_playing());
    }

    #[test]
    fn fixed_source_is_not_tunable() {
        assert!(!MockRadio::fixed_source().source_is_tunable());
        assert!(MockRadio::new().source_is_tunable());
    }
}

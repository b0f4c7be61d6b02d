//! Haptic feedback: semantic patterns mapped onto a vibration primitive.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticPattern {
    #[default]
    Light,
    Medium,
    Heavy,
    Selection,
    Success,
    Warning,
    Error,
}

impl HapticPattern {
    /// Alternating vibrate/pause durations in ms.
    pub fn durations(self) -> &'static [u32] {
        match self {
            HapticPattern::Light => &[10],
            HapticPattern::Medium => &[20],
            HapticPattern::Heavy => &[40],
            HapticPattern::Selection => &[5],
            HapticPattern::Success => &[10, 50, 10],
            HapticPattern::Warning => &[20, 100, 20],
            HapticPattern::Error => &[30, 100, 30, 100, 30],
        }
    }
}

/// A named pattern or a raw vibrate/pause sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HapticRequest {
    Pattern(HapticPattern),
    Raw(Vec<u32>),
}

impl Default for HapticRequest {
    fn default() -> Self {
        HapticRequest::Pattern(HapticPattern::default())
    }
}

impl HapticRequest {
    pub fn durations(&self) -> &[u32] {
        match self {
            HapticRequest::Pattern(p) => p.durations(),
            HapticRequest::Raw(raw) => raw,
        }
    }
}

impl From<HapticPattern> for HapticRequest {
    fn from(p: HapticPattern) -> Self {
        HapticRequest::Pattern(p)
    }
}

impl From<Vec<u32>> for HapticRequest {
    fn from(raw: Vec<u32>) -> Self {
        HapticRequest::Raw(raw)
    }
}

impl From<&[u32]> for HapticRequest {
    fn from(raw: &[u32]) -> Self {
        HapticRequest::Raw(raw.to_vec())
    }
}

/// Platform vibration primitive.
pub trait Vibrator {
    /// Presence of the primitive; says nothing about user permission.
    fn is_supported(&self) -> bool;
    /// Returns whether the platform accepted the request.
    fn vibrate(&self, durations: &[u32]) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct HapticDispatcher<V: Vibrator> {
    vibrator: V,
}

impl<V: Vibrator> HapticDispatcher<V> {
    pub fn new(vibrator: V) -> Self {
        Self { vibrator }
    }

    pub fn is_supported(&self) -> bool {
        self.vibrator.is_supported()
    }

    /// `true` if a vibration request was issued, not that it was felt.
    pub fn trigger(&self, request: impl Into<HapticRequest>) -> bool {
        let request = request.into();
        if !self.vibrator.is_supported() {
            log::debug!("haptics unsupported, {request:?} skipped");
            return false;
        }
        let durations = request.durations();
        if durations.iter().all(|d| *d == 0) {
            // vibrate([]) / vibrate(0) cancels rather than vibrates.
            log::debug!("empty haptic pattern skipped");
            return false;
        }
        let issued = self.vibrator.vibrate(durations);
        if !issued {
            log::debug!("vibration request refused");
        }
        issued
    }
}

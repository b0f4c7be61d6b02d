use std::future::Future;

use js_sys::{Array, Reflect};
use wasm_bindgen::JsValue;

use crate::haptics::{HapticDispatcher, HapticRequest, Vibrator};

/// `navigator.vibrate`, where the browser has it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavigatorVibrator;

fn navigator() -> Option<web_sys::Navigator> {
    web_sys::window().map(|w| w.navigator())
}

impl Vibrator for NavigatorVibrator {
    fn is_supported(&self) -> bool {
        navigator().is_some_and(|nav| {
            Reflect::has(nav.as_ref(), &JsValue::from_str("vibrate")).unwrap_or(false)
        })
    }

    fn vibrate(&self, durations: &[u32]) -> bool {
        let Some(nav) = navigator() else {
            return false;
        };
        match durations {
            [single] => nav.vibrate_with_duration(*single),
            _ => {
                let pattern: Array = durations
                    .iter()
                    .map(|d| JsValue::from_f64(f64::from(*d)))
                    .collect();
                nav.vibrate_with_pattern(&pattern)
            }
        }
    }
}

pub fn is_haptic_supported() -> bool {
    NavigatorVibrator.is_supported()
}

/// Issues the vibration right away; the returned future resolves to whether
/// it was issued. Never fails.
pub fn trigger_haptic(request: impl Into<HapticRequest>) -> impl Future<Output = bool> {
    let issued = HapticDispatcher::new(NavigatorVibrator).trigger(request.into());
    std::future::ready(issued)
}

use serde::Serialize;

use crate::constants::MULTI_PRESS_WINDOW_MS;

#[derive(Clone, Debug, Default, Serialize)]
pub struct KeyState {
    #[serde(rename = "isDown")]
    pub is_down: bool,
    #[serde(rename = "downTime")]
    pub down_time: u64,
    #[serde(rename = "upTime")]
    pub up_time: u64,
    #[serde(rename = "pressCount")]
    pub press_count: u32,
    #[serde(rename = "lastPressTime")]
    pub last_press_time: Option<u64>,
}

/// Per-tick key signal produced by [`InputRecorder::poll`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySignal {
    Hold { key: String, duration_ms: u64 },
    MultiPress { key: String, count: u32 },
}

/// Tracks down/up timestamps per key and derives holds and multi-taps.
/// Keys are kept in first-seen order so per-tick dispatch is stable.
#[derive(Clone, Debug, Default)]
pub struct InputRecorder {
    keys: Vec<(String, KeyState)>,
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, key: &str) -> &mut KeyState {
        let idx = match self.keys.iter().position(|(name, _)| name == key) {
            Some(idx) => idx,
            None => {
                self.keys.push((key.to_string(), KeyState::default()));
                self.keys.len() - 1
            }
        };
        &mut self.keys[idx].1
    }

    /// Records a key going down. Returns the press count to dispatch, or
    /// `None` for auto-repeat while the key is already held.
    pub fn key_down(&mut self, key: &str, now_ms: u64) -> Option<u32> {
        let state = self.entry(key);
        if state.is_down {
            return None;
        }
        state.is_down = true;
        state.down_time = now_ms;
        let within_window = state
            .last_press_time
            .is_some_and(|last| now_ms.saturating_sub(last) < MULTI_PRESS_WINDOW_MS);
        state.press_count = if within_window {
            state.press_count + 1
        } else {
            1
        };
        state.last_press_time = Some(now_ms);
        Some(state.press_count)
    }

    /// Records a key going up. Returns the hold duration, or `None` if the
    /// key was not down.
    pub fn key_up(&mut self, key: &str, now_ms: u64) -> Option<u64> {
        let state = self.entry(key);
        if !state.is_down {
            return None;
        }
        state.is_down = false;
        state.up_time = now_ms;
        Some(now_ms.saturating_sub(state.down_time))
    }

    pub fn is_down(&self, key: &str) -> bool {
        self.keys
            .iter()
            .any(|(name, state)| name == key && state.is_down)
    }

    pub fn state(&self, key: &str) -> Option<&KeyState> {
        self.keys
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, state)| state)
    }

    /// Emits hold signals for every held key and at most one multi-press
    /// signal per key, resetting that key's press count once it fires.
    pub fn poll(&mut self, now_ms: u64) -> Vec<KeySignal> {
        let mut signals = Vec::new();
        for (key, state) in &mut self.keys {
            if state.is_down {
                signals.push(KeySignal::Hold {
                    key: key.clone(),
                    duration_ms: now_ms.saturating_sub(state.down_time),
                });
            }
            let recent = state
                .last_press_time
                .is_some_and(|last| now_ms.saturating_sub(last) < MULTI_PRESS_WINDOW_MS);
            if state.press_count >= 2 && recent {
                signals.push(KeySignal::MultiPress {
                    key: key.clone(),
                    count: state.press_count,
                });
                state.press_count = 0;
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::{InputRecorder, KeySignal};

    fn tap(recorder: &mut InputRecorder, key: &str, at: u64) -> Option<u32> {
        let count = recorder.key_down(key, at);
        recorder.key_up(key, at + 10);
        count
    }

    #[test]
    fn second_tap_inside_window_counts_as_double() {
        let mut recorder = InputRecorder::new();
        assert_eq!(tap(&mut recorder, "a", 1_000), Some(1));
        assert_eq!(tap(&mut recorder, "a", 1_299), Some(2));
        let signals = recorder.poll(1_310);
        assert_eq!(
            signals,
            vec![KeySignal::MultiPress {
                key: "a".to_string(),
                count: 2
            }]
        );
        assert!(recorder.poll(1_320).is_empty());
    }

    #[test]
    fn second_tap_outside_window_restarts_count() {
        let mut recorder = InputRecorder::new();
        tap(&mut recorder, "a", 1_000);
        assert_eq!(tap(&mut recorder, "a", 1_301), Some(1));
        assert!(recorder.poll(1_310).is_empty());
    }

    #[test]
    fn first_press_at_clock_zero_is_single() {
        let mut recorder = InputRecorder::new();
        assert_eq!(recorder.key_down("w", 0), Some(1));
    }

    #[test]
    fn auto_repeat_is_ignored() {
        let mut recorder = InputRecorder::new();
        assert_eq!(recorder.key_down("e", 100), Some(1));
        assert_eq!(recorder.key_down("e", 140), None);
        assert_eq!(recorder.key_up("e", 1_250), Some(1_150));
        assert_eq!(recorder.key_up("e", 1_260), None);
    }

    #[test]
    fn held_key_reports_duration_each_poll() {
        let mut recorder = InputRecorder::new();
        recorder.key_down("s", 500);
        assert_eq!(
            recorder.poll(1_700),
            vec![KeySignal::Hold {
                key: "s".to_string(),
                duration_ms: 1_200
            }]
        );
        assert!(recorder.is_down("s"));
        assert!(!recorder.is_down("a"));
    }

    #[test]
    fn stale_multi_press_is_not_dispatched() {
        let mut recorder = InputRecorder::new();
        tap(&mut recorder, "d", 0);
        tap(&mut recorder, "d", 100);
        assert!(recorder.poll(450).is_empty());
        assert_eq!(recorder.state("d").map(|s| s.press_count), Some(2));
    }
}

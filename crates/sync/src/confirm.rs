//! Double-tap confirmation for destructive actions.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    /// First tap; the same key must be tapped again inside the window.
    Armed,
    Confirmed,
}

#[derive(Debug)]
pub struct Confirmation {
    window: Duration,
    pending: Mutex<Option<(String, Instant)>>,
}

impl Default for Confirmation {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Confirmation {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn tap(&self, key: &str) -> Tap {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();

        match pending.take() {
            Some((armed, at)) if armed == key && now.duration_since(at) < self.window => {
                Tap::Confirmed
            }
            _ => {
                *pending = Some((key.to_string(), now));
                Tap::Armed
            }
        }
    }

    /// The armed key, if it has not expired.
    pub fn pending(&self) -> Option<String> {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        match pending.as_ref() {
            Some((key, at)) if at.elapsed() < self.window => Some(key.clone()),
            Some(_) => {
                *pending = None;
                None
            }
            None => None,
        }
    }

    pub fn clear(&self) {
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

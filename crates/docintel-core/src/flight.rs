//! Single-flight request guard.
//!
//! A flow may have at most one request outstanding. Later submissions are
//! rejected rather than queued. The guard is acquired before the first
//! suspension point and released when the returned permit is dropped, so
//! every exit path (success, failure, panic, or a dropped future) returns
//! the flow to `Idle`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-flow transient request state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Idle => write!(f, "Idle"),
            RequestState::InFlight => write!(f, "InFlight"),
        }
    }
}

/// Single-slot guard shared by all handles of one flow.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        if self.busy.load(Ordering::Acquire) {
            RequestState::InFlight
        } else {
            RequestState::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state() == RequestState::Idle
    }

    /// Check-and-set the slot. Returns `None` if a request is already in flight.
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Proof that the holder owns the flow's slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let flight = SingleFlight::new();
        assert_eq!(flight.state(), RequestState::Idle);
        assert!(flight.is_idle());
    }

    #[test]
    fn test_second_acquire_is_rejected() {
        let flight = SingleFlight::new();
        let permit = flight.try_acquire();
        assert!(permit.is_some());
        assert_eq!(flight.state(), RequestState::InFlight);
        assert!(flight.try_acquire().is_none());
    }

    #[test]
    fn test_drop_releases_slot() {
        let flight = SingleFlight::new();
        {
            let _permit = flight.try_acquire().unwrap();
            assert!(!flight.is_idle());
        }
        assert!(flight.is_idle());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let flight = SingleFlight::new();
        let other = flight.clone();
        let _permit = flight.try_acquire().unwrap();
        assert_eq!(other.state(), RequestState::InFlight);
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn test_panic_while_holding_permit_releases_slot() {
        let flight = SingleFlight::new();
        let inner = flight.clone();
        let result = std::panic::catch_unwind(move || {
            let _permit = inner.try_acquire().unwrap();
            panic!("bookkeeping fault");
        });
        assert!(result.is_err());
        assert!(flight.is_idle());
    }

    #[test]
    fn test_request_state_display() {
        assert_eq!(RequestState::Idle.to_string(), "Idle");
        assert_eq!(RequestState::InFlight.to_string(), "InFlight");
    }
}

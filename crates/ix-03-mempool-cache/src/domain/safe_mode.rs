//! # Safe-Mode Gate
//!
//! Caches the node's safe-mode flag. The feed worker refreshes it at most
//! once per poll interval, checked whenever a message arrives.
//!
//! A poll that fails leaves the flag as it was under [`SafeModePolicy::FailOpen`]
//! (the default) and closes the gate under [`SafeModePolicy::FailClosed`].
//! The gate starts open.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::errors::MempoolError;

/// What a failed health poll does to the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafeModePolicy {
    #[default]
    FailOpen,
    FailClosed,
}

#[derive(Debug)]
pub struct SafeModeGate {
    in_safe_mode: AtomicBool,
    last_poll_ms: Mutex<Option<u64>>,
    interval: Duration,
    policy: SafeModePolicy,
}

impl SafeModeGate {
    pub fn new(interval: Duration, policy: SafeModePolicy) -> Self {
        Self {
            in_safe_mode: AtomicBool::new(false),
            last_poll_ms: Mutex::new(None),
            interval,
            policy,
        }
    }

    /// Whether new pending transactions may be queued.
    pub fn accepts_ingestion(&self) -> bool {
        !self.in_safe_mode()
    }

    pub fn in_safe_mode(&self) -> bool {
        self.in_safe_mode.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> SafeModePolicy {
        self.policy
    }

    /// True if no poll happened yet or the last one is older than the interval.
    pub fn poll_due(&self, now_ms: u64) -> bool {
        match *self.last_poll_ms.lock() {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval.as_millis() as u64,
        }
    }

    /// Apply a poll result and return the flag now in effect.
    pub fn record_poll(&self, now_ms: u64, result: &Result<bool, MempoolError>) -> bool {
        *self.last_poll_ms.lock() = Some(now_ms);
        match (result, self.policy) {
            (Ok(flag), _) => self.in_safe_mode.store(*flag, Ordering::Release),
            (Err(_), SafeModePolicy::FailClosed) => self.in_safe_mode.store(true, Ordering::Release),
            (Err(_), SafeModePolicy::FailOpen) => {}
        }
        self.in_safe_mode()
    }
}

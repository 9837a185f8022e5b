//! Process lifecycle state shared by everything that reacts to an interrupt

use std::sync::atomic::{AtomicU8, Ordering};

/// `Idle --interrupt--> Handling --exit--> Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    Handling = 1,
    Terminated = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Handling,
            _ => LifecycleState::Terminated,
        }
    }
}

/// One-shot latch guarding the interrupt handler
#[derive(Debug)]
pub struct ShutdownLatch {
    state: AtomicU8,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Idle as u8),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move `Idle -> Handling`. Only the first caller gets `true`.
    pub fn trigger(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Idle as u8,
                LifecycleState::Handling as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move `Handling -> Terminated`. Returns `false` from any other state.
    pub fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Handling as u8,
                LifecycleState::Terminated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == LifecycleState::Idle
    }
}

impl Default for ShutdownLatch {
    fn default() -> Self {
        Self::new()
    }
}

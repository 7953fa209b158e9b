//! Lifecycle state machine.
//!
//! Startup is bracketed by four checkpoints: `PreCacheInit`/`PostCacheInit`
//! around the host building its content caches, `PreLibraryInit`/
//! `PostLibraryInit` around the host consuming those caches into runtime
//! indices. The host invokes each transition exactly once, in order, from
//! its own initialization thread; the machine broadcasts every transition
//! to its observers synchronously and in subscription order.
//!
//! A transition is never allowed to start another transition: a phase
//! callback advancing the machine again would corrupt broadcast ordering,
//! so re-entrant advancement fails fast instead.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::error;

use crate::error::{LoaderError, Result};
use crate::registry::Registry;

/// The four startup checkpoints, strictly ordered.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LoadPhase {
    PreCacheInit,
    PostCacheInit,
    PreLibraryInit,
    PostLibraryInit,
}

impl LoadPhase {
    /// Stable index, used to slot per-phase delegate lists.
    pub fn index(self) -> usize {
        match self {
            LoadPhase::PreCacheInit => 0,
            LoadPhase::PostCacheInit => 1,
            LoadPhase::PreLibraryInit => 2,
            LoadPhase::PostLibraryInit => 3,
        }
    }
}

/// Observer notified on every phase transition.
///
/// Failures are per-subscriber: an `Err` is logged with the subscriber and
/// phase, and the broadcast continues with the remaining observers.
pub trait PhaseObserver {
    /// Identifies the subscriber in failure logs.
    fn name(&self) -> &str;

    fn on_phase(&self, phase: LoadPhase, registry: &Registry) -> anyhow::Result<()>;
}

/// Ordered phase dispatcher.
pub struct StateMachine {
    state: Cell<Option<LoadPhase>>,
    broadcasting: Cell<bool>,
    observers: RefCell<Vec<Rc<dyn PhaseObserver>>>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: Cell::new(None),
            broadcasting: Cell::new(false),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// The most recently entered phase, `None` before startup begins.
    pub fn state(&self) -> Option<LoadPhase> {
        self.state.get()
    }

    pub fn register(&self, observer: Rc<dyn PhaseObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    /// Enters `next` and broadcasts it to every observer in subscription
    /// order. Rejects re-entrant advancement and backward (or repeated)
    /// transitions.
    pub fn advance(&self, next: LoadPhase, registry: &Registry) -> Result<()> {
        if self.broadcasting.get() {
            // state() is Some here: the guard can only trip mid-broadcast.
            let current = self.state.get().unwrap_or(next);
            return Err(LoaderError::ReentrantPhase {
                current,
                requested: next,
            });
        }

        if let Some(current) = self.state.get()
            && next <= current
        {
            return Err(LoaderError::PhaseOrder {
                current: Some(current),
                requested: next,
            });
        }

        self.state.set(Some(next));
        self.broadcasting.set(true);

        let observers: Vec<_> = self.observers.borrow().iter().cloned().collect();
        for observer in observers {
            if let Err(e) = observer.on_phase(next, registry) {
                error!(
                    target: "loadstone::phase",
                    observer = observer.name(),
                    phase = %next,
                    error = %e,
                    "phase observer failed, continuing broadcast"
                );
            }
        }

        self.broadcasting.set(false);
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `events` fans out the orchestrator's lifecycle and progress transitions
//! to zero or more observers. Dispatch never influences correctness:
//! observers cannot mutate engine state and any panic-worthy condition
//! inside an observer is swallowed rather than propagated.

use std::path::PathBuf;

/// A lifecycle or progress transition emitted by the orchestrator.
#[derive(Clone, Debug)]
pub enum ZsyncEvent {
    /// Reconstruction started for the given output path.
    Started {
        /// Resolved output path the engine will write to.
        output: PathBuf,
    },
    /// A seed began being scanned.
    SeedStarted {
        /// Path or description of the seed.
        seed: String,
    },
    /// A seed finished being scanned.
    SeedFinished {
        /// Path or description of the seed.
        seed: String,
        /// Bytes of the seed that were examined.
        bytes_scanned: u64,
    },
    /// A single target block was verified and written.
    BlockMatched {
        /// Index of the matched block.
        block: usize,
    },
    /// A byte range arrived from the HTTP range fetch.
    RangeReceived {
        /// Start offset, inclusive.
        lo: u64,
        /// End offset, exclusive.
        hi: u64,
    },
    /// Reconstruction completed successfully.
    Completed {
        /// Final output path.
        output: PathBuf,
    },
    /// Reconstruction failed; carries a human-readable description since
    /// observers are decoupled from the engine's concrete error types.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// Receives [`ZsyncEvent`] notifications.
///
/// Implementations must not block the data path meaningfully and must
/// never be able to influence engine control flow; the dispatcher does not
/// propagate anything an observer might want to signal back.
pub trait Observer {
    /// Handles one event. Any error condition inside an observer must be
    /// handled internally; the dispatcher has no channel to surface it.
    fn on_event(&mut self, event: &ZsyncEvent);
}

/// Fans a [`ZsyncEvent`] out to a list of observers, synchronously and in
/// registration order.
#[derive(Default)]
pub struct Dispatcher {
    observers: Vec<Box<dyn Observer>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Registers an observer.
    pub fn register(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Emits `event` to every registered observer.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn emit(&mut self, event: ZsyncEvent) {
        #[cfg(feature = "tracing")]
        tracing::debug!(?event, "dispatching event");
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Observer for Recorder {
        fn on_event(&mut self, event: &ZsyncEvent) {
            self.0.borrow_mut().push(format!("{event:?}"));
        }
    }

    #[test]
    fn emits_to_every_registered_observer() {
        let log_a = Rc::new(RefCell::new(Vec::new()));
        let log_b = Rc::new(RefCell::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(Recorder(log_a.clone())));
        dispatcher.register(Box::new(Recorder(log_b.clone())));

        dispatcher.emit(ZsyncEvent::BlockMatched { block: 3 });

        assert_eq!(log_a.borrow().len(), 1);
        assert_eq!(log_b.borrow().len(), 1);
    }

    #[test]
    fn empty_dispatcher_emits_without_observers() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.observer_count(), 0);
        dispatcher.emit(ZsyncEvent::Started {
            output: PathBuf::from("/tmp/out"),
        });
    }
}

#![forbid(unsafe_code)]

//! Virtual-clock driver.
//!
//! A [`Scenario`] owns an engine over a [`FakeDocument`] and a monotonic
//! `now`. [`advance`](Scenario::advance) jumps from deadline to deadline,
//! polling the engine at each, so timer-driven behaviour can be asserted
//! without sleeping. After every engine call the document's pending
//! mutations are handed back to the engine, as a mutation observer would.

use std::time::Duration;

use ssvep_core::{ConfigError, Engine, EngineConfig, InputKind, MotionPreference, Trigger};

use crate::document::{FakeDocument, NodeId};

/// Default RNG seed for scenarios.
pub const DEFAULT_SEED: u64 = 0x55E9;

/// Engine, fake document and virtual clock.
#[derive(Debug)]
pub struct Scenario {
    engine: Engine<FakeDocument>,
    now: Duration,
    fired: Vec<(Duration, Trigger)>,
}

impl Scenario {
    /// Scenario with a validated `config`.
    pub fn new(doc: FakeDocument, config: EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(Engine::new(doc, config, DEFAULT_SEED)?))
    }

    /// Scenario with the default configuration.
    #[must_use]
    pub fn with_defaults(doc: FakeDocument) -> Self {
        Self::from_engine(Engine::with_defaults(doc, DEFAULT_SEED))
    }

    fn from_engine(engine: Engine<FakeDocument>) -> Self {
        Self {
            engine,
            now: Duration::ZERO,
            fired: Vec::new(),
        }
    }

    /// Bootstrap the engine as the document-load handler would.
    pub fn load(&mut self, motion: MotionPreference) {
        self.engine.load(motion);
        self.deliver_mutations();
    }

    /// Deliver a raw input event at the current time.
    pub fn input(&mut self, kind: InputKind) {
        self.engine.input(kind, self.now);
    }

    /// Change the document; resulting mutations are delivered at `now`.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut FakeDocument) -> R) -> R {
        let out = f(self.engine.document_mut());
        self.deliver_mutations();
        out
    }

    /// Move the clock forward by `dt`, firing every deadline on the way.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.now.saturating_add(dt);
        while let Some(deadline) = self.engine.next_deadline() {
            if deadline > target {
                break;
            }
            self.now = deadline.max(self.now);
            for trigger in self.engine.poll(self.now) {
                let now_ms = u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX);
                tracing::trace!(now_ms, ?trigger, "fired");
                self.fired.push((self.now, trigger));
            }
            self.deliver_mutations();
        }
        self.now = target;
    }

    /// Shorthand for [`advance`](Self::advance) in milliseconds.
    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Every `(time, trigger)` fired by `advance`, in order.
    #[must_use]
    pub fn fired(&self) -> &[(Duration, Trigger)] {
        &self.fired
    }

    /// Number of times `trigger` fired.
    #[must_use]
    pub fn count(&self, trigger: Trigger) -> usize {
        self.fired.iter().filter(|(_, t)| *t == trigger).count()
    }

    /// Times at which `trigger` fired.
    #[must_use]
    pub fn times(&self, trigger: Trigger) -> Vec<Duration> {
        self.fired
            .iter()
            .filter(|(_, t)| *t == trigger)
            .map(|(at, _)| *at)
            .collect()
    }

    #[must_use]
    pub fn engine(&self) -> &Engine<FakeDocument> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<FakeDocument> {
        &mut self.engine
    }

    #[must_use]
    pub fn document(&self) -> &FakeDocument {
        self.engine.document()
    }

    /// Active elements in decoration order.
    #[must_use]
    pub fn active(&self) -> Vec<NodeId> {
        self.engine.active().iter().map(|s| s.element).collect()
    }

    /// Labels of the active elements in decoration order.
    #[must_use]
    pub fn active_labels(&self) -> Vec<String> {
        self.engine
            .active()
            .iter()
            .map(|s| self.document().label(s.element).to_string())
            .collect()
    }

    /// Check the active-set invariants against the document.
    ///
    /// - at most `max_stimuli` stimuli, no duplicates;
    /// - each stimulus carries a border mark and exactly one overlay, both
    ///   with its palette period;
    /// - no other connected element carries a mark or overlay.
    pub fn check_invariants(&self) -> Result<(), String> {
        let config = self.engine.config();
        let doc = self.document();
        let active = self.engine.active();

        if active.len() > config.max_stimuli {
            return Err(format!(
                "active set has {} stimuli, limit {}",
                active.len(),
                config.max_stimuli
            ));
        }
        for (i, stimulus) in active.iter().enumerate() {
            let label = doc.label(stimulus.element);
            if active[..i].iter().any(|s| s.element == stimulus.element) {
                return Err(format!("{label} is active twice"));
            }
            if !config.palette.contains(stimulus.period) {
                return Err(format!("{label} has off-palette period {}", stimulus.period));
            }
            if doc.border_period(stimulus.element) != Some(stimulus.period) {
                return Err(format!("{label} border does not match its stimulus"));
            }
            if doc.overlays(stimulus.element) != [stimulus.period] {
                return Err(format!(
                    "{label} carries overlays {:?}",
                    doc.overlays(stimulus.element)
                ));
            }
        }
        for id in doc.marked_elements() {
            if !active.iter().any(|s| s.element == id) {
                return Err(format!("{} is marked but not active", doc.label(id)));
            }
        }
        Ok(())
    }

    fn deliver_mutations(&mut self) {
        let note = self.engine.document_mut().take_mutations();
        if !note.is_empty() {
            self.engine.mutation(note, self.now);
        }
    }
}

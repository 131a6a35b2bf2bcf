#![forbid(unsafe_code)]

//! The stimulus engine: one shared active set fed by four triggers.
//!
//! [`Engine`] ties the scanner, decorator, rotation memory, coalescer and
//! rotator together. It is host-driven:
//!
//! - the host calls [`load`](Engine::load) once the document has loaded,
//! - forwards raw input via [`input`](Engine::input) and mutation batches via
//!   [`mutation`](Engine::mutation),
//! - keeps one platform timer set to [`next_deadline`](Engine::next_deadline)
//!   and calls [`poll`](Engine::poll) when it fires.
//!
//! Every refresh runs to completion inside the call that triggered it, so a
//! host with a single-threaded event loop observes each cleanse-then-apply
//! as one atomic transition.
//!
//! # Refresh path
//!
//! Interaction, mutation and load all scan with an empty exclusion and hand
//! the result to the decorator. Whatever ends up decorated is appended to
//! rotation memory.
//!
//! # Rotation step
//!
//! 1. Scan excluding rotation memory.
//! 2. If that finds nothing, reset memory and scan again without exclusion.
//! 3. If that still finds nothing, log and change nothing.
//! 4. Otherwise refresh according to [`RotationPolicy`]. With the default
//!    policy the refresh re-scans unfiltered, so the decorated set is the
//!    first elements in document order and not the rotation candidates.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, debug_span, info, trace};

use crate::coalescer::{Channel, EventCoalescer, InputKind, MutationNote};
use crate::config::{EngineConfig, RotationPolicy};
use crate::decorator::{Decorator, Stimulus};
use crate::document::DocumentHost;
use crate::error::ConfigError;
use crate::logging::{TARGET_DECORATE, TARGET_ENGINE, TARGET_ROTATE, local_timestamp};
use crate::motion::{MotionGate, MotionPreference};
use crate::palette::Period;
use crate::rotation::RotationMemory;
use crate::rotator::{InactivityRotator, RotatorState};
use crate::scanner::scan;

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Load,
    Interaction,
    Mutation,
    Rotation,
}

impl Trigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Interaction => "interaction",
            Self::Mutation => "mutation",
            Self::Rotation => "rotation",
        }
    }
}

impl From<Channel> for Trigger {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Interaction => Self::Interaction,
            Channel::Mutation => Self::Mutation,
        }
    }
}

/// Result of the most recent rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Fresh candidates were found past rotation memory.
    Advanced { candidates: usize },
    /// Memory was exhausted and reset; candidates came from a fresh cycle.
    Recycled { candidates: usize },
    /// Nothing qualifies even after reset.
    Exhausted,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Cleanse-then-apply passes, including empty ones.
    pub refreshes: u64,
    /// Rotation steps that found candidates.
    pub rotations: u64,
    /// Rotation steps that reset memory.
    pub recycled_cycles: u64,
    /// Rotation steps that found nothing at all.
    pub exhausted_rotations: u64,
    /// Elements skipped by scans or decoration because the host failed.
    pub skipped_elements: u64,
    /// Mutation batches dropped as engine-only.
    pub ignored_mutations: u64,
    /// Deadlines that came due before `load` and were discarded.
    pub dropped_before_load: u64,
}

/// Point-in-time view of the engine for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    /// Active set as `(label, period)` in decoration order.
    pub active: Vec<(String, Period)>,
    /// Rotation memory length, counting repeats.
    pub memory_len: usize,
    pub rotator: RotatorState,
    pub motion: MotionPreference,
    pub loaded: bool,
    pub last_rotation: Option<RotationOutcome>,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Channel(Channel),
    Rotation,
}

/// Stimulus selection and flicker scheduling over a [`DocumentHost`].
pub struct Engine<D: DocumentHost> {
    doc: D,
    config: EngineConfig,
    rng: SmallRng,
    decorator: Decorator<D::Element>,
    memory: RotationMemory<D::Element>,
    coalescer: EventCoalescer,
    rotator: InactivityRotator,
    motion: MotionGate,
    loaded: bool,
    last_rotation: Option<RotationOutcome>,
    stats: EngineStats,
}

impl<D: DocumentHost> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("active", &self.decorator.active().len())
            .field("memory", &self.memory.len())
            .field("rotator", &self.rotator.state())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl<D: DocumentHost> Engine<D> {
    /// Create an engine over `doc`. `seed` drives period selection.
    pub fn new(doc: D, config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        let config = config.into_validated()?;
        Ok(Self::build(doc, config, seed))
    }

    /// Create an engine with the default configuration.
    #[must_use]
    pub fn with_defaults(doc: D, seed: u64) -> Self {
        Self::build(doc, EngineConfig::default(), seed)
    }

    fn build(doc: D, config: EngineConfig, seed: u64) -> Self {
        Self {
            coalescer: EventCoalescer::new(
                config.interaction_debounce(),
                config.mutation_debounce(),
            ),
            rotator: InactivityRotator::new(config.inactivity_timeout()),
            motion: MotionGate::new(config.reduced_motion),
            rng: SmallRng::seed_from_u64(seed),
            decorator: Decorator::new(),
            memory: RotationMemory::new(),
            loaded: false,
            last_rotation: None,
            stats: EngineStats::default(),
            doc,
            config,
        }
    }

    // -- Host entry points ---------------------------------------------------

    /// Bootstrap once the document has loaded: record the motion preference,
    /// run the initial refresh, then apply the reduced-motion policy.
    ///
    /// Calls after the first are ignored.
    pub fn load(&mut self, motion: MotionPreference) {
        if self.loaded {
            debug!(target: TARGET_ENGINE, "load called twice; ignoring");
            return;
        }
        self.loaded = true;
        self.motion.set_preference(motion);
        if motion.is_reduced() {
            info!(
                target: TARGET_ENGINE,
                policy = ?self.config.reduced_motion,
                "reduced motion requested"
            );
        }

        self.refresh(Trigger::Load);

        if self.motion.strips_after_load() {
            let stripped = self.decorator.cleanse(&mut self.doc);
            info!(
                target: TARGET_DECORATE,
                at = %local_timestamp(),
                stripped,
                "stimuli stripped for reduced motion"
            );
        }
    }

    /// Record a raw input event.
    ///
    /// The inactivity timer restarts immediately; the refresh it may lead
    /// to is debounced on the interaction channel.
    pub fn input(&mut self, kind: InputKind, now: Duration) {
        self.rotator.on_input(now);
        self.coalescer.on_input(now);
        trace!(
            target: TARGET_ENGINE,
            kind = kind.dom_event(),
            now_ms = u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
            "input"
        );
    }

    /// Record a batch of DOM mutations. Returns whether the mutation channel
    /// was (re-)armed.
    pub fn mutation(&mut self, note: MutationNote, now: Duration) -> bool {
        if note.is_empty() {
            return false;
        }
        if self.config.ignore_own_mutations && note.is_engine_only() {
            self.stats.ignored_mutations += 1;
            trace!(
                target: TARGET_ENGINE,
                engine_nodes = note.engine_nodes,
                "ignoring engine-only mutation batch"
            );
            return false;
        }
        self.coalescer.on_mutation(now);
        trace!(
            target: TARGET_ENGINE,
            foreign_nodes = note.foreign_nodes,
            now_ms = u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
            "mutation"
        );
        true
    }

    /// Earliest pending deadline across both debounce channels and the
    /// rotator.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.next_due().map(|(deadline, _)| deadline)
    }

    /// Run everything due at `now`, in deadline order. Returns what fired.
    ///
    /// Before [`load`](Self::load) the motion preference is unknown, so due
    /// deadlines are consumed without touching the document.
    pub fn poll(&mut self, now: Duration) -> Vec<Trigger> {
        let mut fired = Vec::new();
        while let Some((deadline, due)) = self.next_due() {
            if deadline > now {
                break;
            }
            let trigger = match due {
                Due::Channel(_) => match self.coalescer.take_due(now) {
                    Some(channel) => Trigger::from(channel),
                    None => break,
                },
                Due::Rotation => {
                    if !self.rotator.take_due(now) {
                        break;
                    }
                    Trigger::Rotation
                }
            };
            if !self.loaded {
                self.stats.dropped_before_load += 1;
                debug!(
                    target: TARGET_ENGINE,
                    trigger = trigger.as_str(),
                    "deadline before load; discarding"
                );
                continue;
            }
            match trigger {
                Trigger::Rotation => self.rotate(),
                _ => self.refresh(trigger),
            }
            fired.push(trigger);
        }
        fired
    }

    // -- Accessors -----------------------------------------------------------

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Mutable access to the host document.
    ///
    /// Changes made here are not reported to the engine; follow up with
    /// [`mutation`](Self::mutation) when they should be.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current stimuli in decoration order.
    #[must_use]
    pub fn active(&self) -> &[Stimulus<D::Element>] {
        self.decorator.active()
    }

    #[must_use]
    pub fn memory(&self) -> &RotationMemory<D::Element> {
        &self.memory
    }

    #[must_use]
    pub fn rotator_state(&self) -> RotatorState {
        self.rotator.state()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            active: self
                .decorator
                .active()
                .iter()
                .map(|s| (self.doc.describe(&s.element), s.period))
                .collect(),
            memory_len: self.memory.len(),
            rotator: self.rotator.state(),
            motion: self.motion.preference(),
            loaded: self.loaded,
            last_rotation: self.last_rotation,
            stats: self.stats,
        }
    }

    // -- Internals -----------------------------------------------------------

    fn next_due(&self) -> Option<(Duration, Due)> {
        let channel = self
            .coalescer
            .next_deadline()
            .map(|(deadline, channel)| (deadline, Due::Channel(channel)));
        let rotation = self
            .rotator
            .deadline()
            .map(|deadline| (deadline, Due::Rotation));
        match (channel, rotation) {
            (Some(c), Some(r)) => Some(if r.0 < c.0 { r } else { c }),
            (c, r) => c.or(r),
        }
    }

    /// Scan without exclusion and decorate the result.
    fn refresh(&mut self, trigger: Trigger) {
        if self.motion.suppresses_decoration() {
            self.apply(trigger, &[]);
            return;
        }
        let found = scan(&self.doc, &[], self.config.max_stimuli);
        self.stats.skipped_elements += found.skipped as u64;
        self.apply(trigger, &found.elements);
    }

    /// Cleanse, decorate `elements`, record them, log.
    fn apply(&mut self, trigger: Trigger, elements: &[D::Element]) {
        let _span = debug_span!("ssvep.refresh", trigger = trigger.as_str()).entered();

        let suppressed = self.motion.suppresses_decoration();
        let elements: &[D::Element] = if suppressed { &[] } else { elements };
        let outcome = self.decorator.decorate(
            &mut self.doc,
            elements,
            &self.config.palette,
            &mut self.rng,
        );

        let decorated = self.decorator.active_elements();
        self.memory.record(&decorated);
        self.stats.refreshes += 1;
        self.stats.skipped_elements += outcome.skipped as u64;

        let labels: Vec<String> = decorated.iter().map(|e| self.doc.describe(e)).collect();
        let periods: Vec<String> = self
            .decorator
            .active()
            .iter()
            .map(|s| s.period.to_string())
            .collect();
        info!(
            target: TARGET_DECORATE,
            at = %local_timestamp(),
            trigger = trigger.as_str(),
            count = labels.len(),
            elements = ?labels,
            periods = ?periods,
            stripped = outcome.stripped,
            skipped = outcome.skipped,
            suppressed,
            "stimuli refreshed"
        );
    }

    fn rotate(&mut self) {
        let limit = self.config.max_stimuli;
        let mut candidates = scan(&self.doc, self.memory.distinct(), limit);
        self.stats.skipped_elements += candidates.skipped as u64;

        let mut recycled = false;
        if candidates.is_empty() {
            self.memory.reset();
            self.stats.recycled_cycles += 1;
            recycled = true;
            candidates = scan(&self.doc, &[], limit);
            self.stats.skipped_elements += candidates.skipped as u64;
        }

        if candidates.is_empty() {
            self.stats.exhausted_rotations += 1;
            self.last_rotation = Some(RotationOutcome::Exhausted);
            info!(
                target: TARGET_ROTATE,
                at = %local_timestamp(),
                "no new elements to flash"
            );
            return;
        }

        let labels: Vec<String> = candidates
            .elements
            .iter()
            .map(|e| self.doc.describe(e))
            .collect();
        match self.config.rotation {
            RotationPolicy::RescanUnfiltered => self.refresh(Trigger::Rotation),
            RotationPolicy::DecorateCandidates => {
                self.apply(Trigger::Rotation, &candidates.elements);
            }
        }

        self.stats.rotations += 1;
        let count = labels.len();
        self.last_rotation = Some(if recycled {
            RotationOutcome::Recycled { candidates: count }
        } else {
            RotationOutcome::Advanced { candidates: count }
        });
        info!(
            target: TARGET_ROTATE,
            at = %local_timestamp(),
            candidates = ?labels,
            recycled,
            memory_len = self.memory.len(),
            "rotated stimuli"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementInfo, Positioning};
    use crate::error::HostError;
    use crate::geometry::Rect;

    /// A page with nothing on it.
    #[derive(Debug, Default)]
    struct Blank;

    impl DocumentHost for Blank {
        type Element = u32;

        fn elements(&self) -> Vec<u32> {
            Vec::new()
        }

        fn viewport(&self) -> Rect {
            Rect::from_size(800.0, 600.0)
        }

        fn inspect(&self, _: &u32) -> Result<ElementInfo, HostError> {
            Err(HostError::Detached)
        }

        fn decorated(&self) -> Vec<u32> {
            Vec::new()
        }

        fn strip(&mut self, _: &u32) -> Result<(), HostError> {
            Ok(())
        }

        fn mark_border(&mut self, _: &u32, _: Period) -> Result<(), HostError> {
            Err(HostError::Detached)
        }

        fn positioning(&self, _: &u32) -> Result<Positioning, HostError> {
            Err(HostError::Detached)
        }

        fn promote_relative(&mut self, _: &u32) -> Result<(), HostError> {
            Err(HostError::Detached)
        }

        fn attach_overlay(&mut self, _: &u32, _: Period) -> Result<(), HostError> {
            Err(HostError::Detached)
        }

        fn describe(&self, element: &u32) -> String {
            element.to_string()
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn engine() -> Engine<Blank> {
        let mut engine = Engine::with_defaults(Blank, 0);
        engine.load(MotionPreference::NoPreference);
        engine
    }

    #[test]
    fn trigger_names() {
        assert_eq!(Trigger::Load.as_str(), "load");
        assert_eq!(Trigger::from(Channel::Interaction), Trigger::Interaction);
        assert_eq!(Trigger::from(Channel::Mutation).as_str(), "mutation");
    }

    #[test]
    fn nothing_scheduled_after_load() {
        let engine = engine();
        assert!(engine.is_loaded());
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(engine.stats().refreshes, 1);
    }

    #[test]
    fn input_arms_interaction_before_rotation() {
        let mut engine = engine();
        engine.input(InputKind::KeyDown, ms(100));
        assert_eq!(engine.next_deadline(), Some(ms(300)));
        assert_eq!(engine.poll(ms(299)), Vec::<Trigger>::new());
        assert_eq!(engine.poll(ms(300)), vec![Trigger::Interaction]);
        assert_eq!(engine.next_deadline(), Some(ms(5100)));
    }

    #[test]
    fn late_poll_fires_in_deadline_order() {
        let mut engine = engine();
        engine.input(InputKind::Click, ms(0));
        assert!(engine.mutation(MutationNote { engine_nodes: 0, foreign_nodes: 1 }, ms(10)));
        assert_eq!(
            engine.poll(ms(60_000)),
            vec![Trigger::Interaction, Trigger::Rotation, Trigger::Mutation]
        );
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn rotation_on_blank_page_is_exhausted() {
        let mut engine = engine();
        engine.input(InputKind::Scroll, ms(0));
        engine.poll(ms(5000));
        let snap = engine.snapshot();
        assert_eq!(snap.last_rotation, Some(RotationOutcome::Exhausted));
        assert_eq!(snap.rotator, RotatorState::Quiescent);
        assert_eq!(snap.stats.recycled_cycles, 1);
        assert_eq!(snap.stats.rotations, 0);
    }

    #[test]
    fn deadlines_before_load_are_discarded() {
        let mut engine = Engine::with_defaults(Blank, 0);
        engine.input(InputKind::MouseMove, ms(0));
        assert!(engine.mutation(MutationNote::opaque(), ms(0)));
        assert_eq!(engine.poll(ms(10_000)), Vec::<Trigger>::new());
        assert_eq!(engine.next_deadline(), None);
        let stats = engine.stats();
        assert_eq!(stats.refreshes, 0);
        assert_eq!(stats.dropped_before_load, 3);
        assert_eq!(engine.snapshot().last_rotation, None);
    }

    #[test]
    fn empty_and_engine_only_batches_do_not_arm() {
        let mut engine = engine();
        assert!(!engine.mutation(MutationNote::default(), ms(0)));
        assert!(!engine.mutation(MutationNote { engine_nodes: 3, foreign_nodes: 0 }, ms(0)));
        assert_eq!(engine.stats().ignored_mutations, 1);
        assert_eq!(engine.next_deadline(), None);
    }
}

#![forbid(unsafe_code)]

//! Event coalescing for input and mutation bursts.
//!
//! Pages emit floods of pointer moves, scrolls and DOM mutations. Refreshing
//! stimuli on each one would re-randomise every flicker several times per
//! second. This module provides:
//!
//! - [`Debouncer`]: a single-slot timer. Each trigger replaces the pending
//!   deadline, so at most one firing is ever outstanding.
//! - [`EventCoalescer`]: two independent debouncers, one per [`Channel`].
//!
//! # Design
//!
//! The coalescer uses a "last event wins" strategy: a burst produces one
//! refresh, `delay` after the last event of the burst. Nothing here reads a
//! clock; the caller passes `now` and later asks which channel is due.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use ssvep_core::coalescer::{Channel, EventCoalescer};
//!
//! let ms = Duration::from_millis;
//! let mut coalescer = EventCoalescer::new(ms(200), ms(5000));
//!
//! coalescer.on_input(ms(0));
//! coalescer.on_input(ms(150));
//! assert_eq!(coalescer.take_due(ms(349)), None);
//! assert_eq!(coalescer.take_due(ms(350)), Some(Channel::Interaction));
//! assert_eq!(coalescer.take_due(ms(10_000)), None);
//! ```

use std::time::Duration;

/// Raw user-input events that count as interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    MouseMove,
    Click,
    KeyDown,
    KeyUp,
    TouchStart,
    TouchMove,
    Scroll,
    Resize,
}

impl InputKind {
    /// Every listened kind.
    pub const ALL: [Self; 8] = [
        Self::Scroll,
        Self::Resize,
        Self::MouseMove,
        Self::Click,
        Self::KeyUp,
        Self::KeyDown,
        Self::TouchStart,
        Self::TouchMove,
    ];

    /// DOM event type this kind is delivered as.
    #[must_use]
    pub const fn dom_event(self) -> &'static str {
        match self {
            Self::MouseMove => "mousemove",
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::Scroll => "scroll",
            Self::Resize => "resize",
        }
    }

    /// Inverse of [`dom_event`](Self::dom_event).
    #[must_use]
    pub fn from_dom_event(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dom_event() == name)
    }
}

/// Summary of one batch of DOM mutation records.
///
/// Nodes are split into those the engine created (overlays) and everything
/// else. The engine only looks at whether any foreign node was touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationNote {
    /// Added or removed engine overlay nodes.
    pub engine_nodes: usize,
    /// Added or removed nodes of any other kind.
    pub foreign_nodes: usize,
}

impl MutationNote {
    /// A ping carrying no detail; always treated as foreign.
    #[must_use]
    pub const fn opaque() -> Self {
        Self {
            engine_nodes: 0,
            foreign_nodes: 1,
        }
    }

    /// Fold another batch into this one.
    pub fn merge(&mut self, other: MutationNote) {
        self.engine_nodes = self.engine_nodes.saturating_add(other.engine_nodes);
        self.foreign_nodes = self.foreign_nodes.saturating_add(other.foreign_nodes);
    }

    /// Nothing was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.engine_nodes == 0 && self.foreign_nodes == 0
    }

    /// Only engine overlays changed.
    #[must_use]
    pub const fn is_engine_only(&self) -> bool {
        self.foreign_nodes == 0 && self.engine_nodes > 0
    }
}

/// Single-slot debounce timer.
///
/// # Invariants
///
/// 1. At most one deadline is pending.
/// 2. `trigger` always replaces the pending deadline with `now + delay`.
/// 3. A deadline fires once: `take_due` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Cancel the pending firing (if any) and schedule a new one.
    pub fn trigger(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Fire if the deadline has passed. Returns `true` at most once per arm.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending firing without running it.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Which debounce channel requested a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Short delay after user input.
    Interaction,
    /// Long delay after DOM mutations.
    Mutation,
}

/// Two independent debounce channels feeding one refresh path.
///
/// There is no ordering between the channels beyond their deadlines; when
/// both are due at the same instant the interaction channel goes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCoalescer {
    interaction: Debouncer,
    mutation: Debouncer,
}

impl EventCoalescer {
    #[must_use]
    pub const fn new(interaction_delay: Duration, mutation_delay: Duration) -> Self {
        Self {
            interaction: Debouncer::new(interaction_delay),
            mutation: Debouncer::new(mutation_delay),
        }
    }

    /// Record a raw input event.
    pub fn on_input(&mut self, now: Duration) {
        self.interaction.trigger(now);
    }

    /// Record a raw mutation ping.
    pub fn on_mutation(&mut self, now: Duration) {
        self.mutation.trigger(now);
    }

    #[must_use]
    pub const fn interaction(&self) -> &Debouncer {
        &self.interaction
    }

    #[must_use]
    pub const fn mutation(&self) -> &Debouncer {
        &self.mutation
    }

    /// Earliest pending deadline and its channel.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(Duration, Channel)> {
        let interaction = self
            .interaction
            .deadline()
            .map(|d| (d, Channel::Interaction));
        let mutation = self.mutation.deadline().map(|d| (d, Channel::Mutation));
        match (interaction, mutation) {
            (Some(i), Some(m)) => Some(if m.0 < i.0 { m } else { i }),
            (i, m) => i.or(m),
        }
    }

    /// Fire the earliest due channel, if any.
    pub fn take_due(&mut self, now: Duration) -> Option<Channel> {
        let (deadline, channel) = self.next_deadline()?;
        if deadline > now {
            return None;
        }
        match channel {
            Channel::Interaction => self.interaction.cancel(),
            Channel::Mutation => self.mutation.cancel(),
        }
        Some(channel)
    }

    /// Whether either channel is armed.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.interaction.is_pending() || self.mutation.is_pending()
    }

    /// Drop both pending firings.
    pub fn clear(&mut self) {
        self.interaction.cancel();
        self.mutation.cancel();
    }
}

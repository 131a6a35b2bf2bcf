#![forbid(unsafe_code)]

//! Core: stimulus selection and flicker scheduling for SSVEP page overlays.
//!
//! # Role
//! `ssvep-core` decides *which* interactive elements of a page flicker and
//! *at what rate*. It knows nothing about a real DOM: the embedding host
//! implements [`DocumentHost`] and pushes input events, mutation pings and
//! the current monotonic time into an [`Engine`].
//!
//! # Primary responsibilities
//! - **Scanner**: visible interactive elements in document order, capped.
//! - **Decorator**: full cleanse-then-apply of border marks and overlays.
//! - **Rotation memory**: elements already used in the current cycle.
//! - **Coalescer**: interaction (short) and mutation (long) debounce channels.
//! - **Rotator**: single-step rotation after a period of inactivity.
//!
//! # Design goals
//! - **Host-driven I/O**: nothing here blocks or spawns timers. The host asks
//!   for [`Engine::next_deadline`] and calls [`Engine::poll`] when it passes.
//! - **Deterministic time**: all time is a `Duration` supplied by the host.
//! - **Silent failure**: host errors become skipped elements and log events,
//!   never panics or propagated errors.

pub mod coalescer;
pub mod config;
pub mod decorator;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod motion;
pub mod palette;
pub mod rotation;
pub mod rotator;
pub mod scanner;

pub use coalescer::{Channel, Debouncer, EventCoalescer, InputKind, MutationNote};
pub use config::{EngineConfig, ReducedMotionPolicy, RotationPolicy};
pub use decorator::{DecorateOutcome, Decorator, Stimulus};
pub use document::{DocumentHost, ElementInfo, Positioning};
pub use engine::{Engine, EngineSnapshot, EngineStats, RotationOutcome, Trigger};
pub use error::{ConfigError, HostError};
pub use geometry::Rect;
pub use motion::MotionPreference;
pub use palette::{Palette, Period};
pub use rotation::RotationMemory;
pub use rotator::{InactivityRotator, RotatorState};
pub use scanner::{ScanOutcome, scan};

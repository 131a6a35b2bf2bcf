#![forbid(unsafe_code)]

//! Browser binding for the SSVEP stimulus engine.
//!
//! On `wasm32` the module start hook:
//!
//! 1. installs a panic hook and a `tracing` subscriber that writes to the
//!    browser console,
//! 2. injects the flicker style sheet,
//! 3. registers passive window listeners for the eight input events,
//! 4. on document load (or at once, if loading already finished) probes the
//!    reduced-motion preference, runs the engine's initial refresh and starts
//!    observing `document.body` for child-list changes.
//!
//! A single `setTimeout` handle tracks [`Engine::next_deadline`]; it is
//! cleared and re-armed after every engine call.
//!
//! [`style`] and [`console`] are plain Rust and tested natively.
//!
//! [`Engine::next_deadline`]: ssvep_core::Engine::next_deadline

pub mod console;
pub mod style;

#[cfg(target_arch = "wasm32")]
pub mod dom;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::DomHost;

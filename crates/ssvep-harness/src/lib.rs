#![forbid(unsafe_code)]

//! Test harness for the SSVEP stimulus engine.
//!
//! - [`FakeDocument`]: an in-memory element tree implementing
//!   [`DocumentHost`](ssvep_core::DocumentHost), with failure injection.
//! - [`Scenario`]: drives an [`Engine`](ssvep_core::Engine) over a virtual
//!   clock, delivering the document's mutation batches back to the engine
//!   after every step the way a mutation observer would.

pub mod document;
pub mod scenario;

pub use document::{FakeDocument, NodeId};
pub use scenario::Scenario;

#![forbid(unsafe_code)]

//! Stimulus decoration.
//!
//! [`Decorator::decorate`] moves the page from whatever is currently
//! decorated to exactly the requested elements in two phases:
//!
//! 1. **Cleanse**: strip every element the document reports as decorated,
//!    plus every element of the previous active set. No diffing.
//! 2. **Apply**: for each requested element draw a period, mark the border,
//!    promote static positioning to relative, attach one overlay.
//!
//! # Invariants
//!
//! After `decorate` returns:
//! 1. The active set holds each successfully decorated element once, in
//!    request order, and never more than were requested.
//! 2. Every active element carries one border mark and one overlay child
//!    with the same period, drawn from the palette.
//! 3. No other element in the document carries engine marks.
//!
//! # Failure Modes
//!
//! If any apply step fails for an element (typically because it was
//! detached after the scan), whatever was already applied to it is
//! stripped and it is left out of the active set. The remaining elements
//! are still decorated.

use rand::Rng;
use tracing::debug;

use crate::document::{DocumentHost, Positioning};
use crate::error::HostError;
use crate::logging::TARGET_DECORATE;
use crate::palette::{Palette, Period};

/// One decorated element.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus<E> {
    pub element: E,
    pub period: Period,
}

/// Counters from one `decorate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecorateOutcome {
    /// Elements stripped during cleanse.
    pub stripped: usize,
    /// Elements decorated during apply.
    pub decorated: usize,
    /// Requested elements that could not be decorated.
    pub skipped: usize,
}

/// Owner of the active set.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator<E> {
    active: Vec<Stimulus<E>>,
}

impl<E> Default for Decorator<E> {
    fn default() -> Self {
        Self { active: Vec::new() }
    }
}

impl<E: Clone + PartialEq + std::fmt::Debug> Decorator<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stimuli, in decoration order.
    #[must_use]
    pub fn active(&self) -> &[Stimulus<E>] {
        &self.active
    }

    /// Elements of the active set.
    #[must_use]
    pub fn active_elements(&self) -> Vec<E> {
        self.active.iter().map(|s| s.element.clone()).collect()
    }

    #[must_use]
    pub fn is_active(&self, element: &E) -> bool {
        self.active.iter().any(|s| &s.element == element)
    }

    /// Strip every engine decoration from the document and empty the active
    /// set. Returns the number of elements stripped.
    pub fn cleanse<D>(&mut self, doc: &mut D) -> usize
    where
        D: DocumentHost<Element = E>,
    {
        let mut targets = doc.decorated();
        for stimulus in self.active.drain(..) {
            if !targets.contains(&stimulus.element) {
                targets.push(stimulus.element);
            }
        }

        let mut stripped = 0;
        for element in &targets {
            match doc.strip(element) {
                Ok(()) => stripped += 1,
                Err(err) => debug!(
                    target: TARGET_DECORATE,
                    element = ?element,
                    error = %err,
                    "could not strip element"
                ),
            }
        }
        stripped
    }

    /// Cleanse, then decorate `elements`.
    pub fn decorate<D, R>(
        &mut self,
        doc: &mut D,
        elements: &[E],
        palette: &Palette,
        rng: &mut R,
    ) -> DecorateOutcome
    where
        D: DocumentHost<Element = E>,
        R: Rng + ?Sized,
    {
        let mut outcome = DecorateOutcome {
            stripped: self.cleanse(doc),
            ..DecorateOutcome::default()
        };

        for element in elements {
            if self.is_active(element) {
                continue;
            }
            let Some(period) = palette.draw(rng) else {
                outcome.skipped += 1;
                continue;
            };
            match apply(doc, element, period) {
                Ok(()) => {
                    self.active.push(Stimulus {
                        element: element.clone(),
                        period,
                    });
                    outcome.decorated += 1;
                }
                Err(err) => {
                    // Roll back partial marks; the strip itself may fail for
                    // the same reason and there is nothing more to do then.
                    let _ = doc.strip(element);
                    outcome.skipped += 1;
                    debug!(
                        target: TARGET_DECORATE,
                        element = ?element,
                        error = %err,
                        "skipping element that could not be decorated"
                    );
                }
            }
        }
        outcome
    }
}

fn apply<D: DocumentHost>(
    doc: &mut D,
    element: &D::Element,
    period: Period,
) -> Result<(), HostError> {
    doc.mark_border(element, period)?;
    if doc.positioning(element)? == Positioning::Static {
        doc.promote_relative(element)?;
    }
    doc.attach_overlay(element, period)
}

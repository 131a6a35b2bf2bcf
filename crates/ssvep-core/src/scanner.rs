#![forbid(unsafe_code)]

//! Candidate scanning.
//!
//! [`scan`] walks the document in preorder and keeps the first `limit`
//! elements that are interactive, fully inside the viewport and not in the
//! exclusion list. Document order is the only tie-break.
//!
//! Elements the host cannot inspect (detached, foreign node types, a throwing
//! getter) are skipped and counted; a scan never fails.

use tracing::debug;

use crate::document::DocumentHost;
use crate::logging::TARGET_SCAN;

/// Result of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome<E> {
    /// Qualifying elements in document order, at most `limit` long.
    pub elements: Vec<E>,
    /// Elements skipped because inspection failed.
    pub skipped: usize,
}

impl<E> ScanOutcome<E> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Find up to `limit` visible interactive elements not present in `exclude`.
///
/// The viewport is read once per call. Each element is compared against
/// `exclude` linearly, so callers pass a deduplicated list.
pub fn scan<D: DocumentHost>(
    doc: &D,
    exclude: &[D::Element],
    limit: usize,
) -> ScanOutcome<D::Element> {
    let mut outcome = ScanOutcome {
        elements: Vec::with_capacity(limit),
        skipped: 0,
    };
    if limit == 0 {
        return outcome;
    }

    let viewport = doc.viewport();
    for element in doc.elements() {
        if exclude.contains(&element) {
            continue;
        }
        match doc.inspect(&element) {
            Ok(info) => {
                if info.is_visible_interactive(&viewport) {
                    outcome.elements.push(element);
                    if outcome.elements.len() >= limit {
                        break;
                    }
                }
            }
            Err(err) => {
                outcome.skipped += 1;
                debug!(
                    target: TARGET_SCAN,
                    element = ?element,
                    error = %err,
                    "skipping element that could not be inspected"
                );
            }
        }
    }

    debug!(
        target: TARGET_SCAN,
        found = outcome.elements.len(),
        excluded = exclude.len(),
        skipped = outcome.skipped,
        "scan complete"
    );
    outcome
}

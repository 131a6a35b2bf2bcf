#![forbid(unsafe_code)]

//! Flicker style sheet and the names the DOM host writes.
//!
//! The sheet declares two endless alternating animations and the classes
//! that bind them. Neither class sets a duration: each element gets its
//! period through an inline `animation-duration`, so one sheet serves every
//! palette entry.

use ssvep_core::Period;

/// `id` of the injected `<style>` element; injection is skipped when present.
pub const STYLE_ELEMENT_ID: &str = "ssvep-flicker-style";

/// Class marking a decorated element's border.
pub const BORDER_CLASS: &str = "flashing-border";

/// Class of the overlay `<div>` appended to a decorated element.
pub const OVERLAY_CLASS: &str = "flashing-overlay";

/// Border-color keyframes, black to white.
pub const BORDER_KEYFRAMES: &str = "flash-border";

/// Overlay background keyframes, half-white to half-black.
pub const OVERLAY_KEYFRAMES: &str = "flash-overlay";

/// Media query probed once at load.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Inline property carrying the per-element period.
pub const DURATION_PROPERTY: &str = "animation-duration";

/// The injected style sheet.
pub const STYLE_SHEET: &str = "\
@keyframes flash-border {
    0% { border-color: black; }
    100% { border-color: white; }
}
@keyframes flash-overlay {
    0% { background-color: rgba(255, 255, 255, 0.5); }
    100% { background-color: rgba(0, 0, 0, 0.5); }
}
.flashing-border {
    border: 2px solid black;
    animation: flash-border infinite alternate;
}
.flashing-overlay {
    position: absolute;
    inset: 0;
    opacity: 0.5;
    pointer-events: none;
    animation: flash-overlay infinite alternate;
}
";

/// Inline declaration for an overlay running at `period`.
#[must_use]
pub fn overlay_inline_style(period: Period) -> String {
    format!("{DURATION_PROPERTY}: {}", period.css_duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sheet_declares_both_animations_and_classes() {
        for name in [BORDER_KEYFRAMES, OVERLAY_KEYFRAMES] {
            assert!(STYLE_SHEET.contains(&format!("@keyframes {name} {{")), "{name}");
            assert!(
                STYLE_SHEET.contains(&format!("animation: {name} infinite alternate;")),
                "{name}"
            );
        }
        for class in [BORDER_CLASS, OVERLAY_CLASS] {
            assert!(STYLE_SHEET.contains(&format!(".{class} {{")), "{class}");
        }
    }

    #[test]
    fn overlay_never_intercepts_input() {
        let overlay = STYLE_SHEET
            .split(&format!(".{OVERLAY_CLASS} {{"))
            .nth(1)
            .expect("overlay rule");
        assert!(overlay.contains("pointer-events: none;"));
        assert!(overlay.contains("position: absolute;"));
        assert!(overlay.contains("inset: 0;"));
    }

    #[test]
    fn classes_set_no_duration() {
        assert!(!STYLE_SHEET.contains(DURATION_PROPERTY));
    }

    #[test]
    fn overlay_style_carries_period() {
        assert_eq!(
            overlay_inline_style(Period::HZ_30),
            "animation-duration: 0.0333s"
        );
    }
}

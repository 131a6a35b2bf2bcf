#![forbid(unsafe_code)]

//! The host document seen by the engine.
//!
//! [`DocumentHost`] is the only seam between the engine and a page. The web
//! crate implements it over `web-sys`; tests use an in-memory fake. Element
//! handles are observed, never owned: any call may find its element gone,
//! which the host reports as [`HostError::Detached`].

use std::fmt;

use crate::error::HostError;
use crate::geometry::Rect;
use crate::palette::Period;

/// Tag names that are interactive on their own (lower-case).
pub const INTERACTIVE_TAGS: [&str; 5] = ["a", "button", "input", "select", "textarea"];

/// What the scanner needs to know about one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    /// Tag name. Compared case-insensitively.
    pub tag: String,
    /// The element has a synchronous click handler property set.
    pub has_click_handler: bool,
    /// The element carries a `tabindex` attribute.
    pub has_tab_index: bool,
    /// Bounding client rectangle.
    pub rect: Rect,
}

impl ElementInfo {
    /// Interactive by tag, click handler or focus order.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.has_click_handler
            || self.has_tab_index
            || INTERACTIVE_TAGS
                .iter()
                .any(|tag| self.tag.eq_ignore_ascii_case(tag))
    }

    /// Interactive and entirely within `viewport`.
    #[must_use]
    pub fn is_visible_interactive(&self, viewport: &Rect) -> bool {
        self.is_interactive() && viewport.contains_rect(&self.rect)
    }
}

/// Computed CSS `position` of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    /// Document-flow default; overlays cannot be placed inside it.
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
    /// Anything else the host reports.
    Other,
}

impl Positioning {
    /// Parse a computed `position` value.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Self::Static,
            "relative" => Self::Relative,
            "absolute" => Self::Absolute,
            "fixed" => Self::Fixed,
            "sticky" => Self::Sticky,
            _ => Self::Other,
        }
    }
}

/// A live document the engine can scan and decorate.
pub trait DocumentHost {
    /// Opaque element handle; equality is identity.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Every element currently in the document, in document (preorder) order.
    fn elements(&self) -> Vec<Self::Element>;

    /// The current viewport rectangle.
    fn viewport(&self) -> Rect;

    /// Read the facts the scanner filters on.
    fn inspect(&self, element: &Self::Element) -> Result<ElementInfo, HostError>;

    /// Every element in the document carrying an engine border mark or an
    /// engine overlay child.
    fn decorated(&self) -> Vec<Self::Element>;

    /// Remove the border mark, its inline period and every engine overlay
    /// child from `element`.
    fn strip(&mut self, element: &Self::Element) -> Result<(), HostError>;

    /// Apply the flicker border with animation period `period`.
    fn mark_border(&mut self, element: &Self::Element, period: Period) -> Result<(), HostError>;

    /// Computed positioning of `element`.
    fn positioning(&self, element: &Self::Element) -> Result<Positioning, HostError>;

    /// Set inline `position: relative`.
    fn promote_relative(&mut self, element: &Self::Element) -> Result<(), HostError>;

    /// Append a fresh overlay child flickering with `period`.
    fn attach_overlay(
        &mut self,
        element: &Self::Element,
        period: Period,
    ) -> Result<(), HostError>;

    /// Short human-readable label for diagnostics.
    fn describe(&self, element: &Self::Element) -> String;
}

#![forbid(unsafe_code)]

//! [`DocumentHost`] over the live DOM.
//!
//! Element handles are `web_sys::Element`; equality is JS identity. A handle
//! may be detached at any time, so every write checks `isConnected` first
//! and reports [`HostError::Detached`] instead of decorating a node the page
//! has dropped. Stripping works on detached nodes too.
//!
//! Engine state lives entirely in the DOM: the border class plus inline
//! `animation-duration` on the element, and overlay children carrying
//! [`OVERLAY_CLASS`]. [`DomHost::decorated`] rebuilds the decorated set from
//! those marks on every call.

use js_sys::Array;
use ssvep_core::logging::TARGET_WEB;
use ssvep_core::{DocumentHost, ElementInfo, HostError, MutationNote, Period, Positioning, Rect};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CssStyleDeclaration, Document, Element, HtmlElement, MutationRecord, Node, NodeList, SvgElement,
    Window,
};

use crate::style::{
    BORDER_CLASS, DURATION_PROPERTY, OVERLAY_CLASS, REDUCED_MOTION_QUERY, STYLE_ELEMENT_ID,
    STYLE_SHEET, overlay_inline_style,
};

/// Convert a thrown JS value into a host error.
pub fn js_err(value: JsValue) -> HostError {
    let text = value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"));
    HostError::Js(text)
}

/// Whether `node` is an overlay the engine attached.
#[must_use]
pub fn is_engine_node(node: &Node) -> bool {
    node.dyn_ref::<Element>()
        .is_some_and(|el| el.class_list().contains(OVERLAY_CLASS))
}

fn count_nodes(nodes: &NodeList, note: &mut MutationNote) {
    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        if is_engine_node(&node) {
            note.engine_nodes += 1;
        } else {
            note.foreign_nodes += 1;
        }
    }
}

/// Summarise a batch of `MutationRecord`s as engine vs foreign node counts.
#[must_use]
pub fn note_for_records(records: &Array) -> MutationNote {
    let mut note = MutationNote::default();
    for record in records.iter() {
        let Ok(record) = record.dyn_into::<MutationRecord>() else {
            note.merge(MutationNote::opaque());
            continue;
        };
        count_nodes(&record.added_nodes(), &mut note);
        count_nodes(&record.removed_nodes(), &mut note);
    }
    note
}

/// The browser document seen through the engine's host interface.
#[derive(Debug, Clone)]
pub struct DomHost {
    window: Window,
    document: Document,
}

impl DomHost {
    pub fn new(window: Window) -> Result<Self, HostError> {
        let document = window
            .document()
            .ok_or(HostError::Unsupported("window.document"))?;
        Ok(Self { window, document })
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Insert the flicker style sheet once. Returns `false` when an element
    /// with [`STYLE_ELEMENT_ID`] already exists.
    pub fn inject_style(&self) -> Result<bool, HostError> {
        if self.document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
            return Ok(false);
        }
        let style = self.document.create_element("style").map_err(js_err)?;
        style.set_id(STYLE_ELEMENT_ID);
        style.set_text_content(Some(STYLE_SHEET));
        let parent: Node = match self.document.head() {
            Some(head) => head.into(),
            None => self
                .document
                .document_element()
                .ok_or(HostError::Unsupported("document element"))?
                .into(),
        };
        parent.append_child(&style).map_err(js_err)?;
        Ok(true)
    }

    /// Probe `prefers-reduced-motion`. `None` when `matchMedia` is missing.
    #[must_use]
    pub fn prefers_reduced_motion(&self) -> Option<bool> {
        match self.window.match_media(REDUCED_MOTION_QUERY) {
            Ok(Some(list)) => Some(list.matches()),
            Ok(None) | Err(_) => {
                warn!(
                    target: TARGET_WEB,
                    query = REDUCED_MOTION_QUERY,
                    "matchMedia unavailable; assuming no motion preference"
                );
                None
            }
        }
    }

    /// Whether `document.readyState` is `complete`.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.document.ready_state() == "complete"
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                warn!(target: TARGET_WEB, selector, error = %js_err(err), "querySelectorAll failed");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn connected(element: &Element) -> Result<(), HostError> {
        if element.is_connected() {
            Ok(())
        } else {
            Err(HostError::Detached)
        }
    }

    /// Inline style of an HTML or SVG element.
    fn inline_style(element: &Element) -> Result<CssStyleDeclaration, HostError> {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            Ok(html.style())
        } else if let Some(svg) = element.dyn_ref::<SvgElement>() {
            Ok(svg.style())
        } else {
            Err(HostError::Unsupported("inline style on non-HTML, non-SVG element"))
        }
    }

    fn has_click_handler(element: &Element) -> bool {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            html.onclick().is_some()
        } else if let Some(svg) = element.dyn_ref::<SvgElement>() {
            svg.onclick().is_some()
        } else {
            false
        }
    }

    fn viewport_extent(value: Result<JsValue, JsValue>) -> f64 {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    }
}

impl DocumentHost for DomHost {
    type Element = Element;

    fn elements(&self) -> Vec<Element> {
        self.query_all("*")
    }

    fn viewport(&self) -> Rect {
        Rect::from_size(
            Self::viewport_extent(self.window.inner_width()),
            Self::viewport_extent(self.window.inner_height()),
        )
    }

    fn inspect(&self, element: &Element) -> Result<ElementInfo, HostError> {
        Self::connected(element)?;
        let bounds = element.get_bounding_client_rect();
        Ok(ElementInfo {
            tag: element.tag_name().to_ascii_lowercase(),
            has_click_handler: Self::has_click_handler(element),
            has_tab_index: element.has_attribute("tabindex"),
            rect: Rect::new(bounds.x(), bounds.y(), bounds.width(), bounds.height()),
        })
    }

    fn decorated(&self) -> Vec<Element> {
        let mut out: Vec<Element> = Vec::new();
        let selector = format!(".{BORDER_CLASS}, .{OVERLAY_CLASS}");
        for el in self.query_all(&selector) {
            let owner = if el.class_list().contains(OVERLAY_CLASS) {
                match el.parent_element() {
                    Some(parent) => parent,
                    None => continue,
                }
            } else {
                el
            };
            if !out.contains(&owner) {
                out.push(owner);
            }
        }
        out
    }

    fn strip(&mut self, element: &Element) -> Result<(), HostError> {
        element.class_list().remove_1(BORDER_CLASS).map_err(js_err)?;
        if let Ok(style) = Self::inline_style(element) {
            style.remove_property(DURATION_PROPERTY).map_err(js_err)?;
        }
        let children = element.children();
        let overlays: Vec<Element> = (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|child| child.class_list().contains(OVERLAY_CLASS))
            .collect();
        for overlay in overlays {
            overlay.remove();
        }
        Ok(())
    }

    fn mark_border(&mut self, element: &Element, period: Period) -> Result<(), HostError> {
        Self::connected(element)?;
        let style = Self::inline_style(element)?;
        element.class_list().add_1(BORDER_CLASS).map_err(js_err)?;
        style
            .set_property(DURATION_PROPERTY, &period.css_duration())
            .map_err(js_err)
    }

    fn positioning(&self, element: &Element) -> Result<Positioning, HostError> {
        Self::connected(element)?;
        let style = self
            .window
            .get_computed_style(element)
            .map_err(js_err)?
            .ok_or(HostError::Unsupported("getComputedStyle"))?;
        let value = style.get_property_value("position").map_err(js_err)?;
        Ok(Positioning::from_css(&value))
    }

    fn promote_relative(&mut self, element: &Element) -> Result<(), HostError> {
        Self::connected(element)?;
        Self::inline_style(element)?
            .set_property("position", "relative")
            .map_err(js_err)
    }

    fn attach_overlay(&mut self, element: &Element, period: Period) -> Result<(), HostError> {
        Self::connected(element)?;
        let overlay = self.document.create_element("div").map_err(js_err)?;
        overlay.set_class_name(OVERLAY_CLASS);
        overlay
            .set_attribute("style", &overlay_inline_style(period))
            .map_err(js_err)?;
        overlay.set_attribute("aria-hidden", "true").map_err(js_err)?;
        element.append_child(&overlay).map_err(js_err)?;
        Ok(())
    }

    fn describe(&self, element: &Element) -> String {
        let mut label = element.tag_name().to_ascii_lowercase();
        let id = element.id();
        if !id.is_empty() {
            label.push('#');
            label.push_str(&id);
        }
        let classes = element.class_list();
        if let Some(class) = (0..classes.length())
            .filter_map(|i| classes.item(i))
            .find(|c| c != BORDER_CLASS)
        {
            label.push('.');
            label.push_str(&class);
        }
        label
    }
}

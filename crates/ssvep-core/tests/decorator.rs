#![forbid(unsafe_code)]

//! Cleanse-then-apply decoration over the fake document.

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ssvep_core::{Decorator, DocumentHost, Palette, Period, Positioning};
use ssvep_harness::{FakeDocument, NodeId};

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(7)
}

fn assert_decorated(doc: &FakeDocument, decorator: &Decorator<NodeId>) {
    for stimulus in decorator.active() {
        assert_eq!(doc.border_period(stimulus.element), Some(stimulus.period));
        assert_eq!(doc.overlays(stimulus.element), vec![stimulus.period]);
    }
    assert_eq!(doc.marked_elements(), decorator.active_elements());
}

#[test]
fn decorates_requested_elements_in_order() {
    let (mut doc, buttons) = FakeDocument::with_buttons(7);
    let palette = Palette::default();
    let mut decorator = Decorator::new();

    let outcome = decorator.decorate(&mut doc, &buttons[..5], &palette, &mut rng());

    assert_eq!(outcome.decorated, 5);
    assert_eq!(outcome.stripped, 0);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(decorator.active_elements(), buttons[..5].to_vec());
    assert!(
        decorator
            .active()
            .iter()
            .all(|s| palette.contains(s.period))
    );
    assert_decorated(&doc, &decorator);
}

#[test]
fn next_decoration_replaces_previous_set() {
    let (mut doc, buttons) = FakeDocument::with_buttons(7);
    let palette = Palette::default();
    let mut decorator = Decorator::new();
    let mut rng = rng();

    decorator.decorate(&mut doc, &buttons[..5], &palette, &mut rng);
    let outcome = decorator.decorate(&mut doc, &buttons[5..], &palette, &mut rng);

    assert_eq!(outcome.stripped, 5);
    assert_eq!(decorator.active_elements(), buttons[5..].to_vec());
    for &id in &buttons[..5] {
        assert!(!doc.is_marked(id));
        assert!(doc.overlays(id).is_empty());
    }
    assert_decorated(&doc, &decorator);
}

#[test]
fn redecorating_the_same_set_leaves_one_overlay_each() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    let palette = Palette::default();
    let mut decorator = Decorator::new();
    let mut rng = rng();

    for _ in 0..4 {
        decorator.decorate(&mut doc, &buttons, &palette, &mut rng);
    }
    for &id in &buttons {
        assert_eq!(doc.overlays(id).len(), 1);
    }
    assert_decorated(&doc, &decorator);
}

#[test]
fn empty_request_only_cleanses() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    let palette = Palette::default();
    let mut decorator = Decorator::new();
    let mut rng = rng();

    decorator.decorate(&mut doc, &buttons, &palette, &mut rng);
    let outcome = decorator.decorate(&mut doc, &[], &palette, &mut rng);

    assert_eq!(outcome.stripped, 3);
    assert_eq!(outcome.decorated, 0);
    assert!(decorator.active().is_empty());
    assert!(doc.marked_elements().is_empty());
}

#[test]
fn cleanse_removes_foreign_leftovers() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    // Marks left behind by an earlier run the decorator knows nothing about.
    doc.mark_border(&buttons[1], Period::HZ_30).unwrap();
    doc.attach_overlay(&buttons[1], Period::HZ_30).unwrap();
    doc.attach_overlay(&buttons[2], Period::HZ_50).unwrap();

    let mut decorator = Decorator::new();
    assert_eq!(decorator.cleanse(&mut doc), 2);
    assert!(doc.marked_elements().is_empty());
}

#[test]
fn static_elements_are_promoted_others_untouched() {
    let (mut doc, buttons) = FakeDocument::with_buttons(4);
    doc.set_position(buttons[1], Positioning::Absolute);
    doc.set_position(buttons[2], Positioning::Relative);
    doc.set_position(buttons[3], Positioning::Fixed);

    let mut decorator = Decorator::new();
    decorator.decorate(&mut doc, &buttons, &Palette::default(), &mut rng());

    assert!(doc.is_promoted(buttons[0]));
    assert!(!doc.is_promoted(buttons[1]));
    assert!(!doc.is_promoted(buttons[2]));
    assert!(!doc.is_promoted(buttons[3]));
}

#[test]
fn failed_overlay_rolls_back_border() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    doc.fail_overlay(buttons[1]);

    let mut decorator = Decorator::new();
    let outcome = decorator.decorate(&mut doc, &buttons, &Palette::default(), &mut rng());

    assert_eq!(outcome.decorated, 2);
    assert_eq!(outcome.skipped, 1);
    assert!(!doc.is_marked(buttons[1]));
    assert_eq!(decorator.active_elements(), vec![buttons[0], buttons[2]]);
    assert_decorated(&doc, &decorator);
}

#[test]
fn detached_element_is_skipped() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    doc.remove(buttons[0]);

    let mut decorator = Decorator::new();
    let outcome = decorator.decorate(&mut doc, &buttons, &Palette::default(), &mut rng());

    assert_eq!(outcome.skipped, 1);
    assert_eq!(decorator.active_elements(), vec![buttons[1], buttons[2]]);
    assert!(!doc.is_marked(buttons[0]));
}

#[test]
fn previously_active_detached_element_is_stripped() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    let palette = Palette::default();
    let mut decorator = Decorator::new();
    let mut rng = rng();

    decorator.decorate(&mut doc, &buttons, &palette, &mut rng);
    doc.remove(buttons[0]);
    decorator.decorate(&mut doc, &buttons[1..], &palette, &mut rng);

    assert!(!doc.is_marked(buttons[0]));
    assert!(doc.overlays(buttons[0]).is_empty());
}

#[test]
fn duplicate_requests_are_decorated_once() {
    let (mut doc, buttons) = FakeDocument::with_buttons(2);
    let request = [buttons[0], buttons[1], buttons[0]];

    let mut decorator = Decorator::new();
    let outcome = decorator.decorate(&mut doc, &request, &Palette::default(), &mut rng());

    assert_eq!(outcome.decorated, 2);
    assert_eq!(decorator.active_elements(), vec![buttons[0], buttons[1]]);
    assert_eq!(doc.overlays(buttons[0]).len(), 1);
}

#[test]
fn periods_are_drawn_with_replacement() {
    let (mut doc, buttons) = FakeDocument::with_buttons(5);
    let palette = Palette::default();
    let mut decorator = Decorator::new();
    let mut rng = rng();
    let mut seen = Vec::new();

    for _ in 0..40 {
        decorator.decorate(&mut doc, &buttons, &palette, &mut rng);
        let periods: Vec<Period> = decorator.active().iter().map(|s| s.period).collect();
        // Five stimuli over three periods always share one.
        let distinct = palette
            .periods()
            .iter()
            .filter(|p| periods.contains(*p))
            .count();
        assert!(distinct < periods.len());
        for period in periods {
            if !seen.contains(&period) {
                seen.push(period);
            }
        }
    }
    assert_eq!(seen.len(), palette.len());
}

#[test]
fn single_period_palette_is_honoured() {
    let (mut doc, buttons) = FakeDocument::with_buttons(3);
    let palette = Palette::new(vec![Period::HZ_50]);
    let mut decorator = Decorator::new();
    decorator.decorate(&mut doc, &buttons, &palette, &mut rng());
    assert!(decorator.active().iter().all(|s| s.period == Period::HZ_50));
}

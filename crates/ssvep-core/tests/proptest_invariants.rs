//! Property-based invariant tests for the stimulus engine.
//!
//! Random interleavings of input, document changes and clock advances are
//! replayed through a [`Scenario`].
//!
//! ## Invariants
//!
//! 1. Active set: bounded, duplicate-free, every stimulus marked once with a
//!    palette period, nothing else marked.
//! 2. Selection: after a refresh the active set is the scan result minus
//!    elements that failed to decorate.
//! 3. Interaction debounce: each interaction refresh fires exactly 200 ms
//!    after an input, with no input in between.
//! 4. Inactivity: each rotation fires exactly 5 s after an input, with no
//!    input in between.

use std::time::Duration;

use proptest::prelude::*;
use ssvep_core::{InputKind, MotionPreference, Rect, RotationOutcome, Trigger, scan};
use ssvep_harness::{FakeDocument, NodeId, Scenario};

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Input(usize),
    Advance(u64),
    AddButton,
    Remove(usize),
    Offscreen(usize),
    FailOverlay(usize),
    ClickableDiv,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..InputKind::ALL.len()).prop_map(Op::Input),
        4 => (0u64..7000).prop_map(Op::Advance),
        1 => Just(Op::AddButton),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::Offscreen),
        1 => any::<usize>().prop_map(Op::FailOverlay),
        1 => Just(Op::ClickableDiv),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..60)
}

// ── Replay ────────────────────────────────────────────────────────────────

struct Replay {
    s: Scenario,
    buttons: Vec<NodeId>,
    failing: Vec<NodeId>,
    inputs: Vec<Duration>,
}

impl Replay {
    fn new(initial: usize) -> Self {
        let (doc, buttons) = FakeDocument::with_buttons(initial);
        let mut s = Scenario::with_defaults(doc);
        s.load(MotionPreference::NoPreference);
        Self {
            s,
            buttons,
            failing: Vec::new(),
            inputs: Vec::new(),
        }
    }

    fn pick(&self, idx: usize) -> Option<NodeId> {
        if self.buttons.is_empty() {
            None
        } else {
            Some(self.buttons[idx % self.buttons.len()])
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Input(k) => {
                self.inputs.push(self.s.now());
                self.s.input(InputKind::ALL[k]);
            }
            Op::Advance(ms) => self.s.advance_ms(ms),
            Op::AddButton => {
                let index = self.buttons.len();
                let id = self.s.mutate(|d| d.add_button(index));
                self.buttons.push(id);
            }
            Op::Remove(idx) => {
                if let Some(id) = self.pick(idx) {
                    self.s.mutate(|d| d.remove(id));
                }
            }
            Op::Offscreen(idx) => {
                if let Some(id) = self.pick(idx) {
                    self.s
                        .mutate(|d| d.set_rect(id, Rect::new(10.0, -500.0, 50.0, 20.0)));
                }
            }
            Op::FailOverlay(idx) => {
                if let Some(id) = self.pick(idx) {
                    self.failing.push(id);
                    self.s.mutate(|d| d.fail_overlay(id));
                }
            }
            Op::ClickableDiv => {
                let n = self.buttons.len();
                let id = self.s.mutate(|d| {
                    let id = d.add("div", &format!("D{n}"), Rect::new(700.0, 500.0, 40.0, 40.0));
                    d.set_click_handler(id, true);
                    id
                });
                self.buttons.push(id);
            }
        }
    }

    /// Active set equals what a fresh refresh would decorate.
    fn selection_matches_scan(&self) -> Result<(), String> {
        let engine = self.s.engine();
        let found = scan(self.s.document(), &[], engine.config().max_stimuli);
        let expected: Vec<NodeId> = found
            .elements
            .into_iter()
            .filter(|id| !self.failing.contains(id))
            .collect();
        let active = self.s.active();
        if active == expected {
            Ok(())
        } else {
            Err(format!("active {active:?} != expected {expected:?}"))
        }
    }

    /// An input at exactly `fired_at - delay` and none until `fired_at`.
    /// Inputs stamped `fired_at` itself were delivered after the fire.
    fn quiet_before(&self, fired_at: Duration, delay: Duration) -> bool {
        let Some(start) = fired_at.checked_sub(delay) else {
            return false;
        };
        self.inputs.contains(&start)
            && !self
                .inputs
                .iter()
                .any(|&t| t > start && t < fired_at)
    }
}

// ── 1 + 2. Active set and selection ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn active_set_invariants_hold(initial in 0usize..12, ops in arb_ops()) {
        let mut r = Replay::new(initial);
        prop_assert!(r.s.check_invariants().is_ok());
        for op in &ops {
            let before = r.s.fired().len();
            r.apply(op);
            if let Err(msg) = r.s.check_invariants() {
                prop_assert!(false, "after {op:?}: {msg}");
            }

            let fired = r.s.fired();
            if fired.len() == before {
                continue;
            }
            let stale = fired.last().map(|(_, t)| *t) == Some(Trigger::Rotation)
                && r.s.engine().snapshot().last_rotation == Some(RotationOutcome::Exhausted);
            if !stale {
                if let Err(msg) = r.selection_matches_scan() {
                    prop_assert!(false, "after {op:?}: {msg}");
                }
            }
        }
    }
}

// ── 3 + 4. Timer discipline ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn refreshes_and_rotations_follow_quiet_periods(ops in arb_ops()) {
        let mut r = Replay::new(7);
        for op in &ops {
            r.apply(op);
        }
        r.s.advance_ms(10_000);

        let interaction = r.s.engine().config().interaction_debounce();
        let inactivity = r.s.engine().config().inactivity_timeout();
        for at in r.s.times(Trigger::Interaction) {
            prop_assert!(r.quiet_before(at, interaction), "interaction at {at:?}");
        }
        for at in r.s.times(Trigger::Rotation) {
            prop_assert!(r.quiet_before(at, inactivity), "rotation at {at:?}");
        }
        if r.inputs.is_empty() {
            prop_assert_eq!(r.s.count(Trigger::Rotation), 0);
        } else {
            prop_assert!(r.s.count(Trigger::Interaction) >= 1);
            prop_assert!(r.s.count(Trigger::Rotation) >= 1);
        }
    }
}

#![forbid(unsafe_code)]

//! `wasm-bindgen` start hook and browser event plumbing.
//!
//! Only compiled on `wasm32` targets. The engine lives in a thread-local
//! slot; every callback borrows it with `try_borrow_mut`, so an event that
//! re-enters while a refresh is writing the DOM is dropped instead of
//! panicking.
//!
//! # Invariants
//!
//! - At most one `setTimeout` is outstanding; it is cleared and re-armed to
//!   the engine's next deadline after every engine call.
//! - Callbacks never propagate errors into the page; failures are logged.

use std::cell::RefCell;
use std::time::Duration;

use js_sys::{Array, Math, Reflect};
use ssvep_core::logging::TARGET_WEB;
use ssvep_core::{Engine, InputKind, MotionPreference};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, MutationObserver, MutationObserverInit, Window};
use web_time::Instant;

use crate::console::ConsoleLayer;
use crate::dom::{DomHost, js_err, note_for_records};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("ssvep panic at {}:{}: {info}", loc.file(), loc.line()),
                None => format!("ssvep panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn console_sink(level: tracing::Level, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        tracing::Level::ERROR => web_sys::console::error_1(&line),
        tracing::Level::WARN => web_sys::console::warn_1(&line),
        tracing::Level::INFO => web_sys::console::log_1(&line),
        _ => web_sys::console::debug_1(&line),
    }
}

fn install_tracing() {
    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(ConsoleLayer::new(console_sink));
    // A second module instance on the same page keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// -- Runtime -----------------------------------------------------------------

struct Runtime {
    engine: Engine<DomHost>,
    window: Window,
    origin: Instant,
    timer: Option<i32>,
    wake: Closure<dyn FnMut()>,
    /// Held for the page lifetime; never read.
    _observer: Option<MutationObserver>,
}

impl Runtime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Clear the outstanding timer and arm one for the next deadline.
    fn reschedule(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(deadline) = self.engine.next_deadline() else {
            return;
        };
        let delay = deadline.saturating_sub(self.now());
        let delay_ms = i32::try_from(delay.as_micros().div_ceil(1000)).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.wake.as_ref().unchecked_ref(),
                delay_ms,
            ) {
            Ok(handle) => self.timer = Some(handle),
            Err(err) => error!(target: TARGET_WEB, error = %js_err(err), "setTimeout failed"),
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

/// Run `f` against the runtime, then re-arm the wake timer.
fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            debug!(target: TARGET_WEB, "runtime busy; dropping re-entrant callback");
            return None;
        };
        let rt = slot.as_mut()?;
        let out = f(rt);
        rt.reschedule();
        Some(out)
    })
}

// -- Callbacks ---------------------------------------------------------------

fn on_wake() {
    with_runtime(|rt| {
        rt.timer = None;
        let now = rt.now();
        rt.engine.poll(now)
    });
}

fn on_input(kind: InputKind) {
    with_runtime(|rt| {
        let now = rt.now();
        rt.engine.input(kind, now);
    });
}

fn on_mutations(records: Array) {
    let note = note_for_records(&records);
    with_runtime(|rt| {
        let now = rt.now();
        rt.engine.mutation(note, now)
    });
}

/// Probe motion, run the initial refresh, start observing the body.
fn bootstrap() {
    let observer = match observe_body() {
        Ok(observer) => Some(observer),
        Err(err) => {
            warn!(target: TARGET_WEB, error = ?err, "mutation observer unavailable");
            None
        }
    };
    with_runtime(|rt| {
        let motion = MotionPreference::from_probe(rt.engine.document().prefers_reduced_motion());
        rt.engine.load(motion);
        rt._observer = observer;
        info!(target: TARGET_WEB, ?motion, "stimulus engine started");
    });
}

// -- Installation ------------------------------------------------------------

fn install_input_listeners(window: &Window) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_passive(true);
    for kind in InputKind::ALL {
        let cb = Closure::wrap(Box::new(move |_event: Event| on_input(kind)) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            kind.dom_event(),
            cb.as_ref().unchecked_ref(),
            &options,
        )?;
        cb.forget();
    }
    Ok(())
}

fn install_load_listener(window: &Window) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let cb = Closure::wrap(Box::new(move |_event: Event| bootstrap()) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback_and_add_event_listener_options(
        "load",
        cb.as_ref().unchecked_ref(),
        &options,
    )?;
    cb.forget();
    Ok(())
}

fn observe_body() -> Result<MutationObserver, JsValue> {
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .ok_or_else(|| JsValue::from_str("document.body missing"))?;
    let cb = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
        on_mutations(records);
    }) as Box<dyn FnMut(_, _)>);
    let observer = MutationObserver::new(cb.as_ref().unchecked_ref())?;
    cb.forget();

    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(&body, &init)?;
    Ok(observer)
}

/// Seed for period draws; per page load, not reproducible.
fn random_seed() -> u64 {
    let word = || (Math::random() * f64::from(u32::MAX)) as u64;
    (word() << 32) | word()
}

fn start_runtime() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let host = DomHost::new(window.clone()).map_err(|err| JsValue::from_str(&err.to_string()))?;

    match host.inject_style() {
        Ok(true) => debug!(target: TARGET_WEB, "style sheet injected"),
        Ok(false) => debug!(target: TARGET_WEB, "style sheet already present"),
        Err(err) => warn!(target: TARGET_WEB, error = %err, "could not inject style sheet"),
    }
    let loaded = host.is_loaded();

    let runtime = Runtime {
        engine: Engine::with_defaults(host, random_seed()),
        window: window.clone(),
        origin: Instant::now(),
        timer: None,
        wake: Closure::wrap(Box::new(on_wake) as Box<dyn FnMut()>),
        _observer: None,
    };
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));

    install_input_listeners(&window)?;
    if loaded {
        bootstrap();
    } else {
        install_load_listener(&window)?;
    }
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() {
    install_panic_hook();
    install_tracing();
    if let Err(err) = start_runtime() {
        error!(target: TARGET_WEB, error = ?err, "stimulus engine failed to start");
    }
}

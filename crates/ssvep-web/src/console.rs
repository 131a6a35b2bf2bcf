#![forbid(unsafe_code)]

//! `tracing` layer that renders events as single console lines.
//!
//! The sink is a plain function so the formatting is testable off-browser;
//! the wasm start hook passes one that dispatches on level to
//! `console.error`, `console.warn`, `console.log` or `console.debug`.
//!
//! Line shape: `[LEVEL target] message key=value key=value`.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Receives one rendered line per event.
pub type Sink = fn(Level, &str);

/// Layer forwarding every event to a [`Sink`].
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLayer {
    sink: Sink,
}

impl ConsoleLayer {
    #[must_use]
    pub const fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);
        (self.sink)(*meta.level(), &line.render(*meta.level(), meta.target()));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn render(self, level: Level, target: &str) -> String {
        format!("[{level} {target}] {}{}", self.message, self.fields)
    }

    fn push(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if field.name() == "message" {
            let _ = self.message.write_fmt(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, format_args!("{value}"));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format_args!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tracing_subscriber::layer::SubscriberExt;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn collect(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_string())));
    }

    fn capture(f: impl FnOnce()) -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().clear());
        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(collect));
        tracing::subscriber::with_default(subscriber, f);
        LINES.with(|lines| lines.borrow().clone())
    }

    #[test]
    fn renders_target_message_and_fields() {
        let lines = capture(|| {
            tracing::info!(target: "ssvep.decorate", count = 5, trigger = "load", "stimuli refreshed");
        });
        assert_eq!(
            lines,
            vec![(
                Level::INFO,
                "[INFO ssvep.decorate] stimuli refreshed count=5 trigger=load".to_string()
            )]
        );
    }

    #[test]
    fn debug_fields_use_debug_format() {
        let lines = capture(|| {
            let labels = vec!["B1", "B2"];
            tracing::warn!(target: "ssvep.web", elements = ?labels, "capability missing");
        });
        assert_eq!(lines[0].0, Level::WARN);
        assert_eq!(
            lines[0].1,
            r#"[WARN ssvep.web] capability missing elements=["B1", "B2"]"#
        );
    }

    #[test]
    fn one_line_per_event() {
        let lines = capture(|| {
            tracing::debug!("a");
            tracing::error!("b");
        });
        let levels: Vec<Level> = lines.iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, [Level::DEBUG, Level::ERROR]);
    }
}

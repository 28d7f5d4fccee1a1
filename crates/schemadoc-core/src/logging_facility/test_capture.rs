//! In-memory event capture for logging assertions
//!
//! Events are flattened together with the fields of the spans they were
//! emitted in, so an event logged inside a batch worker carries the
//! `run_id` of its batch even though the macro call never named it.

use crate::core_types::schema::{
    FIELD_COMPONENT, FIELD_ERR_CODE, FIELD_EVENT, FIELD_EXAMPLE_ID, FIELD_OP, FIELD_RUN_ID,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured event with its span context merged in
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub run_id: Option<String>,
    pub example_id: Option<String>,
    pub err_code: Option<String>,
    /// Every field, event fields taking precedence over span fields
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: BTreeMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned();
        Self {
            level,
            component: get(FIELD_COMPONENT),
            op: get(FIELD_OP),
            event: get(FIELD_EVENT),
            run_id: get(FIELD_RUN_ID),
            example_id: get(FIELD_EXAMPLE_ID),
            err_code: get(FIELD_ERR_CODE),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldVisitor(BTreeMap<String, String>);

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Fields recorded when a span was opened
struct SpanFields(BTreeMap<String, String>);

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = FieldVisitor::default();
            attrs.record(&mut visitor);
            span.extensions_mut().insert(SpanFields(visitor.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(SpanFields(inherited)) = span.extensions().get::<SpanFields>() {
                    for (key, value) in inherited {
                        fields.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        let captured = CapturedEvent::from_fields(*event.metadata().level(), fields);
        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Shared handle on the captured events
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Every captured event, in emission order.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn matching(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| keep(e)).collect()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.op.as_deref() == Some(op))
    }

    /// Events logged on behalf of one example, across operations.
    pub fn events_for_example(&self, example_id: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.example_id.as_deref() == Some(example_id))
    }

    /// Events carrying the given batch run id, directly or through a span.
    pub fn events_for_run(&self, run_id: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.run_id.as_deref() == Some(run_id))
    }

    /// # Panics
    ///
    /// Panics if no event with this `op` and `event` was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber, once per process.
///
/// Tests share the returned handle, so filter by a unique op name, example
/// id or run id.
///
/// ```
/// use schemadoc_core::logging_facility::test_capture::init_test_capture;
/// use schemadoc_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_capture_op", example_id = "docExample");
/// capture.assert_event_exists("doc_capture_op", "start");
/// assert_eq!(capture.events_for_example("docExample").len(), 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let events = Arc::new(Mutex::new(Vec::new()));
            let layer = CaptureLayer {
                events: Arc::clone(&events),
            };
            tracing_subscriber::registry().with(layer).init();
            TestCapture { events }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_fields_are_lifted() {
        let fields: BTreeMap<String, String> = [
            (FIELD_OP, "process_file"),
            (FIELD_EVENT, "end_error"),
            (FIELD_EXAMPLE_ID, "addPong"),
            (FIELD_RUN_ID, "run-1"),
            (FIELD_ERR_CODE, "ERR_LOAD"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let event = CapturedEvent::from_fields(Level::ERROR, fields);
        assert_eq!(event.example_id.as_deref(), Some("addPong"));
        assert_eq!(event.run_id.as_deref(), Some("run-1"));
        assert_eq!(event.err_code.as_deref(), Some("ERR_LOAD"));
        assert!(event.component.is_none());
        assert!(event.is("process_file", "end_error"));
        assert_eq!(event.field(FIELD_EXAMPLE_ID), Some("addPong"));
    }
}

//! Tracing layer that turns notary log events into audit records.
//!
//! Every event emitted from a `notary_*` target is forwarded, with its
//! structured fields and the fields of the enclosing spans, over an unbounded
//! channel. Consumers (an audit log writer, a UI feed) read the receiver.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const TARGET_PREFIX: &str = "notary";

/// One forwarded log event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditRecord {
    /// Event target (e.g., "notary_application::signature_collector")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields such as `session_id`, `document_id`, `role`
    pub fields: HashMap<String, Value>,
    /// Fields of the enclosing spans, innermost last
    pub span: HashMap<String, Value>,
    pub timestamp: String,
}

/// Span fields stored in the registry's extensions.
struct SpanFields(HashMap<String, Value>);

pub struct AuditEventLayer {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl AuditEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<AuditRecord>) -> Self {
        Self { sender }
    }

    /// A layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for AuditEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if !attrs.metadata().target().starts_with(TARGET_PREFIX) {
            return;
        }
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(TARGET_PREFIX) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let mut span_fields = HashMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(stored) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(stored.0.clone());
                }
            }
        }

        let message = match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let record = AuditRecord {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            span: span_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver gone means nobody is auditing any more.
        let _ = self.sender.send(record);
    }
}

/// Collects tracing fields into JSON values.
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_notary_events_with_span_fields() {
        let (layer, mut receiver) = AuditEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!(target: "notary_application", "submit", session_id = "s-1");
            let _guard = span.enter();
            tracing::warn!(target: "notary_application::signature_collector", role = "client", reason = "token expired", "Signature rejected: unauthorized");
            tracing::info!(target: "hyper::client", "ignored");
        });

        let record = receiver.try_recv().unwrap();
        assert_eq!(record.level, "WARN");
        assert_eq!(record.message, "Signature rejected: unauthorized");
        assert_eq!(record.fields["role"], serde_json::json!("client"));
        assert_eq!(record.fields["reason"], serde_json::json!("token expired"));
        assert_eq!(record.span["session_id"], serde_json::json!("s-1"));
        assert!(receiver.try_recv().is_err());
    }
}

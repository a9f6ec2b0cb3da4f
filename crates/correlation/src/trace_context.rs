//! W3C Trace Context plumbing over HTTP header maps.
//!
//! Uses a local [`TraceContextPropagator`] rather than the global one so the
//! `traceparent` wire format is produced and parsed identically whether or
//! not OpenTelemetry export is enabled.

use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanContext, TraceContextExt};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Name of the W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

/// Carrier that reads from HTTP header maps.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Carrier that writes to HTTP header maps.
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = HeaderName::from_bytes(key.as_bytes())
            && let Ok(val) = HeaderValue::from_str(&value)
        {
            self.0.insert(name, val);
        }
    }
}

/// Extract a valid remote span context from `traceparent`/`tracestate`.
///
/// Returns `None` when the header is absent or malformed.
pub fn extract_span_context(headers: &HeaderMap) -> Option<SpanContext> {
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let span = cx.span();
    let span_context = span.span_context();
    (span_context.is_valid() && span_context.is_remote()).then(|| span_context.clone())
}

/// Extract a span context from a bare `traceparent` value.
pub fn parse_traceparent(value: &str) -> Option<SpanContext> {
    let value = HeaderValue::from_str(value).ok()?;
    let mut headers = HeaderMap::new();
    headers.insert(TRACEPARENT, value);
    extract_span_context(&headers)
}

/// Write `span_context` into `headers` as `traceparent` (and `tracestate`
/// when non-empty).
pub fn inject_span_context(span_context: &SpanContext, headers: &mut HeaderMap) {
    let cx = Context::new().with_remote_span_context(span_context.clone());
    TraceContextPropagator::new().inject_context(&cx, &mut HeaderInjector(headers));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn parses_valid_traceparent() {
        let sc = parse_traceparent(SAMPLE).unwrap();
        assert!(sc.is_remote());
        assert_eq!(sc.trace_id().to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(sc.span_id().to_string(), "00f067aa0ba902b7");
    }

    #[test]
    fn rejects_invalid_traceparent() {
        assert!(parse_traceparent("not-a-valid-traceparent").is_none());
        assert!(
            parse_traceparent("00-00000000000000000000000000000000-00f067aa0ba902b7-01").is_none()
        );
    }

    #[test]
    fn missing_header_yields_none() {
        assert!(extract_span_context(&HeaderMap::new()).is_none());
    }

    #[test]
    fn inject_then_extract() {
        let sc = parse_traceparent(SAMPLE).unwrap();
        let mut headers = HeaderMap::new();
        inject_span_context(&sc, &mut headers);
        assert_eq!(headers.get(TRACEPARENT).unwrap(), SAMPLE);

        let back = extract_span_context(&headers).unwrap();
        assert_eq!(back.trace_id(), sc.trace_id());
        assert_eq!(back.span_id(), sc.span_id());
    }
}

//! Plain-text event formatter with span correlation for file logs.
//!
//! Line format: `TIMESTAMP LEVEL [trace_id=X span_id=Y span=NAME] target: fields`. The bracket
//! is omitted for events outside any span. `trace_id` is the id of the root span, so every
//! line of one pipeline run or one WebSocket session shares it.

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

#[derive(Default)]
pub struct SpanIdFormat {
    timer: SystemTime,
}

impl<S, N> FormatEvent<S, N> for SpanIdFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " {}", event.metadata().level())?;
        if let Some(span) = ctx.parent_span() {
            let span_id = span.id().into_u64();
            let trace_id = span
                .scope()
                .from_root()
                .next()
                .map(|root| root.id().into_u64())
                .unwrap_or(span_id);
            write!(
                writer,
                " [trace_id={} span_id={} span={}]",
                trace_id,
                span_id,
                span.name()
            )?;
        }
        write!(writer, " {}: ", event.metadata().target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

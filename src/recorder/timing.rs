//! Idle-capping timing model.
//!
//! Converts wall-clock timestamps into the per-event intervals stored in the
//! `.cast` file. Pure arithmetic over the raw event stream, so the capture
//! loop and the serializer stay independently testable.

use crate::cast::{Event, EventKind};

/// A captured event before interval conversion: elapsed seconds since
/// session start, kind, payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub time: f64,
    pub kind: EventKind,
    pub data: String,
}

/// Convert raw session-relative timestamps into idle-capped intervals.
///
/// For event `i`, `interval = min(time_i - time_{i-1}, idle_limit)`, where
/// the first event is measured from session start (time zero). Replay of the
/// produced sequence never stalls longer than `idle_limit` between events,
/// however long the recorded process actually sat idle.
pub fn cap_intervals(raw: &[RawEvent], idle_limit: f64) -> Vec<Event> {
    let mut previous = 0.0;
    raw.iter()
        .map(|event| {
            let interval = (event.time - previous).min(idle_limit).max(0.0);
            previous = event.time;
            Event {
                interval,
                kind: event.kind,
                data: event.data.clone(),
            }
        })
        .collect()
}

//! Control-topic handler for runtime interval reconfiguration.

use crate::interval::SamplingInterval;
use log::{info, warn};
use std::sync::Arc;

/// Applies control messages to the shared sampling interval.
///
/// The payload is a decimal integer number of seconds. Values outside the
/// accepted range are discarded and the interval left unchanged. An applied
/// value takes effect at the next cycle boundary; the sleep in progress is
/// not interrupted.
pub struct IntervalControl {
    topic: String,
    interval: Arc<SamplingInterval>,
}

impl IntervalControl {
    pub fn new(topic: impl Into<String>, interval: Arc<SamplingInterval>) -> Self {
        Self {
            topic: topic.into(),
            interval,
        }
    }

    /// The control topic this handler listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Process a message; returns true if it was addressed to this handler.
    pub fn handle_message(&self, topic: &str, payload: &str) -> bool {
        if topic != self.topic {
            return false;
        }

        match payload.trim().parse::<u64>() {
            Ok(secs) if self.interval.set(secs) => {
                info!("{}: sampling interval set to {}s", topic, secs);
            }
            Ok(secs) => {
                warn!("{}: ignoring out-of-range interval {}", topic, secs);
            }
            Err(_) => {
                warn!("{}: ignoring non-numeric payload {:?}", topic, payload);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::MAX_INTERVAL_SECS;

    fn control(initial: u64) -> (IntervalControl, Arc<SamplingInterval>) {
        let interval = Arc::new(SamplingInterval::new(initial).unwrap());
        (
            IntervalControl::new("sensors/climate/kitchen/interval", interval.clone()),
            interval,
        )
    }

    #[test]
    fn test_valid_payload_applies() {
        let (handler, interval) = control(30);
        assert!(handler.handle_message("sensors/climate/kitchen/interval", "45"));
        assert_eq!(interval.secs(), 45);
    }

    #[test]
    fn test_payload_whitespace_is_tolerated() {
        let (handler, interval) = control(30);
        handler.handle_message("sensors/climate/kitchen/interval", " 120\n");
        assert_eq!(interval.secs(), 120);
    }

    #[test]
    fn test_invalid_payloads_leave_interval_unchanged() {
        let (handler, interval) = control(30);
        for payload in ["abc", "", "0", "-5", "86400", "12.5", "999999999999999999999"] {
            assert!(handler.handle_message("sensors/climate/kitchen/interval", payload));
            assert_eq!(interval.secs(), 30, "payload {payload:?} mutated interval");
        }
    }

    #[test]
    fn test_boundary_values() {
        let (handler, interval) = control(30);
        handler.handle_message("sensors/climate/kitchen/interval", "1");
        assert_eq!(interval.secs(), 1);
        handler.handle_message(
            "sensors/climate/kitchen/interval",
            &(MAX_INTERVAL_SECS - 1).to_string(),
        );
        assert_eq!(interval.secs(), MAX_INTERVAL_SECS - 1);
    }

    #[test]
    fn test_other_topics_are_not_handled() {
        let (handler, interval) = control(30);
        assert!(!handler.handle_message("sensors/climate/kitchen", "45"));
        assert_eq!(interval.secs(), 30);
    }
}

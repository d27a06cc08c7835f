use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("geminichat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("geminichat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("geminichat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("geminichat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("geminichat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("geminichat.stream.bytes");

pub(crate) static CYCLES_COMPLETED: Counter = Counter::new("geminichat.cycle.completed");
pub(crate) static CYCLES_CANCELLED: Counter = Counter::new("geminichat.cycle.cancelled");
pub(crate) static CYCLES_FAILED: Counter = Counter::new("geminichat.cycle.failed");
pub(crate) static CYCLE_FRAGMENTS: Counter = Counter::new("geminichat.cycle.fragments");
pub(crate) static CYCLE_DURATION: Moments = Moments::new("geminichat.cycle.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CYCLES_COMPLETED);
    collector.register_counter(&CYCLES_CANCELLED);
    collector.register_counter(&CYCLES_FAILED);
    collector.register_counter(&CYCLE_FRAGMENTS);
    collector.register_moments(&CYCLE_DURATION);
}

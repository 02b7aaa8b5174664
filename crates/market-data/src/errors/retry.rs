/// Classification for retry policy.
///
/// Used by [`MarketDataClient`](crate::MarketDataClient) to decide whether a
/// failed provider call is attempted again.
///
/// # Behavior Summary
///
/// | Class | Retried? | Counts toward circuit breaker? |
/// |-------|----------|--------------------------------|
/// | `Never` | No | No |
/// | `WithBackoff` | Yes, up to the attempt limit | Yes |
/// | `CircuitOpen` | No, fail fast | No (already recorded) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, malformed response, or a request the
    /// provider rejected outright.
    Never,

    /// Transient failure (throttling, timeout, 5xx, network).
    /// Retry after an exponential backoff delay.
    WithBackoff,

    /// The provider is considered unreachable.
    /// Callers should stop issuing requests until the circuit recovers.
    CircuitOpen,
}

//! Request-scoped trace identifier for correlation across logs and errors.
//!
//! Each request runs inside one identifier, either adopted from an upstream
//! `trace-id` header or freshly generated. It lives in task-local storage so
//! domain errors pick it up without threading it through every call.
//! Task-locals are not inherited by spawned tasks or blocking closures; build
//! errors after awaiting such work, or wrap it in [`TraceId::scope`].

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use storefront::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// let observed = TraceId::scope(trace_id, async move { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Adopt a caller-supplied identifier when it is a UUID, otherwise mint
    /// one. Anything else a client sends is discarded.
    #[must_use]
    pub fn adopt_or_generate(candidate: Option<&str>) -> Self {
        candidate
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const UPSTREAM: &str = "6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b";

    #[tokio::test]
    async fn scope_is_visible_inside_and_absent_outside() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case::plain(UPSTREAM)]
    #[case::padded(" 6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b ")]
    fn upstream_uuids_are_adopted(#[case] header: &str) {
        let adopted = TraceId::adopt_or_generate(Some(header));
        assert_eq!(adopted.to_string(), UPSTREAM);
    }

    #[rstest]
    #[case::absent(None)]
    #[case::not_a_uuid(Some("<script>"))]
    #[case::empty(Some(""))]
    fn unusable_values_get_a_fresh_identifier(#[case] header: Option<&str>) {
        let first = TraceId::adopt_or_generate(header);
        let second = TraceId::adopt_or_generate(header);
        assert_ne!(first, second);
    }
}

//! Failure routing decision.
//!
//! Pure function of the current attempt count and the retry budget, so the
//! routing behavior is testable without a broker.

use super::{DEAD_LETTER_TOPIC, RETRY_TOPIC};

/// Where a failed delivery goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Re-publish for another attempt.
    Retry { attempt: u32 },
    /// The retry budget is exhausted; park the message.
    DeadLetter { attempt: u32 },
}

impl RouteDecision {
    /// The attempt count to stamp on the re-published copy.
    pub fn attempt(&self) -> u32 {
        match self {
            RouteDecision::Retry { attempt } | RouteDecision::DeadLetter { attempt } => *attempt,
        }
    }

    /// The topic the copy is published to.
    pub fn destination(&self) -> &'static str {
        match self {
            RouteDecision::Retry { .. } => RETRY_TOPIC,
            RouteDecision::DeadLetter { .. } => DEAD_LETTER_TOPIC,
        }
    }
}

/// Decide where a failed delivery goes.
///
/// The re-published copy always carries `current_attempt + 1`; it goes to
/// the retry topic while that stays within `max_retries`, to the
/// dead-letter topic afterwards.
pub fn route_failure(current_attempt: u32, max_retries: u32) -> RouteDecision {
    let attempt = current_attempt + 1;
    if attempt <= max_retries {
        RouteDecision::Retry { attempt }
    } else {
        RouteDecision::DeadLetter { attempt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_goes_to_retry() {
        let decision = route_failure(0, 3);
        assert_eq!(decision, RouteDecision::Retry { attempt: 1 });
        assert_eq!(decision.destination(), RETRY_TOPIC);
    }

    #[test]
    fn test_attempt_increments_by_exactly_one() {
        for attempt in 0..5 {
            assert_eq!(route_failure(attempt, 10).attempt(), attempt + 1);
        }
    }

    #[test]
    fn test_last_budgeted_attempt_still_retries() {
        assert_eq!(route_failure(2, 3), RouteDecision::Retry { attempt: 3 });
    }

    #[test]
    fn test_exhausted_budget_goes_to_dead_letter() {
        let decision = route_failure(3, 3);
        assert_eq!(decision, RouteDecision::DeadLetter { attempt: 4 });
        assert_eq!(decision.destination(), DEAD_LETTER_TOPIC);
    }

    #[test]
    fn test_zero_budget_dead_letters_immediately() {
        assert_eq!(route_failure(0, 0), RouteDecision::DeadLetter { attempt: 1 });
    }
}

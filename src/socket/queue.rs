use crate::socket::types::SuggestionsRequest;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Suggestions requests issued while the socket was not connected.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: Vec<SuggestionsRequest>,
}

impl RequestQueue {
    /// Appends `request` unless an equal one is already queued.
    pub fn enqueue(&mut self, request: SuggestionsRequest) -> bool {
        if self.pending.contains(&request) {
            return false;
        }
        self.pending.push(request);
        true
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Empties the queue, returning its content in submission order.
    pub fn take_all(&mut self) -> Vec<SuggestionsRequest> {
        std::mem::take(&mut self.pending)
    }
}

/// Staggered send plan for a drained queue. Requests arriving mid-drain are
/// appended behind the last planned send so submission order is kept.
#[derive(Debug)]
pub struct DrainSchedule {
    stagger: Duration,
    planned: VecDeque<(Instant, SuggestionsRequest)>,
}

impl DrainSchedule {
    pub fn new(stagger: Duration) -> Self {
        Self {
            stagger,
            planned: VecDeque::new(),
        }
    }

    /// Plans `requests` at `now + stagger * position`.
    pub fn begin(&mut self, now: Instant, requests: Vec<SuggestionsRequest>) {
        self.planned.clear();
        for (position, request) in requests.into_iter().enumerate() {
            let offset = self.stagger * u32::try_from(position).unwrap_or(u32::MAX);
            self.planned.push_back((now + offset, request));
        }
    }

    pub fn append(&mut self, now: Instant, request: SuggestionsRequest) {
        let at = self
            .planned
            .back()
            .map(|(last, _)| (*last + self.stagger).max(now))
            .unwrap_or(now);
        self.planned.push_back((at, request));
    }

    pub fn is_active(&self) -> bool {
        !self.planned.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.planned.front().map(|(at, _)| *at)
    }

    pub fn take_due(&mut self, now: Instant) -> Vec<SuggestionsRequest> {
        let mut due = Vec::new();
        while let Some((at, _)) = self.planned.front() {
            if *at > now {
                break;
            }
            if let Some((_, request)) = self.planned.pop_front() {
                due.push(request);
            }
        }
        due
    }

    /// Drops every planned send. Returns how many were abandoned.
    pub fn cancel(&mut self) -> usize {
        let abandoned = self.planned.len();
        self.planned.clear();
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::types::{RiskLevel, RiskPreferences, SuggestionTimeframe};

    fn request(mint: &str, balance: f64) -> SuggestionsRequest {
        SuggestionsRequest {
            token_mint: mint.to_string(),
            timeframe: SuggestionTimeframe::H1,
            risk_level: RiskLevel::Moderate,
            user_balance: balance,
            preferences: RiskPreferences {
                max_risk_percentage: 2.0,
                preferred_timeframe: "1h".to_string(),
            },
        }
    }

    #[test]
    fn enqueue_ignores_structural_duplicates() {
        let mut queue = RequestQueue::default();
        assert!(queue.enqueue(request("sol", 100.0)));
        assert!(!queue.enqueue(request("sol", 100.0)));
        assert!(queue.enqueue(request("sol", 101.0)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn take_all_preserves_order_and_empties() {
        let mut queue = RequestQueue::default();
        queue.enqueue(request("a", 1.0));
        queue.enqueue(request("b", 1.0));
        queue.enqueue(request("c", 1.0));

        let drained: Vec<String> = queue
            .take_all()
            .into_iter()
            .map(|request| request.token_mint)
            .collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_staggers_by_position() {
        let now = Instant::now();
        let mut drain = DrainSchedule::new(Duration::from_millis(200));
        drain.begin(now, vec![request("a", 1.0), request("b", 1.0), request("c", 1.0)]);

        assert_eq!(drain.take_due(now).len(), 1);
        assert!(drain.take_due(now + Duration::from_millis(199)).is_empty());
        assert_eq!(
            drain.take_due(now + Duration::from_millis(200))[0].token_mint,
            "b"
        );
        assert_eq!(drain.deadline(), Some(now + Duration::from_millis(400)));
    }

    #[test]
    fn append_lands_behind_planned_sends() {
        let now = Instant::now();
        let mut drain = DrainSchedule::new(Duration::from_millis(200));
        drain.begin(now, vec![request("a", 1.0), request("b", 1.0)]);
        drain.take_due(now);

        drain.append(now + Duration::from_millis(50), request("late", 1.0));
        let rest: Vec<String> = drain
            .take_due(now + Duration::from_secs(1))
            .into_iter()
            .map(|request| request.token_mint)
            .collect();
        assert_eq!(rest, vec!["b", "late"]);
        assert!(!drain.is_active());
    }

    #[test]
    fn cancel_drops_unsent_requests() {
        let now = Instant::now();
        let mut drain = DrainSchedule::new(Duration::from_millis(200));
        drain.begin(now, vec![request("a", 1.0), request("b", 1.0), request("c", 1.0)]);
        drain.take_due(now);

        assert_eq!(drain.cancel(), 2);
        assert_eq!(drain.deadline(), None);
        assert!(drain.take_due(now + Duration::from_secs(1)).is_empty());
    }
}

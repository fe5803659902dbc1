use std::time::Duration;
use tokio::time::Instant;

/// Exponential backoff: `min(base * growth^attempt, cap)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub growth: f64,
    pub cap: Duration,
    /// Failed attempts after which the policy stops scheduling. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl BackoffPolicy {
    /// Used until the first successful connection.
    pub const INITIAL_CONNECT: Self = Self {
        base: Duration::from_millis(5_000),
        growth: 2.0,
        cap: Duration::from_millis(30_000),
        max_attempts: Some(10),
    };

    /// Used once a connection has been established at least once.
    pub const CONNECTION_RECOVERY: Self = Self {
        base: Duration::from_millis(3_000),
        growth: 1.5,
        cap: Duration::from_millis(15_000),
        max_attempts: None,
    };

    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled_ms = self.base.as_millis() as f64 * self.growth.powi(exponent);
        let cap_ms = self.cap.as_millis() as f64;
        if !scaled_ms.is_finite() || scaled_ms >= cap_ms {
            return self.cap;
        }
        Duration::from_millis(scaled_ms.round() as u64)
    }

    /// Whether another attempt may follow `failed_attempts` failures.
    pub fn allows(&self, failed_attempts: u32) -> bool {
        self.max_attempts
            .map_or(true, |limit| failed_attempts < limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectKind {
    /// Next endpoint of the current cycle; runs even with auto-connect disabled.
    NextEndpoint,
    /// Backoff retry; only runs while auto-connect is enabled.
    Backoff,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledReconnect {
    at: Instant,
    kind: ReconnectKind,
}

/// Holds at most one outstanding reconnection timer.
#[derive(Debug, Default)]
pub struct ReconnectScheduler {
    pending: Option<ScheduledReconnect>,
}

impl ReconnectScheduler {
    /// Arms the timer. Returns `false` without touching it if one is already pending.
    pub fn schedule(&mut self, now: Instant, delay: Duration, kind: ReconnectKind) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(ScheduledReconnect {
            at: now + delay,
            kind,
        });
        true
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|scheduled| scheduled.at)
    }

    pub fn kind(&self) -> Option<ReconnectKind> {
        self.pending.map(|scheduled| scheduled.kind)
    }

    pub fn take_due(&mut self, now: Instant) -> Option<ReconnectKind> {
        match self.pending {
            Some(scheduled) if scheduled.at <= now => {
                self.pending = None;
                Some(scheduled.kind)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_connect_doubles_up_to_cap() {
        let policy = BackoffPolicy::INITIAL_CONNECT;
        let delays: Vec<u128> = (0..6).map(|n| policy.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![5_000, 10_000, 20_000, 30_000, 30_000, 30_000]);
    }

    #[test]
    fn recovery_grows_by_half_up_to_cap() {
        let policy = BackoffPolicy::CONNECTION_RECOVERY;
        let delays: Vec<u128> = (0..6).map(|n| policy.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![3_000, 4_500, 6_750, 10_125, 15_000, 15_000]);
    }

    #[test]
    fn huge_attempt_counts_stay_at_cap() {
        assert_eq!(
            BackoffPolicy::CONNECTION_RECOVERY.delay(u32::MAX),
            Duration::from_millis(15_000)
        );
    }

    #[test]
    fn initial_policy_gives_up_after_ten_failures() {
        let policy = BackoffPolicy::INITIAL_CONNECT;
        assert!(policy.allows(9));
        assert!(!policy.allows(10));
        assert!(BackoffPolicy::CONNECTION_RECOVERY.allows(u32::MAX));
    }

    #[test]
    fn scheduling_while_pending_is_a_noop() {
        let now = Instant::now();
        let mut scheduler = ReconnectScheduler::default();

        assert!(scheduler.schedule(now, Duration::from_secs(3), ReconnectKind::Backoff));
        assert!(!scheduler.schedule(now, Duration::from_secs(1), ReconnectKind::NextEndpoint));
        assert_eq!(scheduler.deadline(), Some(now + Duration::from_secs(3)));
        assert_eq!(scheduler.kind(), Some(ReconnectKind::Backoff));

        assert_eq!(scheduler.take_due(now + Duration::from_secs(2)), None);
        assert_eq!(
            scheduler.take_due(now + Duration::from_secs(3)),
            Some(ReconnectKind::Backoff)
        );
        assert_eq!(scheduler.deadline(), None);
    }

    #[test]
    fn cancel_clears_pending_timer() {
        let now = Instant::now();
        let mut scheduler = ReconnectScheduler::default();
        scheduler.schedule(now, Duration::from_secs(1), ReconnectKind::Backoff);
        scheduler.cancel();

        assert_eq!(scheduler.deadline(), None);
        assert_eq!(scheduler.take_due(now + Duration::from_secs(5)), None);
    }
}

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    Idle,
    SendPing,
    /// No pong arrived within the timeout of the last ping.
    Dead,
}

/// Application-level liveness probe. At most one ping is outstanding, so a pong is
/// matched by recency alone.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    next_ping_at: Option<Instant>,
    pong_deadline: Option<Instant>,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            next_ping_at: None,
            pong_deadline: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_ping_at = Some(now + self.interval);
        self.pong_deadline = None;
    }

    pub fn stop(&mut self) {
        self.next_ping_at = None;
        self.pong_deadline = None;
    }

    /// Returns `true` if a ping was outstanding.
    pub fn on_pong(&mut self) -> bool {
        self.pong_deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        match (self.next_ping_at, self.pong_deadline) {
            (Some(ping), Some(pong)) => Some(ping.min(pong)),
            (ping, pong) => ping.or(pong),
        }
    }

    pub fn poll(&mut self, now: Instant) -> HeartbeatAction {
        if self.pong_deadline.is_some_and(|deadline| deadline <= now) {
            self.stop();
            return HeartbeatAction::Dead;
        }

        match self.next_ping_at {
            Some(at) if at <= now => {
                self.next_ping_at = Some(now + self.interval);
                self.pong_deadline = Some(now + self.timeout);
                HeartbeatAction::SendPing
            }
            _ => HeartbeatAction::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> HeartbeatMonitor {
        HeartbeatMonitor::new(Duration::from_secs(15), Duration::from_secs(5))
    }

    #[test]
    fn pings_every_interval() {
        let start = Instant::now();
        let mut heartbeat = monitor();
        heartbeat.start(start);

        assert_eq!(heartbeat.poll(start + Duration::from_secs(14)), HeartbeatAction::Idle);
        assert_eq!(
            heartbeat.poll(start + Duration::from_secs(15)),
            HeartbeatAction::SendPing
        );
        // The pong deadline comes before the next ping.
        assert_eq!(heartbeat.deadline(), Some(start + Duration::from_secs(20)));
    }

    #[test]
    fn pong_cancels_death_timer() {
        let start = Instant::now();
        let mut heartbeat = monitor();
        heartbeat.start(start);
        heartbeat.poll(start + Duration::from_secs(15));

        assert!(heartbeat.on_pong());
        assert!(!heartbeat.on_pong());
        assert_eq!(heartbeat.poll(start + Duration::from_secs(21)), HeartbeatAction::Idle);
        assert_eq!(
            heartbeat.poll(start + Duration::from_secs(30)),
            HeartbeatAction::SendPing
        );
    }

    #[test]
    fn missed_pong_is_death() {
        let start = Instant::now();
        let mut heartbeat = monitor();
        heartbeat.start(start);
        heartbeat.poll(start + Duration::from_secs(15));

        assert_eq!(
            heartbeat.poll(start + Duration::from_millis(19_999)),
            HeartbeatAction::Idle
        );
        assert_eq!(heartbeat.poll(start + Duration::from_secs(20)), HeartbeatAction::Dead);
        assert_eq!(heartbeat.deadline(), None);
        assert_eq!(heartbeat.poll(start + Duration::from_secs(60)), HeartbeatAction::Idle);
    }

    #[test]
    fn stopped_monitor_never_fires() {
        let start = Instant::now();
        let mut heartbeat = monitor();
        heartbeat.start(start);
        heartbeat.stop();

        assert_eq!(heartbeat.poll(start + Duration::from_secs(60)), HeartbeatAction::Idle);
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

const CONNECT_WINDOW: Duration = Duration::from_secs(60);
const CONNECT_LIMIT: usize = 12;
const BAN_DURATION: Duration = Duration::from_secs(10 * 60);

/// How often the engine sweeps idle attempt records.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Why a connection attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The address is serving an active ban; `seconds` remain.
    Banned { seconds: u64 },
    /// This attempt crossed the threshold and triggered a new ban.
    TooMany,
}

#[derive(Debug, Default)]
struct AttemptRecord {
    attempts: Vec<Instant>,
    banned_until: Option<Instant>,
}

/// Tracks connection attempts per source address and temporarily bans
/// repeat offenders. The clock is passed in by the caller, so admission
/// and sweep never reorder relative to each other.
#[derive(Debug, Default)]
pub struct AbuseGate {
    records: HashMap<String, AttemptRecord>,
}

impl AbuseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, addr: &str, now: Instant) -> Result<(), Rejection> {
        let record = self.records.entry(addr.to_string()).or_default();

        record
            .attempts
            .retain(|&at| now.saturating_duration_since(at) < CONNECT_WINDOW);
        record.attempts.push(now);

        // An expired ban clears the slate, current attempt included.
        if let Some(until) = record.banned_until {
            if until <= now {
                record.banned_until = None;
                record.attempts.clear();
            }
        }

        if let Some(until) = record.banned_until {
            let seconds = until.saturating_duration_since(now).as_secs();
            return Err(Rejection::Banned { seconds });
        }

        if record.attempts.len() > CONNECT_LIMIT {
            record.banned_until = Some(now + BAN_DURATION);
            info!("Connection rate exceeded for {}, address banned", addr);
            return Err(Rejection::TooMany);
        }

        Ok(())
    }

    /// Drops records with no attempts inside the trailing window and no
    /// active ban. Runs on a fixed interval, independent of admissions.
    pub fn sweep(&mut self, now: Instant) {
        let before = self.records.len();
        self.records.retain(|_, record| {
            record
                .attempts
                .retain(|&at| now.saturating_duration_since(at) < CONNECT_WINDOW);
            let banned = record
                .banned_until
                .map(|until| until > now)
                .unwrap_or(false);
            banned || !record.attempts.is_empty()
        });
        let dropped = before - self.records.len();
        if dropped > 0 {
            debug!("Swept {} idle attempt records", dropped);
        }
    }

    pub fn tracked_addresses(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        for _ in 0..CONNECT_LIMIT {
            assert_eq!(gate.admit("1.2.3.4", t0), Ok(()));
        }
    }

    #[test]
    fn ban_lifecycle() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        for _ in 0..CONNECT_LIMIT {
            assert!(gate.admit("1.2.3.4", t0).is_ok());
        }

        // Crossing the threshold sets the ban.
        assert_eq!(gate.admit("1.2.3.4", t0), Err(Rejection::TooMany));

        // While banned, rejections carry the remaining seconds.
        let later = t0 + Duration::from_secs(1);
        assert_eq!(
            gate.admit("1.2.3.4", later),
            Err(Rejection::Banned { seconds: 599 })
        );

        // First attempt after expiry is admitted and history is reset.
        let expired = t0 + BAN_DURATION + Duration::from_secs(1);
        assert_eq!(gate.admit("1.2.3.4", expired), Ok(()));
        assert_eq!(gate.admit("1.2.3.4", expired), Ok(()));
    }

    #[test]
    fn window_prunes_old_attempts() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        for _ in 0..CONNECT_LIMIT {
            assert!(gate.admit("1.2.3.4", t0).is_ok());
        }
        // A minute later the earlier attempts have aged out.
        let t1 = t0 + CONNECT_WINDOW + Duration::from_secs(1);
        assert_eq!(gate.admit("1.2.3.4", t1), Ok(()));
    }

    #[test]
    fn addresses_are_tracked_independently() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        for _ in 0..=CONNECT_LIMIT {
            let _ = gate.admit("1.1.1.1", t0);
        }
        assert_eq!(gate.admit("1.1.1.1", t0), Err(Rejection::Banned { seconds: 600 }));
        assert_eq!(gate.admit("2.2.2.2", t0), Ok(()));
    }

    #[test]
    fn sweep_drops_idle_unbanned_records() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        assert!(gate.admit("1.2.3.4", t0).is_ok());
        assert_eq!(gate.tracked_addresses(), 1);

        // Still inside the window: kept.
        gate.sweep(t0 + Duration::from_secs(30));
        assert_eq!(gate.tracked_addresses(), 1);

        // Aged out and not banned: dropped.
        gate.sweep(t0 + CONNECT_WINDOW + Duration::from_secs(1));
        assert_eq!(gate.tracked_addresses(), 0);
    }

    #[test]
    fn sweep_keeps_banned_records() {
        let mut gate = AbuseGate::new();
        let t0 = Instant::now();
        for _ in 0..=CONNECT_LIMIT {
            let _ = gate.admit("1.2.3.4", t0);
        }
        gate.sweep(t0 + CONNECT_WINDOW + Duration::from_secs(1));
        assert_eq!(gate.tracked_addresses(), 1);

        // Once the ban lapses as well, the record goes.
        gate.sweep(t0 + BAN_DURATION + Duration::from_secs(1));
        assert_eq!(gate.tracked_addresses(), 0);
    }
}

//! Thread-safe map of server name → health record.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use mcpd_core::{DaemonError, HealthRecord, HealthStatus, normalize_name};

/// Written by the health scheduler, read by the gateway. Updates are
/// serialized per map; readers get copies so a caller can never mutate
/// tracked state. Lock scope never spans an await.
#[derive(Default)]
pub struct HealthTracker {
    inner: RwLock<HashMap<String, HealthRecord>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a server at `unknown` with empty time fields.
    pub fn add(&self, name: &str) {
        let name = normalize_name(name);
        let mut inner = self.inner.write().expect("health tracker lock poisoned");
        inner.insert(name.clone(), HealthRecord::unknown(name));
    }

    pub fn remove(&self, name: &str) {
        let mut inner = self.inner.write().expect("health tracker lock poisoned");
        inner.remove(&normalize_name(name));
    }

    /// Copy of one record; error when the server is not tracked.
    pub fn status(&self, name: &str) -> Result<HealthRecord, DaemonError> {
        let inner = self.inner.read().expect("health tracker lock poisoned");
        inner
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| DaemonError::HealthNotTracked(normalize_name(name)))
    }

    /// Copies of every record, in no particular order.
    pub fn list(&self) -> Vec<HealthRecord> {
        let inner = self.inner.read().expect("health tracker lock poisoned");
        inner.values().cloned().collect()
    }

    /// Record a probe outcome. `last_checked` always moves to now;
    /// `last_successful` moves only when the probe was `ok`.
    pub fn update(
        &self,
        name: &str,
        status: HealthStatus,
        latency: Option<Duration>,
    ) -> Result<(), DaemonError> {
        let now = Utc::now();
        let mut inner = self.inner.write().expect("health tracker lock poisoned");
        match inner.get_mut(&normalize_name(name)) {
            Some(record) => {
                record.status = status;
                record.latency = latency;
                record.last_checked = Some(now);
                if status == HealthStatus::Ok {
                    record.last_successful = Some(now);
                }
                Ok(())
            }
            None => Err(DaemonError::HealthNotTracked(normalize_name(name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HealthTracker;
    use mcpd_core::HealthStatus;
    use std::time::Duration;

    #[test]
    fn added_server_starts_unknown() {
        let tracker = HealthTracker::new();
        tracker.add("Time");

        let record = tracker.status("time").unwrap();
        assert_eq!(record.status, HealthStatus::Unknown);
        assert!(record.last_checked.is_none());
        assert!(record.last_successful.is_none());
    }

    #[test]
    fn untracked_server_is_an_error() {
        let tracker = HealthTracker::new();
        let err = tracker.status("ghost").unwrap_err();
        assert!(err.to_string().contains("not being tracked"));
        assert!(tracker.update("ghost", HealthStatus::Ok, None).is_err());
    }

    #[test]
    fn update_preserves_last_successful_on_failure() {
        let tracker = HealthTracker::new();
        tracker.add("srv");

        tracker
            .update("srv", HealthStatus::Ok, Some(Duration::from_millis(50)))
            .unwrap();
        let after_ok = tracker.status("srv").unwrap();
        let first_success = after_ok.last_successful.unwrap();

        tracker.update("srv", HealthStatus::Timeout, None).unwrap();
        let after_timeout = tracker.status("srv").unwrap();

        assert_eq!(after_timeout.status, HealthStatus::Timeout);
        assert!(after_timeout.latency.is_none());
        assert_eq!(after_timeout.last_successful, Some(first_success));
        assert!(after_timeout.last_checked.unwrap() >= first_success);
    }

    #[test]
    fn returned_records_are_copies() {
        let tracker = HealthTracker::new();
        tracker.add("srv");

        let mut record = tracker.status("srv").unwrap();
        record.status = HealthStatus::Unreachable;

        assert_eq!(tracker.status("srv").unwrap().status, HealthStatus::Unknown);
    }

    #[test]
    fn remove_stops_tracking() {
        let tracker = HealthTracker::new();
        tracker.add("srv");
        tracker.remove("SRV");
        assert!(tracker.status("srv").is_err());
        assert!(tracker.list().is_empty());
    }
}

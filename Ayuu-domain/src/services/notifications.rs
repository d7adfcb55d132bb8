//! Notification bus shared by whoever publishes or reads doctor alerts.
//!
//! The bus is an ordinary value: construct one at startup and hand clones to
//! the services and handlers that need it. Clones share the same list and
//! channel.

use std::sync::{Arc, RwLock};
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::notification::{NewNotification, Notification, NotificationKind};

const CHANNEL_CAPACITY: usize = 64;

/// In-process notification store with change subscriptions
#[derive(Debug, Clone)]
pub struct NotificationBus {
    notifications: Arc<RwLock<Vec<Notification>>>,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            notifications: Arc::new(RwLock::new(Vec::new())),
            sender,
        }
    }

    /// Publish a notification; newest first in `list`
    pub fn add(&self, new: NewNotification) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            patient_name: new.patient_name,
            mr_number: new.mr_number,
            timestamp: Utc::now(),
            read: false,
            data: new.data,
        };

        match self.notifications.write() {
            Ok(mut list) => list.insert(0, notification.clone()),
            Err(e) => warn!("Notification store lock poisoned: {}", e),
        }

        // No receivers is not an error
        if self.sender.send(notification.clone()).is_err() {
            debug!("Notification {} published with no subscribers", notification.id);
        }

        notification
    }

    /// All notifications, newest first
    pub fn list(&self) -> Vec<Notification> {
        self.notifications
            .read()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications
            .read()
            .map(|list| list.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    /// Mark one notification read. Returns false for an unknown id.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let updated = match self.notifications.write() {
            Ok(mut list) => match list.iter_mut().find(|n| n.id == id) {
                Some(notification) => {
                    notification.read = true;
                    Some(notification.clone())
                }
                None => None,
            },
            Err(e) => {
                warn!("Notification store lock poisoned: {}", e);
                None
            }
        };

        match updated {
            Some(notification) => {
                let _ = self.sender.send(notification);
                true
            }
            None => false,
        }
    }

    /// Receive every notification added or updated from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

/// Build the alert published when intake vitals are critical
pub fn critical_vitals_notification(
    patient_name: &str,
    mr_number: &str,
    systolic: Option<f64>,
    spo2: Option<f64>,
    warnings: &[String],
) -> NewNotification {
    let mut critical_values = Vec::new();
    if let Some(systolic) = systolic.filter(|s| *s > 180.0) {
        critical_values.push(format!("Systolic BP: {} mmHg", systolic));
    }
    if let Some(spo2) = spo2.filter(|s| *s < 90.0) {
        critical_values.push(format!("SpO2: {}%", spo2));
    }

    let mut message = "Critical vital signs detected".to_string();
    if !critical_values.is_empty() {
        message.push_str(&format!(": {}", critical_values.join(", ")));
    }
    if !warnings.is_empty() {
        message.push_str(&format!(
            ". Additional warnings: {} critical values detected.",
            warnings.len()
        ));
    }

    NewNotification {
        kind: NotificationKind::Critical,
        title: "Critical Vitals Alert".to_string(),
        message,
        patient_name: patient_name.to_string(),
        mr_number: mr_number.to_string(),
        data: Some(json!({
            "systolic": systolic,
            "spo2": spo2,
            "warnings": warnings,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_message() {
        let warnings = vec!["a".to_string(), "b".to_string()];
        let n = critical_vitals_notification("Asha Menon", "MR24010001", Some(190.0), Some(85.0), &warnings);
        assert_eq!(n.kind, NotificationKind::Critical);
        assert_eq!(n.title, "Critical Vitals Alert");
        assert_eq!(
            n.message,
            "Critical vital signs detected: Systolic BP: 190 mmHg, SpO2: 85%. Additional warnings: 2 critical values detected."
        );

        let quiet = critical_vitals_notification("Asha Menon", "MR24010001", Some(150.0), None, &[]);
        assert_eq!(quiet.message, "Critical vital signs detected");
    }

    #[tokio::test]
    async fn test_bus_add_list_and_read() {
        let bus = NotificationBus::new();
        let mut receiver = bus.subscribe();

        let first = bus.add(critical_vitals_notification("A", "MR1", Some(190.0), None, &[]));
        let second = bus.add(critical_vitals_notification("B", "MR2", None, Some(80.0), &[]));

        let listed = bus.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(bus.unread_count(), 2);

        assert!(bus.mark_as_read(&first.id));
        assert!(!bus.mark_as_read("missing"));
        assert_eq!(bus.unread_count(), 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id, first.id);
    }

    #[test]
    fn test_clones_share_state() {
        let bus = NotificationBus::new();
        let clone = bus.clone();
        clone.add(critical_vitals_notification("A", "MR1", Some(190.0), None, &[]));
        assert_eq!(bus.list().len(), 1);
    }
}

//! Optimistic booking of a single class.
//!
//! Each class id moves through `Idle -> Pending -> Booked` or back to `Idle`.
//! The catalog is marked booked before the backend is awaited and is
//! reverted if the backend rejects or faults. Every attempt ends with exactly
//! one notification.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::catalog::SharedCatalog;
use crate::models::{BookingResult, Class, Notification};
use crate::notify::NotificationSink;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Class '{0}' not found")]
    UnknownClass(String),
    #[error("A booking for class '{0}' is already in progress")]
    AlreadyInFlight(String),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Booking service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Idle,
    Pending,
    Booked,
}

/// Performs the actual reservation. `Ok(false)` is a rejection.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn attempt_booking(&self, class_id: &str) -> Result<bool, BackendError>;
}

/// Stand-in backend: waits `delay`, then fails with `failure_rate` probability.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
    failure_rate: f64,
}

impl SimulatedBackend {
    /// A non-finite `failure_rate` is treated as 0.
    pub fn new(delay: Duration, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_finite() {
            failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            delay,
            failure_rate,
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), 0.15)
    }
}

#[async_trait]
impl BookingBackend for SimulatedBackend {
    async fn attempt_booking(&self, class_id: &str) -> Result<bool, BackendError> {
        let should_fail = rand::thread_rng().gen_bool(self.failure_rate);
        tokio::time::sleep(self.delay).await;
        debug!(class_id, should_fail, "simulated booking settled");
        Ok(!should_fail)
    }
}

/// Proof that [`BookingFlow::begin`] applied the optimistic update.
#[derive(Debug)]
#[must_use = "a pending booking must be completed or the class stays marked in flight"]
pub struct PendingBooking {
    class: Class,
}

impl PendingBooking {
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn class_id(&self) -> &str {
        &self.class.id
    }
}

#[derive(Clone)]
pub struct BookingFlow {
    catalog: SharedCatalog,
    attempts: Arc<Mutex<HashMap<String, BookingStatus>>>,
    backend: Arc<dyn BookingBackend>,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingFlow {
    pub fn new(
        catalog: SharedCatalog,
        backend: Arc<dyn BookingBackend>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            catalog,
            attempts: Arc::new(Mutex::new(HashMap::new())),
            backend,
            notifier,
        }
    }

    pub async fn status(&self, class_id: &str) -> BookingStatus {
        self.attempts
            .lock()
            .await
            .get(class_id)
            .copied()
            .unwrap_or(BookingStatus::Idle)
    }

    /// Marks the class booked and records the attempt as in flight.
    pub async fn begin(&self, class_id: &str) -> Result<PendingBooking, BookingError> {
        let mut attempts = self.attempts.lock().await;
        if attempts.get(class_id) == Some(&BookingStatus::Pending) {
            return Err(BookingError::AlreadyInFlight(class_id.to_string()));
        }

        let mut catalog = self.catalog.write().await;
        if !catalog.set_booked(class_id, true) {
            return Err(BookingError::UnknownClass(class_id.to_string()));
        }
        let class = catalog
            .get(class_id)
            .cloned()
            .ok_or_else(|| BookingError::UnknownClass(class_id.to_string()))?;
        attempts.insert(class_id.to_string(), BookingStatus::Pending);

        debug!(class_id, "optimistically marked class booked");
        Ok(PendingBooking { class })
    }

    /// Awaits the backend and confirms or rolls back the optimistic update.
    pub async fn complete(&self, pending: PendingBooking) -> BookingResult {
        let class_id = pending.class.id;
        let outcome = self.backend.attempt_booking(&class_id).await;

        let (result, notification) = match outcome {
            Ok(true) => {
                self.settle(&class_id, true).await;
                (
                    BookingResult {
                        success: true,
                        class_id: class_id.clone(),
                        error: None,
                    },
                    Notification::success(
                        "Class Booked!",
                        "Your class has been successfully booked.",
                    ),
                )
            }
            Ok(false) => {
                self.settle(&class_id, false).await;
                (
                    BookingResult {
                        success: false,
                        class_id: class_id.clone(),
                        error: Some("Booking rejected".to_string()),
                    },
                    Notification::error(
                        "Booking Failed",
                        "Unable to book this class. Please try again.",
                    ),
                )
            }
            Err(err) => {
                warn!(class_id = %class_id, error = %err, "booking backend failed");
                self.settle(&class_id, false).await;
                (
                    BookingResult {
                        success: false,
                        class_id: class_id.clone(),
                        error: Some(err.to_string()),
                    },
                    Notification::error("Booking Error", "Something went wrong. Please try again."),
                )
            }
        };

        self.notifier.notify(notification.for_class(class_id));
        result
    }

    pub async fn book(&self, class_id: &str) -> Result<BookingResult, BookingError> {
        let pending = self.begin(class_id).await?;
        Ok(self.complete(pending).await)
    }

    async fn settle(&self, class_id: &str, booked: bool) {
        let mut attempts = self.attempts.lock().await;
        self.catalog.write().await.set_booked(class_id, booked);
        let status = if booked {
            BookingStatus::Booked
        } else {
            BookingStatus::Idle
        };
        attempts.insert(class_id.to_string(), status);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tokio::sync::Notify;

    use super::*;
    use crate::catalog::Catalog;
    use crate::models::NotificationKind;
    use crate::notify::NotificationLog;

    /// Succeeds for every id except those listed in `reject` or `fault`.
    #[derive(Default)]
    struct ScriptedBackend {
        reject: HashSet<String>,
        fault: HashSet<String>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedBackend {
        fn rejecting(ids: &[&str]) -> Self {
            Self {
                reject: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        fn faulting(ids: &[&str]) -> Self {
            Self {
                fault: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl BookingBackend for ScriptedBackend {
        async fn attempt_booking(&self, class_id: &str) -> Result<bool, BackendError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fault.contains(class_id) {
                return Err(BackendError::Unavailable("connection reset".into()));
            }
            Ok(!self.reject.contains(class_id))
        }
    }

    fn flow_with(backend: ScriptedBackend) -> (BookingFlow, SharedCatalog, Arc<NotificationLog>) {
        let catalog = Catalog::seed().into_shared();
        let log = Arc::new(NotificationLog::default());
        let flow = BookingFlow::new(catalog.clone(), Arc::new(backend), log.clone());
        (flow, catalog, log)
    }

    async fn is_booked(catalog: &SharedCatalog, id: &str) -> bool {
        catalog.read().await.get(id).unwrap().is_booked
    }

    #[tokio::test]
    async fn test_begin_marks_booked_before_settling() {
        let (flow, catalog, log) = flow_with(ScriptedBackend::default());

        let pending = flow.begin("1").await.unwrap();
        assert!(is_booked(&catalog, "1").await);
        assert_eq!(flow.status("1").await, BookingStatus::Pending);
        assert!(log.is_empty());

        flow.complete(pending).await;
    }

    #[tokio::test]
    async fn test_success_keeps_booking() {
        let (flow, catalog, log) = flow_with(ScriptedBackend::default());

        let result = flow.book("2").await.unwrap();
        assert!(result.success);
        assert_eq!(result.class_id, "2");
        assert!(is_booked(&catalog, "2").await);
        assert_eq!(flow.status("2").await, BookingStatus::Booked);

        let notes = log.recent();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Success);
        assert_eq!(notes[0].class_id.as_deref(), Some("2"));
        assert_eq!(notes[0].title, "Class Booked!");
    }

    #[tokio::test]
    async fn test_rejection_rolls_back() {
        let (flow, catalog, log) = flow_with(ScriptedBackend::rejecting(&["3"]));

        let result = flow.book("3").await.unwrap();
        assert!(!result.success);
        assert!(!is_booked(&catalog, "3").await);
        assert_eq!(flow.status("3").await, BookingStatus::Idle);

        let notes = log.recent();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].title, "Booking Failed");
        assert_eq!(notes[0].class_id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_fault_rolls_back_like_rejection() {
        let (flow, catalog, log) = flow_with(ScriptedBackend::faulting(&["4"]));

        let result = flow.book("4").await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("connection reset"));
        assert!(!is_booked(&catalog, "4").await);
        assert_eq!(flow.status("4").await, BookingStatus::Idle);

        let notes = log.recent();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Booking Error");
    }

    #[tokio::test]
    async fn test_rejected_class_can_be_retried() {
        let (flow, catalog, _log) = flow_with(ScriptedBackend::rejecting(&["5"]));
        flow.book("5").await.unwrap();
        let pending = flow.begin("5").await.unwrap();
        assert!(is_booked(&catalog, "5").await);
        flow.complete(pending).await;
    }

    #[tokio::test]
    async fn test_unknown_class() {
        let (flow, _catalog, log) = flow_with(ScriptedBackend::default());
        let err = flow.book("nope").await.unwrap_err();
        assert!(matches!(err, BookingError::UnknownClass(_)));
        assert_eq!(flow.status("nope").await, BookingStatus::Idle);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_second_attempt_while_in_flight_is_refused() {
        let (flow, _catalog, log) = flow_with(ScriptedBackend::default());

        let pending = flow.begin("6").await.unwrap();
        let err = flow.begin("6").await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyInFlight(id) if id == "6"));

        flow.complete(pending).await;
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_attempts_on_different_classes_are_independent() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend {
            reject: ["8".to_string()].into(),
            gate: Some(gate.clone()),
            ..ScriptedBackend::default()
        };
        let (flow, catalog, log) = flow_with(backend);

        let first = flow.begin("7").await.unwrap();
        let second = flow.begin("8").await.unwrap();
        assert!(is_booked(&catalog, "7").await);
        assert!(is_booked(&catalog, "8").await);

        let both = futures::future::join(flow.complete(first), flow.complete(second));
        let release = async {
            tokio::task::yield_now().await;
            gate.notify_waiters();
        };
        let ((r7, r8), ()) = futures::future::join(both, release).await;

        assert!(r7.success);
        assert!(!r8.success);
        assert!(is_booked(&catalog, "7").await);
        assert!(!is_booked(&catalog, "8").await);
        assert_eq!(flow.status("7").await, BookingStatus::Booked);
        assert_eq!(flow.status("8").await, BookingStatus::Idle);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_simulated_backend_bounds() {
        let always = SimulatedBackend::new(Duration::ZERO, 0.0);
        assert!(always.attempt_booking("1").await.unwrap());

        let never = SimulatedBackend::new(Duration::ZERO, 1.0);
        assert!(!never.attempt_booking("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_simulated_backend_non_finite_rate_never_fails() {
        for rate in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let backend = SimulatedBackend::new(Duration::ZERO, rate);
            assert!(backend.attempt_booking("1").await.unwrap());
        }
    }
}

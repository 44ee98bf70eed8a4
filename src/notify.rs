use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{NotificationAPI, OptInOutcome};
use crate::error::Error;

/// Per-vehicle proximity-notification opt-in with timed auto-expiry.
pub struct NotificationToggle<N> {
    api: Arc<N>,
    pending: HashMap<String, JoinHandle<()>>,
}

impl<N> NotificationToggle<N>
where
    N: NotificationAPI + Send + Sync + 'static,
{
    pub fn new(api: Arc<N>) -> Self {
        Self {
            api,
            pending: HashMap::new(),
        }
    }

    /// Opts a vehicle in and schedules the automatic opt-out after
    /// `window`. If a record already exists server-side the create
    /// conflicts and we reactivate it instead. Calling again for the
    /// same vehicle restarts the window: the earlier deactivation is
    /// cancelled, not raced.
    #[tracing::instrument(skip(self, push_token))]
    pub async fn enable(
        &mut self,
        vehicle_id: &str,
        push_token: &str,
        window: Duration,
    ) -> Result<(), Error> {
        match self.api.create_opt_in(vehicle_id, push_token).await? {
            OptInOutcome::Created => {}
            OptInOutcome::AlreadyExists => {
                tracing::info!("opt-in exists, reactivating");
                self.api.set_opt_in_active(vehicle_id, true).await?;
            }
        }

        self.schedule_deactivation(vehicle_id, window);

        Ok(())
    }

    fn schedule_deactivation(&mut self, vehicle_id: &str, window: Duration) {
        if let Some(earlier) = self.pending.remove(vehicle_id) {
            earlier.abort();
        }

        let api = self.api.clone();
        let vehicle = vehicle_id.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            // fire-and-forget: a failed opt-out is logged, never retried
            if let Err(err) = api.set_opt_in_active(&vehicle, false).await {
                tracing::warn!(?err, %vehicle, "automatic opt-out failed");
            }
        });

        self.pending.insert(vehicle_id.to_string(), handle);
    }
}

#[cfg(test)]
mod support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct CountingApi {
        pub creates: AtomicUsize,
        pub activates: AtomicUsize,
        pub deactivates: AtomicUsize,
        pub fail_deactivate: bool,
        pub exists: AtomicBool,
    }

    #[async_trait]
    impl NotificationAPI for CountingApi {
        async fn create_opt_in(
            &self,
            _vehicle_id: &str,
            _push_token: &str,
        ) -> Result<OptInOutcome, Error> {
            self.creates.fetch_add(1, Ordering::SeqCst);

            if self.exists.swap(true, Ordering::SeqCst) {
                Ok(OptInOutcome::AlreadyExists)
            } else {
                Ok(OptInOutcome::Created)
            }
        }

        async fn set_opt_in_active(&self, _vehicle_id: &str, active: bool) -> Result<(), Error> {
            if active {
                self.activates.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }

            self.deactivates.fetch_add(1, Ordering::SeqCst);

            if self.fail_deactivate {
                return Err(crate::error::upstream_error());
            }

            Ok(())
        }
    }

    pub async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn deactivation_fires_after_window() {
    use std::sync::atomic::Ordering;
    use support::{settle, CountingApi};

    let api = Arc::new(CountingApi::default());
    let mut toggle = NotificationToggle::new(api.clone());

    toggle
        .enable("A", "token", Duration::from_secs(10))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    settle().await;
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 0);

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(api.creates.load(Ordering::SeqCst), 1);
    assert_eq!(api.activates.load(Ordering::SeqCst), 0);
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn double_enable_hits_conflict_and_restarts_window() {
    use std::sync::atomic::Ordering;
    use support::{settle, CountingApi};

    let api = Arc::new(CountingApi::default());
    let mut toggle = NotificationToggle::new(api.clone());

    toggle
        .enable("A", "token", Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;

    // second opt-in conflicts server-side and reactivates instead
    toggle
        .enable("A", "token", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(api.creates.load(Ordering::SeqCst), 2);
    assert_eq!(api.activates.load(Ordering::SeqCst), 1);

    // the first timer was cancelled; nothing fires at its deadline
    tokio::time::advance(Duration::from_secs(31)).await;
    settle().await;
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 0);

    // only the restarted window fires
    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn vehicles_expire_independently() {
    use std::sync::atomic::Ordering;
    use support::{settle, CountingApi};

    let api = Arc::new(CountingApi::default());
    let mut toggle = NotificationToggle::new(api.clone());

    toggle
        .enable("A", "token", Duration::from_secs(10))
        .await
        .unwrap();
    toggle
        .enable("B", "token", Duration::from_secs(20))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    settle().await;
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_deactivation_is_only_logged() {
    use std::sync::atomic::Ordering;
    use support::{settle, CountingApi};

    let api = Arc::new(CountingApi {
        fail_deactivate: true,
        ..Default::default()
    });
    let mut toggle = NotificationToggle::new(api.clone());

    toggle
        .enable("A", "token", Duration::from_secs(5))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;

    // the failure stayed inside the deferred task
    assert_eq!(api.deactivates.load(Ordering::SeqCst), 1);

    // and the controller still works afterwards
    toggle
        .enable("A", "token", Duration::from_secs(5))
        .await
        .unwrap();
}

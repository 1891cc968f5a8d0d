//! Periodic guild count posting.
//!
//! A [`Scheduler`] owns one background tokio task while running. The task
//! waits one interval, posts, and repeats; failures are logged and the loop
//! carries on. Because each cycle runs to completion before the next wait
//! starts, a slow request delays the next post instead of overlapping it.

use crate::auth::CredentialStore;
use crate::client::BotBlockClient;
use crate::config::{PostingConfig, validate_interval};
use crate::error::{BotBlockError, Result};
use crate::source::BotSource;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct RunningTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// State shared between the scheduler handle and its task.
struct Shared {
    client: BotBlockClient,
    credentials: CredentialStore,
    source: RwLock<Option<BotSource>>,
    period: RwLock<Duration>,
}

/// Start/stop handle for periodic posting.
pub struct Scheduler {
    shared: Arc<Shared>,
    running: Mutex<Option<RunningTask>>,
}

impl Scheduler {
    /// Create a stopped scheduler.
    pub fn new(client: BotBlockClient, credentials: CredentialStore, config: PostingConfig) -> Self {
        let period = minutes(config.update_interval());
        Self {
            shared: Arc::new(Shared {
                client,
                credentials,
                source: RwLock::new(config.source),
                period: RwLock::new(period),
            }),
            running: Mutex::new(None),
        }
    }

    /// Create a scheduler and start it right away if `config.auto_post` is set.
    pub fn launch(
        client: BotBlockClient,
        credentials: CredentialStore,
        config: PostingConfig,
    ) -> Result<Self> {
        let auto_post = config.auto_post;
        let scheduler = Self::new(client, credentials, config);
        if auto_post {
            scheduler.start()?;
        }
        Ok(scheduler)
    }

    /// Begin posting every interval. The first post happens after one interval.
    ///
    /// Fails with [`BotBlockError::InvalidState`] when called outside a tokio
    /// runtime.
    pub fn start(&self) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(BotBlockError::InvalidState(
                "scheduler is already running".to_string(),
            ));
        }
        if self.shared.source.read().is_none() {
            return Err(BotBlockError::InvalidState(
                "no bot source configured".to_string(),
            ));
        }

        let runtime = Handle::try_current()
            .map_err(|_| BotBlockError::InvalidState("no tokio runtime".to_string()))?;

        let (stop, stopped) = oneshot::channel();
        let handle = runtime.spawn(run(Arc::clone(&self.shared), stopped));
        *running = Some(RunningTask { stop, handle });

        info!(
            interval_minutes = self.update_interval(),
            "Started guild count scheduler"
        );
        Ok(())
    }

    /// Cancel future posts. A post already in flight is allowed to finish.
    pub fn stop(&self) -> Result<()> {
        let task = self.running.lock().take().ok_or_else(|| {
            BotBlockError::InvalidState("scheduler is not running".to_string())
        })?;

        // The task may already have exited; nothing to do then.
        let _ = task.stop.send(());
        drop(task.handle);

        info!("Stopped guild count scheduler");
        Ok(())
    }

    /// Whether the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Set the interval in minutes; must be at least 1.
    ///
    /// While running, the new interval applies from the next scheduled wait.
    pub fn set_update_interval(&self, minutes_between: u32) -> Result<()> {
        validate_interval(minutes_between)?;
        *self.shared.period.write() = minutes(minutes_between);
        debug!(interval_minutes = minutes_between, "Updated posting interval");
        Ok(())
    }

    /// Current interval in minutes.
    pub fn update_interval(&self) -> u32 {
        u32::try_from(self.shared.period.read().as_secs() / 60).unwrap_or(u32::MAX)
    }

    /// Replace the bot source used by subsequent posts.
    pub fn set_source(&self, source: BotSource) {
        *self.shared.source.write() = Some(source);
    }

    /// The credential store posts read from.
    pub fn credentials(&self) -> &CredentialStore {
        &self.shared.credentials
    }

    #[cfg(test)]
    fn set_period(&self, period: Duration) {
        *self.shared.period.write() = period;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(task) = self.running.get_mut().take() {
            let _ = task.stop.send(());
        }
    }
}

fn minutes(count: u32) -> Duration {
    Duration::from_secs(u64::from(count) * 60)
}

async fn run(shared: Arc<Shared>, mut stopped: oneshot::Receiver<()>) {
    loop {
        let period = *shared.period.read();
        tokio::select! {
            () = tokio::time::sleep(period) => {}
            _ = &mut stopped => break,
        }

        post_once(&shared).await;
    }
    debug!("Guild count scheduler task exited");
}

async fn post_once(shared: &Shared) {
    let source = shared.source.read().clone();
    let Some(source) = source else {
        error!("Scheduled post skipped: no bot source configured");
        return;
    };

    match shared.client.post_guilds(&source, &shared.credentials).await {
        Ok(response) => {
            debug!(sites = response.succeeded.len(), "Scheduled post succeeded");
        }
        Err(BotBlockError::RateLimited(limit)) => {
            warn!(
                bot_id = %limit.bot_id,
                retry_after = limit.retry_after_seconds,
                "Scheduled post rate limited"
            );
        }
        Err(e) => {
            warn!(error = %e, "Scheduled post failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BotBlockClient {
        BotBlockClient::with_config(&ClientConfig {
            endpoint: format!("{}/api/count", server.uri()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn configured() -> PostingConfig {
        PostingConfig::new().with_source(BotSource::fixed("42", 7).unwrap())
    }

    fn offline_client() -> BotBlockClient {
        BotBlockClient::with_config(&ClientConfig {
            endpoint: "http://127.0.0.1:9/api/count".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let scheduler = Scheduler::new(offline_client(), CredentialStore::new(), configured());

        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.start(),
            Err(BotBlockError::InvalidState(_))
        ));
        assert!(scheduler.is_running());
    }

    #[tokio::test]
    async fn test_stop_then_start_resumes_posting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"failure": []})))
            .mount(&server)
            .await;

        let scheduler = Scheduler::new(client_for(&server), CredentialStore::new(), configured());
        scheduler.set_period(Duration::from_millis(50));

        assert!(matches!(scheduler.stop(), Err(BotBlockError::InvalidState(_))));
        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.stop().unwrap();
        assert!(!scheduler.is_running());

        let before = server.received_requests().await.unwrap().len();

        scheduler.start().unwrap();
        assert!(scheduler.is_running());
        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.stop().unwrap();

        let after = server.received_requests().await.unwrap().len();
        assert!(after >= before + 2, "before restart {before}, after {after}");
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let scheduler = Scheduler::new(offline_client(), CredentialStore::new(), configured());

        assert!(matches!(
            scheduler.start(),
            Err(BotBlockError::InvalidState(_))
        ));
        assert!(!scheduler.is_running());
        assert!(matches!(
            Scheduler::launch(
                offline_client(),
                CredentialStore::new(),
                configured().with_auto_post(true),
            ),
            Err(BotBlockError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_interval_change_applies_next_period() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"failure": []})))
            .mount(&server)
            .await;

        let scheduler = Scheduler::new(client_for(&server), CredentialStore::new(), configured());
        scheduler.set_period(Duration::from_secs(1));
        scheduler.start().unwrap();

        // Let the task enter its first one second wait before shortening it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.set_period(Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(server.received_requests().await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        scheduler.stop().unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received.len() >= 3, "only {} posts", received.len());
    }

    #[tokio::test]
    async fn test_start_without_source_fails() {
        let scheduler = Scheduler::new(
            offline_client(),
            CredentialStore::new(),
            PostingConfig::new(),
        );
        assert!(matches!(
            scheduler.start(),
            Err(BotBlockError::InvalidState(_))
        ));

        scheduler.set_source(BotSource::fixed(1, 1).unwrap());
        assert!(scheduler.start().is_ok());
    }

    #[tokio::test]
    async fn test_launch_honours_auto_post() {
        let idle = Scheduler::launch(offline_client(), CredentialStore::new(), configured()).unwrap();
        assert!(!idle.is_running());

        let auto = Scheduler::launch(
            offline_client(),
            CredentialStore::new(),
            configured().with_auto_post(true),
        )
        .unwrap();
        assert!(auto.is_running());
    }

    #[test]
    fn test_set_update_interval() {
        let scheduler = Scheduler::new(offline_client(), CredentialStore::new(), configured());
        assert_eq!(scheduler.update_interval(), 30);

        assert!(matches!(
            scheduler.set_update_interval(0),
            Err(BotBlockError::InvalidArgument(_))
        ));
        scheduler.set_update_interval(1).unwrap();
        assert_eq!(scheduler.update_interval(), 1);
    }

    #[tokio::test]
    async fn test_fires_repeatedly_and_survives_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/count"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let scheduler = Scheduler::new(client_for(&server), CredentialStore::new(), configured());
        scheduler.set_period(Duration::from_millis(50));
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        scheduler.stop().unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received.len() >= 2, "only {} posts", received.len());
    }

    #[tokio::test]
    async fn test_first_fire_waits_one_interval() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"failure": []})))
            .mount(&server)
            .await;

        let scheduler = Scheduler::new(client_for(&server), CredentialStore::new(), configured());
        scheduler.set_period(Duration::from_millis(300));
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.received_requests().await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credentials_are_reread_each_tick() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"failure": []})))
            .mount(&server)
            .await;

        let credentials = CredentialStore::new();
        let scheduler = Scheduler::new(client_for(&server), credentials.clone(), configured());
        scheduler.set_period(Duration::from_millis(100));
        credentials.set("first.com", "a").unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        credentials.bulk_replace([("second.com", "b")]).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        scheduler.stop().unwrap();

        let received = server.received_requests().await.unwrap();
        let last: serde_json::Value = received.last().unwrap().body_json().unwrap();
        assert_eq!(last["second.com"], "b");
        assert!(last.get("first.com").is_none());
    }
}

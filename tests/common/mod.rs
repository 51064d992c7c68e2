#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Mutex;

use lousa::clock::Clock;
use lousa::config::{Config, ConsistencyMode};
use lousa::error::RemoteError;
use lousa::gamification::GamificationEngine;
use lousa::models::{ActivityItem, ActivitySnapshot, ItemType, PostNoticePayload, SubmitActivityPayload, UserRef};
use lousa::notifications::{NotificationRequest, NotificationSink};
use lousa::remote::memory::MemoryStore;
use lousa::remote::{DocumentStore, FieldDeltas};
use lousa::state::SharedState;
use lousa::{Services, build_engine};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    });
}

// ── Deterministic clock ─────────────────────────────────────────

/// Fixed-point clock the tests can advance by hand.
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: StdMutex::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, seconds: i64) {
        *self.now.lock().unwrap() += chrono::Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ── Remote store with injected failures ─────────────────────────

/// `MemoryStore` decorator that injects outages and latency per document
/// or collection.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_docs: Mutex<HashSet<String>>,
    fail_collections: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_docs: Mutex::new(HashSet::new()),
            fail_collections: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Every operation touching this document id fails until `heal`.
    pub async fn fail_doc(&self, id: &str) {
        self.fail_docs.lock().await.insert(id.to_string());
    }

    /// Every operation on this collection fails until `heal`.
    pub async fn fail_collection(&self, name: &str) {
        self.fail_collections.lock().await.insert(name.to_string());
    }

    pub async fn heal(&self) {
        self.fail_docs.lock().await.clear();
        self.fail_collections.lock().await.clear();
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    async fn gate(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.fail_collections.lock().await.contains(collection)
            || self.fail_docs.lock().await.contains(id)
        {
            return Err(RemoteError::Unavailable(format!(
                "injected outage for {collection}/{id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, RemoteError> {
        self.gate(collection, id).await?;
        self.inner.get_document(collection, id).await
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
        merge: bool,
    ) -> Result<(), RemoteError> {
        self.gate(collection, id).await?;
        self.inner.set_document(collection, id, fields, merge).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        deltas: FieldDeltas,
    ) -> Result<(), RemoteError> {
        self.gate(collection, id).await?;
        self.inner.update_fields(collection, id, deltas).await
    }

    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected: &[(String, Value)],
        deltas: FieldDeltas,
    ) -> Result<bool, RemoteError> {
        self.gate(collection, id).await?;
        self.inner
            .compare_and_update(collection, id, expected, deltas)
            .await
    }

    async fn add_document(&self, collection: &str, fields: Value) -> Result<String, RemoteError> {
        self.gate(collection, "").await?;
        self.inner.add_document(collection, fields).await
    }
}

// ── Recording collaborators ─────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<NotificationRequest>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn create(&self, request: NotificationRequest) -> Result<(), RemoteError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("notification sink down".into()));
        }
        self.sent.lock().await.push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingGamification {
    pub events: Mutex<Vec<(String, String, i64)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl GamificationEngine for RecordingGamification {
    async fn process_event(
        &self,
        user_id: &str,
        event: &str,
        base_points: i64,
    ) -> Result<Vec<String>, RemoteError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("gamification down".into()));
        }
        self.events
            .lock()
            .await
            .push((user_id.to_string(), event.to_string(), base_points));
        Ok(Vec::new())
    }
}

// ── Harness ─────────────────────────────────────────────────────

pub struct Harness {
    pub state: SharedState,
    pub remote: Arc<FlakyStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub gamification: Arc<RecordingGamification>,
    pub clock: Arc<ManualClock>,
    pub config: Config,
    _dir: TempDir,
}

pub fn spawn() -> Harness {
    spawn_with(|_| {})
}

pub fn spawn_with(tweak: impl FnOnce(&mut Config)) -> Harness {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config {
        queue_path: dir.path().join("queue.db"),
        action_timeout: Duration::from_secs(5),
        consistency: ConsistencyMode::BestEffort,
        cas_attempts: 3,
        log_level: "debug".into(),
    };
    tweak(&mut config);

    let remote = Arc::new(FlakyStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let gamification = Arc::new(RecordingGamification::default());
    let clock = Arc::new(ManualClock::new());

    let state = build_engine(
        config.clone(),
        Services {
            remote: remote.clone(),
            notifications: notifier.clone(),
            gamification: gamification.clone(),
            clock: clock.clone(),
        },
    )
    .expect("build engine");

    Harness {
        state,
        remote,
        notifier,
        gamification,
        clock,
        config,
        _dir: dir,
    }
}

/// Rebuilds the engine over the same queue database, as a process restart
/// would.
pub fn restart(h: &Harness) -> SharedState {
    build_engine(
        h.config.clone(),
        Services {
            remote: h.remote.clone(),
            notifications: h.notifier.clone(),
            gamification: h.gamification.clone(),
            clock: h.clock.clone(),
        },
    )
    .expect("rebuild engine")
}

// ── Payload and seed helpers ────────────────────────────────────

pub fn mc_item(id: &str, points: f64, correct: &str) -> ActivityItem {
    ActivityItem {
        id: id.into(),
        item_type: ItemType::MultipleChoice,
        points,
        correct_option_id: Some(correct.into()),
    }
}

pub fn text_item(id: &str) -> ActivityItem {
    ActivityItem {
        id: id.into(),
        item_type: ItemType::Text,
        points: 0.0,
        correct_option_id: None,
    }
}

pub fn submit_payload(
    activity_id: &str,
    student_id: &str,
    content: &str,
    items: Vec<ActivityItem>,
) -> SubmitActivityPayload {
    SubmitActivityPayload {
        activity_id: activity_id.into(),
        content: content.into(),
        user: UserRef {
            id: student_id.into(),
            name: "João".into(),
        },
        activity_data: ActivitySnapshot {
            title: "Lista de exercícios".into(),
            class_id: Some("C1".into()),
            items,
            grading_config: None,
        },
    }
}

pub fn notice_payload(class_id: &str, text: &str) -> PostNoticePayload {
    PostNoticePayload {
        class_id: class_id.into(),
        text: text.into(),
        author_name: "Prof. Ana".into(),
        author_id: "T1".into(),
    }
}

pub async fn seed_activity(h: &Harness, id: &str, title: &str) {
    h.remote
        .set_document(
            "activities",
            id,
            json!({
                "title": title,
                "classId": "C1",
                "submissions": [],
                "submissionCount": 0,
                "pendingSubmissionCount": 0,
            }),
            false,
        )
        .await
        .expect("seed activity");
}

pub async fn seed_class(h: &Harness, id: &str, name: &str) {
    h.remote
        .set_document(
            "classes",
            id,
            json!({
                "name": name,
                "notices": [],
                "noticeCount": 0,
            }),
            false,
        )
        .await
        .expect("seed class");
}

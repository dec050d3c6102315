//! End-to-end engine tests against a scripted API backend.
//!
//! Time is paused and auto-advanced by the tokio test runtime, so interval
//! and latency interleavings are deterministic.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use vitalsync_client::error::{ErrorKind, SyncError, SyncResult};
use vitalsync_client::{SyncEngine, VitalsApi};
use vitalsync_model::{PredictionPayload, TelemetryColumns};

const POLL: Duration = Duration::from_millis(10_000);

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type Scripted<T> = VecDeque<(Duration, SyncResult<T>)>;

#[derive(Default)]
struct Script {
    telemetry: Scripted<TelemetryColumns>,
    prediction: Scripted<PredictionPayload>,
    plot: Scripted<Vec<u8>>,
}

/// Scripted API: each endpoint pops `(latency, result)` entries, falling
/// back to a healthy default response once the script is exhausted.
struct MockApi {
    accept_login: bool,
    token: RwLock<Option<String>>,
    script: Mutex<Script>,
    telemetry_calls: AtomicUsize,
    prediction_calls: AtomicUsize,
    plot_calls: AtomicUsize,
}

impl MockApi {
    fn new(accept_login: bool) -> Arc<Self> {
        Arc::new(Self {
            accept_login,
            token: RwLock::new(None),
            script: Mutex::new(Script::default()),
            telemetry_calls: AtomicUsize::new(0),
            prediction_calls: AtomicUsize::new(0),
            plot_calls: AtomicUsize::new(0),
        })
    }

    async fn script_telemetry(&self, delay_ms: u64, result: SyncResult<TelemetryColumns>) {
        self.script
            .lock()
            .await
            .telemetry
            .push_back((Duration::from_millis(delay_ms), result));
    }

    async fn script_prediction(&self, delay_ms: u64, result: SyncResult<PredictionPayload>) {
        self.script
            .lock()
            .await
            .prediction
            .push_back((Duration::from_millis(delay_ms), result));
    }

    async fn script_plot(&self, delay_ms: u64, result: SyncResult<Vec<u8>>) {
        self.script
            .lock()
            .await
            .plot
            .push_back((Duration::from_millis(delay_ms), result));
    }
}

fn columns(base: f64) -> TelemetryColumns {
    TelemetryColumns {
        heart_rate: vec![base, base + 1.0],
        blood_pressure: vec![118.0, 121.0],
        temperature: vec![36.6, 36.8],
        moisture: vec![41.0, 43.0],
        body_water_content: vec![58.0, 57.5],
        fatigue_level: vec![0.2, 0.3],
        drowsiness_level: vec![0.1, 0.1],
    }
}

fn prediction(value: serde_json::Value) -> PredictionPayload {
    PredictionPayload { prediction: value }
}

#[async_trait]
impl VitalsApi for MockApi {
    async fn login(&self, _username: &str, _password: &str) -> SyncResult<String> {
        if self.accept_login {
            Ok("mock-token".to_string())
        } else {
            Err(SyncError::Auth("invalid credentials".to_string()))
        }
    }

    async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    async fn fetch_telemetry(&self) -> SyncResult<TelemetryColumns> {
        self.telemetry_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().await.telemetry.pop_front();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(columns(60.0)),
        }
    }

    async fn fetch_prediction(&self) -> SyncResult<PredictionPayload> {
        self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().await.prediction.pop_front();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(prediction(serde_json::json!(0.5))),
        }
    }

    async fn fetch_plot(&self) -> SyncResult<Vec<u8>> {
        self.plot_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().await.plot.pop_front();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(vec![0x89, 0x50, 0x4e, 0x47]),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn login_triggers_an_immediate_fetch_for_all_three_resources() {
    init_logs();
    let api = MockApi::new(true);
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.prediction_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.plot_calls.load(Ordering::SeqCst), 1);

    let telemetry = engine.store().telemetry.snapshot().await;
    assert_eq!(telemetry.value.as_ref().map(Vec::len), Some(2));
    assert!(!telemetry.loading);
    assert!(telemetry.error.is_none());

    let prediction = engine.store().prediction.snapshot().await;
    assert_eq!(prediction.value.map(|s| s.value()), Some(0.5));

    let graph = engine.store().graph.snapshot().await;
    assert!(graph.value.is_some());
}

#[tokio::test(start_paused = true)]
async fn rejected_login_starts_no_scheduling() {
    init_logs();
    let api = MockApi::new(false);
    let engine = SyncEngine::new(api.clone(), POLL);

    let err = engine.login("u", "wrong").await.unwrap_err();
    assert!(matches!(err, SyncError::Auth(_)));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.prediction_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.plot_calls.load(Ordering::SeqCst), 0);

    let session = engine.sessions().current();
    assert!(session.token.is_none());
    assert_eq!(session.generation, 0);
    assert!(engine.sessions().auth_error().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn resources_refetch_on_the_fixed_interval() {
    init_logs();
    let api = MockApi::new(true);
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20_500)).await;

    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 3);
    assert_eq!(api.prediction_calls.load(Ordering::SeqCst), 3);
    assert_eq!(api.plot_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_the_last_good_value() {
    init_logs();
    let api = MockApi::new(true);
    api.script_telemetry(0, Ok(columns(70.0))).await;
    api.script_telemetry(0, Err(SyncError::Network("connection refused".into())))
        .await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let first = engine.store().telemetry.snapshot().await;
    assert_eq!(first.value.as_ref().unwrap()[0].heart_rate, 70.0);

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    let second = engine.store().telemetry.snapshot().await;
    assert_eq!(second.error, Some(ErrorKind::Network));
    assert!(!second.loading);
    // Last good value persists until superseded by a success.
    assert_eq!(second.value.as_ref().unwrap()[0].heart_rate, 70.0);
}

#[tokio::test(start_paused = true)]
async fn unequal_columns_commit_nothing() {
    init_logs();
    let api = MockApi::new(true);
    let mut bad = columns(70.0);
    bad.fatigue_level.pop();
    api.script_telemetry(0, Ok(bad)).await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let telemetry = engine.store().telemetry.snapshot().await;
    assert!(telemetry.value.is_none());
    assert_eq!(telemetry.error, Some(ErrorKind::Decode));
}

#[tokio::test(start_paused = true)]
async fn prediction_accepts_numeric_strings_and_rejects_out_of_range() {
    init_logs();
    let api = MockApi::new(true);
    api.script_prediction(0, Ok(prediction(serde_json::json!("0.8732"))))
        .await;
    api.script_prediction(0, Ok(prediction(serde_json::json!(1.5))))
        .await;
    api.script_prediction(0, Ok(prediction(serde_json::json!("abc"))))
        .await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let first = engine.store().prediction.snapshot().await;
    assert!((first.value.unwrap().value() - 0.8732).abs() < 1e-9);

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    let second = engine.store().prediction.snapshot().await;
    assert_eq!(second.error, Some(ErrorKind::Decode));
    assert!((second.value.unwrap().value() - 0.8732).abs() < 1e-9);

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    let third = engine.store().prediction.snapshot().await;
    assert_eq!(third.error, Some(ErrorKind::Decode));
    assert!((third.value.unwrap().value() - 0.8732).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn exactly_one_graph_handle_survives_repeated_fetches() {
    init_logs();
    let api = MockApi::new(true);
    api.script_plot(0, Ok(vec![1])).await;
    api.script_plot(0, Ok(vec![2])).await;
    api.script_plot(0, Ok(vec![3])).await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20_500)).await;

    assert_eq!(api.plot_calls.load(Ordering::SeqCst), 3);
    assert_eq!(engine.blobs().released_count().await, 2);

    let live = engine.blobs().live().await.expect("one live handle");
    assert_eq!(live.bytes(), &[3]);
    let stored = engine.store().graph.snapshot().await.value.unwrap();
    assert_eq!(stored.id(), live.id());
}

#[tokio::test(start_paused = true)]
async fn response_from_a_stopped_generation_never_lands() {
    init_logs();
    let api = MockApi::new(true);
    // Generation 1's immediate fetch resolves at t=50ms.
    api.script_telemetry(50, Ok(columns(70.0))).await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.logout().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The t=50ms response arrived after the generation bump and was
    // discarded: no value, no error.
    let telemetry = engine.store().telemetry.snapshot().await;
    assert!(telemetry.value.is_none());
    assert!(telemetry.error.is_none());
    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn relogin_discards_the_old_generations_slow_response() {
    init_logs();
    let api = MockApi::new(true);
    // Generation 1: slow response carrying heart rate 70.
    api.script_telemetry(50, Ok(columns(70.0))).await;
    // Generation 2: fast response carrying heart rate 90.
    api.script_telemetry(5, Ok(columns(90.0))).await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    // Relogin at t=20ms: generation 2's immediate fetch commits at ~t=25ms;
    // generation 1's response at t=50ms must be discarded.
    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let telemetry = engine.store().telemetry.snapshot().await;
    assert_eq!(telemetry.value.as_ref().unwrap()[0].heart_rate, 90.0);
    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.sessions().current().generation, 2);
}

#[tokio::test(start_paused = true)]
async fn logout_halts_future_ticks() {
    init_logs();
    let api = MockApi::new(true);
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    engine.logout().await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(api.telemetry_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.prediction_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.plot_calls.load(Ordering::SeqCst), 1);
    assert!(engine.sessions().current().token.is_none());
}

#[tokio::test(start_paused = true)]
async fn resource_failures_stay_confined_to_their_own_slot() {
    init_logs();
    let api = MockApi::new(true);
    api.script_prediction(0, Err(SyncError::Network("boom".into())))
        .await;
    let engine = SyncEngine::new(api.clone(), POLL);

    engine.login("u", "p").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let prediction = engine.store().prediction.snapshot().await;
    assert_eq!(prediction.error, Some(ErrorKind::Network));

    // The other two resources are unaffected and the session survives.
    assert!(engine.store().telemetry.snapshot().await.error.is_none());
    assert!(engine.store().graph.snapshot().await.error.is_none());
    assert!(engine.sessions().current().is_authenticated());

    // The next tick recovers the failed resource.
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    let recovered = engine.store().prediction.snapshot().await;
    assert!(recovered.error.is_none());
    assert_eq!(recovered.value.map(|s| s.value()), Some(0.5));
}

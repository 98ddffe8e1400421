use crate::audio::pipeline::RenderPipeline;
use crate::audio::SAMPLE_RATE;
use crate::error::EngineError;
use crate::events::{CueLabel, GuidanceEvent, GuidanceKind};
use crate::output::{OutputSink, SinkSpec};
use crate::state::{EngineStats, Environment, GuidanceState, Orientation, Position3D};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Position error band in meters; no cue inside it.
pub const POSITION_TOLERANCE: f32 = 0.02;
/// Alignment error band in degrees.
pub const ALIGNMENT_TOLERANCE: f32 = 5.0;
/// Tempo error band in ratio units around the 1.0 ideal.
pub const TEMPO_TOLERANCE: f32 = 0.1;

const IDEAL_TEMPO: f32 = 1.0;

/// Most cues the render worker may have waiting under the `Queue`
/// policy. Each pending cue is roughly a second of audio, so the bound
/// caps how far playback can lag behind the live state.
const MAX_PENDING_CUES: usize = 4;

/// What happens to a cue selected while another is still rendering.
/// Either way the skipped deviation is re-evaluated on the next tick, so
/// nothing is permanently lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Drop the new cue; keeps cues from piling up behind a long one.
    #[default]
    Skip,
    /// Queue cues FIFO and play every one to completion.
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ideal_club_position: Position3D,
    pub tick_interval_ms: u64,
    pub overlap_policy: OverlapPolicy,
    pub sample_rate: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ideal_club_position: Position3D::default(),
            tick_interval_ms: 100,
            overlap_policy: OverlapPolicy::default(),
            sample_rate: SAMPLE_RATE,
        }
    }
}

/// Pick at most one correction for the current snapshot. Priority is
/// position, then alignment, then tempo; the first kind whose error
/// strictly exceeds its tolerance wins the tick.
pub fn evaluate(state: &GuidanceState, ideal_club_position: Position3D) -> Option<GuidanceEvent> {
    let diff = state.club_position - ideal_club_position;
    let position_error = diff.magnitude();
    if position_error > POSITION_TOLERANCE {
        let label = dominant_axis_label(diff);
        return Some(GuidanceEvent::new(
            GuidanceKind::Position,
            label,
            position_error,
        ));
    }

    if state.target_alignment_deg.abs() > ALIGNMENT_TOLERANCE {
        let label = if state.target_alignment_deg > ALIGNMENT_TOLERANCE {
            CueLabel::RotateLeft
        } else {
            CueLabel::RotateRight
        };
        return Some(GuidanceEvent::new(GuidanceKind::Alignment, label, 1.0));
    }

    if (state.swing_tempo - IDEAL_TEMPO).abs() > TEMPO_TOLERANCE {
        let label = if state.swing_tempo > IDEAL_TEMPO + TEMPO_TOLERANCE {
            CueLabel::SlowDown
        } else {
            CueLabel::SpeedUp
        };
        return Some(GuidanceEvent::new(GuidanceKind::Tempo, label, 1.0));
    }

    None
}

/// Direction of the dominant offending axis: x, then y, then z, each
/// checked against the tolerance in that order. If the total error
/// exceeds the band but no single axis does, the largest axis decides.
fn dominant_axis_label(diff: Position3D) -> CueLabel {
    let axes = [
        (diff.x, CueLabel::Right, CueLabel::Left),
        (diff.y, CueLabel::Up, CueLabel::Down),
        (diff.z, CueLabel::Forward, CueLabel::Back),
    ];
    for (value, positive, negative) in axes {
        if value.abs() > POSITION_TOLERANCE {
            return if value > 0.0 { positive } else { negative };
        }
    }
    let (value, positive, negative) = axes
        .into_iter()
        .max_by(|a, b| a.0.abs().total_cmp(&b.0.abs()))
        .unwrap_or(axes[0]);
    if value >= 0.0 {
        positive
    } else {
        negative
    }
}

enum WorkerMsg {
    Cue(GuidanceEvent),
    Shutdown,
}

#[derive(Default)]
struct StatsInner {
    last_event_kind: Option<GuidanceKind>,
    processing_time_ms: f32,
    write_failures: u64,
}

struct Shared {
    state: Mutex<GuidanceState>,
    orientation: Mutex<Option<Orientation>>,
    environment: Mutex<Environment>,
    stats: Mutex<StatsInner>,
    rendering: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodic decision loop over the live guidance state, feeding a single
/// render worker that owns the only path to the output sink.
pub struct GuidanceController {
    config: EngineConfig,
    shared: Arc<Shared>,
    sink: Arc<Mutex<Box<dyn OutputSink>>>,
    running: Arc<AtomicBool>,
    cue_tx: Option<crossbeam::channel::Sender<WorkerMsg>>,
    tick_thread: Option<JoinHandle<()>>,
    render_thread: Option<JoinHandle<()>>,
}

impl GuidanceController {
    pub fn new(config: EngineConfig, sink: Box<dyn OutputSink>) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(GuidanceState::default()),
                orientation: Mutex::new(None),
                environment: Mutex::new(Environment::default()),
                stats: Mutex::new(StatsInner::default()),
                rendering: AtomicBool::new(false),
            }),
            sink: Arc::new(Mutex::new(sink)),
            running: Arc::new(AtomicBool::new(false)),
            cue_tx: None,
            tick_thread: None,
            render_thread: None,
        }
    }

    /// IDLE → ACTIVE. Opens the sink, spins up the tick loop and render
    /// worker, and plays the startup cue. A failed sink open leaves the
    /// engine idle and is retryable. Starting while active is a no-op.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        lock(&self.sink).open(SinkSpec {
            sample_rate: self.config.sample_rate as u32,
            channels: 2,
        })?;

        self.running.store(true, Ordering::SeqCst);
        let (cue_tx, cue_rx) = crossbeam::channel::bounded::<WorkerMsg>(MAX_PENDING_CUES);

        self.render_thread = Some(spawn_render_worker(
            cue_rx,
            Arc::clone(&self.shared),
            Arc::clone(&self.sink),
            Arc::clone(&self.running),
            self.config.sample_rate,
        ));
        self.tick_thread = Some(spawn_tick_loop(
            cue_tx.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&self.running),
            self.config,
        ));

        let _ = cue_tx.send(WorkerMsg::Cue(GuidanceEvent::startup()));
        self.cue_tx = Some(cue_tx);

        info!("guidance engine started");
        Ok(())
    }

    /// ACTIVE → IDLE. Cancels the tick loop, discards pending cues,
    /// plays the shutdown cue, and releases the sink. Idempotent.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(tick) = self.tick_thread.take() {
            let _ = tick.join();
        }
        if let Some(tx) = self.cue_tx.take() {
            let _ = tx.send(WorkerMsg::Shutdown);
        }
        if let Some(render) = self.render_thread.take() {
            let _ = render.join();
        }
        lock(&self.sink).close();

        info!("guidance engine stopped");
    }

    pub fn update_position(&self, position: Position3D) {
        lock(&self.shared.state).club_position = position;
    }

    pub fn update_alignment(&self, angle_degrees: f32) {
        lock(&self.shared.state).target_alignment_deg = angle_degrees;
    }

    pub fn update_tempo(&self, ratio: f32) {
        lock(&self.shared.state).swing_tempo = ratio;
    }

    pub fn set_environment(&self, environment: Environment) {
        *lock(&self.shared.environment) = environment;
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        *lock(&self.shared.orientation) = Some(orientation);
    }

    /// Queue the confirmation tone, e.g. after a well-executed swing.
    /// Dropped if the cue backlog is already at its bound.
    pub fn play_confirmation(&self) {
        if let Some(tx) = &self.cue_tx {
            if tx.try_send(WorkerMsg::Cue(GuidanceEvent::confirmation())).is_err() {
                debug!("confirmation dropped, backlog full");
            }
        }
    }

    pub fn stats(&self) -> EngineStats {
        let inner = lock(&self.shared.stats);
        EngineStats {
            active: self.running.load(Ordering::SeqCst),
            last_event_kind: inner.last_event_kind,
            processing_time_ms: inner.processing_time_ms,
            head_tracking_available: lock(&self.shared.orientation).is_some(),
            environment: *lock(&self.shared.environment),
            write_failures: inner.write_failures,
        }
    }
}

impl Drop for GuidanceController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_tick_loop(
    cue_tx: crossbeam::channel::Sender<WorkerMsg>,
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    config: EngineConfig,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("swingcue-tick".into())
        .spawn(move || {
            let interval = Duration::from_millis(config.tick_interval_ms);
            while running.load(Ordering::SeqCst) {
                let snapshot = *lock(&shared.state);
                if let Some(event) = evaluate(&snapshot, config.ideal_club_position) {
                    let label = event.label;
                    let busy = shared.rendering.load(Ordering::SeqCst) || !cue_tx.is_empty();
                    if config.overlap_policy == OverlapPolicy::Skip && busy {
                        debug!(label = label.as_str(), "cue skipped, render in flight");
                    } else if cue_tx.try_send(WorkerMsg::Cue(event)).is_err() {
                        // Queue is at its bound; the deviation re-emits
                        // on a later tick once playback catches up.
                        debug!(label = label.as_str(), "cue dropped, backlog full");
                    }
                }
                std::thread::sleep(interval);
            }
        })
        .expect("failed to spawn tick thread")
}

fn spawn_render_worker(
    cue_rx: crossbeam::channel::Receiver<WorkerMsg>,
    shared: Arc<Shared>,
    sink: Arc<Mutex<Box<dyn OutputSink>>>,
    running: Arc<AtomicBool>,
    sample_rate: f32,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("swingcue-render".into())
        .spawn(move || {
            let pipeline = RenderPipeline::new(sample_rate);
            while let Ok(msg) = cue_rx.recv() {
                match msg {
                    WorkerMsg::Cue(event) => {
                        // stop() discards whatever was still queued.
                        if !running.load(Ordering::SeqCst) {
                            continue;
                        }
                        render_one(&pipeline, &event, &shared, &sink);
                    }
                    WorkerMsg::Shutdown => {
                        render_one(&pipeline, &GuidanceEvent::shutdown(), &shared, &sink);
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn render thread")
}

fn render_one(
    pipeline: &RenderPipeline,
    event: &GuidanceEvent,
    shared: &Shared,
    sink: &Mutex<Box<dyn OutputSink>>,
) {
    shared.rendering.store(true, Ordering::SeqCst);
    let started = Instant::now();

    let orientation = lock(&shared.orientation).unwrap_or_default();
    let environment = *lock(&shared.environment);

    match pipeline.render(event, orientation, environment) {
        Ok(bytes) => {
            if let Err(e) = lock(sink).write(&bytes) {
                warn!(label = event.label.as_str(), "sink write failed: {e}");
                lock(&shared.stats).write_failures += 1;
            }
        }
        Err(e) => {
            // A bad cue is dropped; the next qualifying tick re-emits.
            warn!(label = event.label.as_str(), "cue render failed: {e}");
        }
    }

    let mut stats = lock(&shared.stats);
    stats.last_event_kind = Some(event.kind);
    stats.processing_time_ms = started.elapsed().as_secs_f32() * 1000.0;
    drop(stats);

    shared.rendering.store(false, Ordering::SeqCst);
}

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use crate::metrics::Metrics;
use crate::simulation::material::Material;
use crate::simulation::model::{HeatingParams, InductionModel, ModelSnapshot};
use crate::simulation::visuals::{derive_frame, VisualFrame};

/// Latest rendered frame published by the loop
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub frame: u64,
    pub time_ms: f64,
    pub model: ModelSnapshot,
    pub visuals: VisualFrame,
}

/// A running simulation view. The frame task stops when the handle is dropped.
pub struct SimulationHandle {
    model: Arc<Mutex<InductionModel>>,
    started: Instant,
    frames: watch::Receiver<FrameSnapshot>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Mount a fresh simulation (temperature at ambient) and start its frame loop.
    /// Must be called from inside a tokio runtime.
    pub fn spawn(params: HeatingParams, frame_rate_hz: u32, metrics: Metrics) -> Self {
        let model = Arc::new(Mutex::new(InductionModel::new(params)));
        let started = Instant::now();
        let initial = {
            let m = model.lock();
            let snapshot = m.snapshot(0.0);
            FrameSnapshot {
                frame: 0,
                time_ms: 0.0,
                model: snapshot,
                visuals: derive_frame(&snapshot, 0.0),
            }
        };
        let (tx, rx) = watch::channel(initial);

        let period = Duration::from_secs_f64(1.0 / frame_rate_hz.max(1) as f64);
        let loop_model = model.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut frame: u64 = 0;
            loop {
                ticker.tick().await;
                let time_ms = started.elapsed().as_secs_f64() * 1000.0;
                let snapshot = {
                    let mut m = loop_model.lock();
                    m.step();
                    m.snapshot(time_ms)
                };
                frame += 1;
                metrics.record_frame();
                let published = FrameSnapshot {
                    frame,
                    time_ms,
                    model: snapshot,
                    visuals: derive_frame(&snapshot, time_ms),
                };
                if tx.send(published).is_err() {
                    tracing::debug!(frame = frame, "All frame receivers gone, stopping simulation loop");
                    break;
                }
            }
        });

        tracing::info!(frame_rate_hz = frame_rate_hz, "Simulation mounted");
        SimulationHandle { model, started, frames: rx, task }
    }

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    pub fn set_material(&self, material: Material) -> bool {
        let now = self.elapsed_ms();
        self.model.lock().set_material(material, now)
    }

    pub fn set_turns(&self, turns: u32) {
        self.model.lock().set_turns(turns);
    }

    pub fn set_current(&self, current: u32) {
        self.model.lock().set_current(current);
    }

    pub fn latest(&self) -> FrameSnapshot {
        self.frames.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameSnapshot> {
        self.frames.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

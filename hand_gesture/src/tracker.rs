//! Gesture input lifecycle: the camera + landmark inference thread.
//!
//! [`GestureInput`] owns a [`Camera`] and a [`HandLandmarker`].  Enabling it
//! moves both onto a worker thread that loops *capture → skip duplicate
//! timestamps → detect → publish*; disabling it clears the shared
//! [`SignalSlot`] and signals the worker to stop without waiting for it.
//! The devices are taken back on the next enable, so they can be restarted
//! later.
//!
//! | Failure | Effect |
//! |---|---|
//! | model load | status `ModelFailed`, never retried this session |
//! | camera denied | status `CameraDenied`, retried on the next enable |
//! | one detection | logged, previous signal kept |

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::signal::{hand_distance, FrameGate, GestureSignal, SignalSlot};
use crate::vision::{Camera, HandLandmarker};

// ════════════════════════════════════════════════════════════════════════════
// TrackerStatus
// ════════════════════════════════════════════════════════════════════════════

/// User-visible state of gesture input.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerStatus {
    /// Camera input switched off.
    Disabled,
    /// Loading the landmark model.
    Loading,
    /// Frames are being processed.
    Live,
    /// The model failed to load; gesture input is gone for this session.
    ModelFailed(String),
    /// The camera could not be opened.
    CameraDenied(String),
    /// The camera stream ended on its own.
    Ended,
}

impl TrackerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrackerStatus::Disabled        => "CAMERA OFF",
            TrackerStatus::Loading         => "LOADING MODEL",
            TrackerStatus::Live            => "LIVE",
            TrackerStatus::ModelFailed(_)  => "MODEL LOAD FAILED",
            TrackerStatus::CameraDenied(_) => "CAMERA ACCESS DENIED",
            TrackerStatus::Ended           => "CAMERA STREAM ENDED",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TrackerStatus::ModelFailed(_) | TrackerStatus::CameraDenied(_))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Worker plumbing
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
enum ModelState {
    Uninitialized,
    Ready,
    Failed(String),
}

/// The devices, moved onto the worker while it runs and back afterwards.
struct Devices {
    camera:     Box<dyn Camera>,
    landmarker: Box<dyn HandLandmarker>,
    model:      ModelState,
}

struct Worker {
    stop:   Arc<AtomicBool>,
    handle: JoinHandle<Devices>,
}

struct WorkerContext {
    slot:   Arc<SignalSlot>,
    status: Arc<Mutex<TrackerStatus>>,
    stop:   Arc<AtomicBool>,
    epoch:  u64,
}

impl WorkerContext {
    fn stopped(&self) -> bool { self.stop.load(Ordering::Acquire) }

    /// Report `status` unless this worker has been told to stop.  The flag is
    /// read under the status lock, which `disable` also holds while raising
    /// it, so a stopping worker cannot overwrite `Disabled`.
    fn set_status(&self, status: TrackerStatus) {
        let mut cell = self.status.lock().unwrap_or_else(|p| p.into_inner());
        if !self.stopped() {
            *cell = status;
        }
    }
}

fn set_status(cell: &Mutex<TrackerStatus>, status: TrackerStatus) {
    *cell.lock().unwrap_or_else(|p| p.into_inner()) = status;
}

fn run_inference(mut dev: Devices, ctx: WorkerContext) -> Devices {
    if dev.model == ModelState::Uninitialized {
        ctx.set_status(TrackerStatus::Loading);
        tracing::info!("loading hand landmark model");
        match dev.landmarker.initialize() {
            Ok(()) => dev.model = ModelState::Ready,
            Err(e) => {
                tracing::error!(error = %e, "hand landmark model unavailable");
                dev.model = ModelState::Failed(e.to_string());
                ctx.set_status(TrackerStatus::ModelFailed(e.to_string()));
                return dev;
            }
        }
    }
    if ctx.stopped() {
        return dev;
    }

    if let Err(e) = dev.camera.start() {
        tracing::error!(error = %e, "camera unavailable");
        ctx.set_status(TrackerStatus::CameraDenied(e.to_string()));
        return dev;
    }
    ctx.set_status(TrackerStatus::Live);
    tracing::info!("gesture tracking live");

    let mut gate = FrameGate::new();
    let mut processed = 0u64;
    while !ctx.stopped() {
        let frame = match dev.camera.frame() {
            Some(f) => f,
            None => {
                tracing::info!(frames = processed, "camera stream ended");
                ctx.slot.publish(ctx.epoch, GestureSignal::IDLE);
                ctx.set_status(TrackerStatus::Ended);
                break;
            }
        };
        if !gate.admit(frame.timestamp) {
            continue;
        }
        processed += 1;

        let result = dev.landmarker
            .detect(&frame, frame.timestamp * 1000.0)
            .and_then(|hands| hand_distance(&hands));
        match result {
            Ok(signal) => {
                if !ctx.slot.publish(ctx.epoch, signal) {
                    tracing::debug!("dropping gesture from a cancelled session");
                }
            }
            Err(e) => tracing::warn!(error = %e, timestamp = frame.timestamp, "detection failed; keeping previous gesture"),
        }
    }

    dev.camera.stop();
    dev
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInput
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the gesture inference thread.
pub struct GestureInput {
    slot:     Arc<SignalSlot>,
    status:   Arc<Mutex<TrackerStatus>>,
    devices:  Option<Devices>,
    worker:   Option<Worker>,
    /// Worker told to stop by `disable`, joined on the next enable or drop.
    stopping: Option<Worker>,
}

impl GestureInput {
    /// Create a disabled input over `camera` and `landmarker`.
    pub fn new<C: Camera, L: HandLandmarker>(camera: C, landmarker: L) -> Self {
        GestureInput {
            slot:     Arc::new(SignalSlot::new()),
            status:   Arc::new(Mutex::new(TrackerStatus::Disabled)),
            devices:  Some(Devices {
                camera:     Box::new(camera),
                landmarker: Box::new(landmarker),
                model:      ModelState::Uninitialized,
            }),
            worker:   None,
            stopping: None,
        }
    }

    /// The cell the worker publishes into.
    pub fn slot(&self) -> Arc<SignalSlot> { Arc::clone(&self.slot) }

    /// Most recently published signal.
    pub fn signal(&self) -> GestureSignal { self.slot.load() }

    pub fn status(&self) -> TrackerStatus {
        self.status.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// True while an enabled worker thread is running (including while
    /// loading).  A worker winding down after `disable` does not count.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().map_or(false, |w| !w.handle.is_finished())
    }

    /// Start the worker.  No-op if it is already running.
    ///
    /// A worker still winding down from a previous `disable` is joined here
    /// first, since it holds the devices.
    pub fn enable(&mut self) {
        if self.is_running() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            self.join(worker);
        }
        if let Some(worker) = self.stopping.take() {
            self.join(worker);
        }

        let Some(devices) = self.devices.take() else {
            tracing::error!("gesture devices were lost; gesture input unavailable");
            return;
        };
        if let ModelState::Failed(reason) = &devices.model {
            set_status(&self.status, TrackerStatus::ModelFailed(reason.clone()));
            self.devices = Some(devices);
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let ctx = WorkerContext {
            slot:   Arc::clone(&self.slot),
            status: Arc::clone(&self.status),
            stop:   Arc::clone(&stop),
            epoch:  self.slot.epoch(),
        };
        set_status(&self.status, TrackerStatus::Loading);
        let handle = thread::spawn(move || run_inference(devices, ctx));
        self.worker = Some(Worker { stop, handle });
    }

    /// Reset the signal to idle and tell the worker to stop.
    ///
    /// Never blocks on the worker: it may be inside a slow model load or
    /// camera read.  Any inference still in flight publishes into a stale
    /// epoch, so the next read of the slot is `(0, false)`.
    pub fn disable(&mut self) {
        self.slot.reset();
        let mut status = self.status.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            self.stopping = Some(worker);
        }
        *status = TrackerStatus::Disabled;
        drop(status);
        tracing::info!("gesture input disabled");
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled { self.enable() } else { self.disable() }
    }

    /// Stop and join `worker`, taking the devices back.
    fn join(&mut self, worker: Worker) {
        worker.stop.store(true, Ordering::Release);
        match worker.handle.join() {
            Ok(devices) => self.devices = Some(devices),
            Err(_) => {
                tracing::error!("gesture worker panicked");
                set_status(&self.status, TrackerStatus::ModelFailed("inference thread panicked".to_string()));
            }
        }
    }
}

impl Drop for GestureInput {
    fn drop(&mut self) {
        for worker in [self.worker.take(), self.stopping.take()].into_iter().flatten() {
            worker.stop.store(true, Ordering::Release);
            let _ = worker.handle.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

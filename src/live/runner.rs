use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nalgebra::Vector2;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::LiveConfig;
use crate::dynamics::{wrap_pi, VehicleState};
use crate::guidance::Pilot;
use crate::io::{CycleLog, CycleSample};
use crate::live::geo::geodetic_to_ned;
use crate::live::link::VehicleLink;
use crate::live::nmea::TelemetryFrame;

/// Wake-up command force used before tracking starts (N). Two spaced
/// commands get the vehicle out of drift mode reliably.
const NUDGE_FORCE: f64 = 10.0;
const NUDGE_GAP: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Cancellation and snapshot publishing
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag, observed at the top of each control cycle.
/// A cancel arriving mid-cycle is deferred to the next cycle boundary so the
/// shutdown sequence (drift command, log flush) always runs whole.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Latest-cycle snapshot handoff to a display thread.
///
/// The control thread swaps in a fresh `Arc` once per cycle; readers clone
/// the pointer under a short read lock and never block the control thread
/// for longer than the swap.
#[derive(Debug, Clone, Default)]
pub struct SampleFeed {
    latest: Arc<RwLock<Option<Arc<CycleSample>>>>,
}

impl SampleFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published cycle, if any.
    pub fn latest(&self) -> Option<Arc<CycleSample>> {
        self.latest.read().clone()
    }

    fn publish(&self, sample: CycleSample) {
        *self.latest.write() = Some(Arc::new(sample));
    }
}

// ---------------------------------------------------------------------------
// Live control loop
// ---------------------------------------------------------------------------

/// Runs the guidance pipeline against a real vehicle at a fixed cadence.
///
/// The loop owns its state exclusively; the only things shared with other
/// threads are the cancellation token and the read-only snapshot feed. The
/// NED origin is anchored at the first telemetry fix. Telemetry gaps are
/// tolerated by holding the last known state and counting stale cycles.
pub struct LiveRunner<L: VehicleLink> {
    link: L,
    pilot: Pilot,
    config: LiveConfig,
    cancel: CancellationToken,
    feed: SampleFeed,
    state: VehicleState,
    origin: Option<(f64, f64)>,
    last_fix: Option<(Instant, Vector2<f64>)>,
    stale_cycles: u64,
}

impl<L: VehicleLink> LiveRunner<L> {
    pub fn new(link: L, pilot: Pilot, config: LiveConfig, cancel: CancellationToken) -> Self {
        Self {
            link,
            pilot,
            config,
            cancel,
            feed: SampleFeed::new(),
            state: VehicleState::at_rest(),
            origin: None,
            last_fix: None,
            stale_cycles: 0,
        }
    }

    /// Handle for display threads; clone freely.
    pub fn feed(&self) -> SampleFeed {
        self.feed.clone()
    }

    /// Consecutive cycles without a valid telemetry frame.
    pub fn stale_cycles(&self) -> u64 {
        self.stale_cycles
    }

    /// Run until cancelled. Always finishes by commanding drift and
    /// returning the accumulated log, even when cancelled mid-mission.
    pub fn run(mut self) -> CycleLog {
        let mut log = CycleLog::new();
        let timeout = Duration::from_secs_f64(self.config.telemetry_timeout);
        let period = Duration::from_secs_f64(self.config.cycle_period);

        info!("waiting for the first telemetry fix");
        while self.origin.is_none() {
            if self.cancel.is_cancelled() {
                self.shutdown(&log);
                return log;
            }
            if let Some(frame) = self.link.read_telemetry(timeout) {
                self.apply_frame(&frame);
            }
        }

        if self.config.startup_nudge {
            // Two spaced low-force commands pull the vehicle out of drift
            // before the controllers take over
            for _ in 0..2 {
                if !self.link.send_command(NUDGE_FORCE, 0.0, 0.0) {
                    warn!("startup nudge was not delivered");
                }
                thread::sleep(NUDGE_GAP);
            }
        }

        let started = Instant::now();
        let mut prev_now: Option<f64> = None;

        while !self.cancel.is_cancelled() {
            let cycle_start = Instant::now();

            match self.link.read_telemetry(timeout) {
                Some(frame) => {
                    self.apply_frame(&frame);
                    self.stale_cycles = 0;
                }
                None => {
                    self.stale_cycles += 1;
                    warn!(
                        stale_cycles = self.stale_cycles,
                        "no telemetry this cycle, holding last known state"
                    );
                }
            }

            let now = started.elapsed().as_secs_f64();
            let dt = prev_now.map_or(0.0, |p| now - p);
            prev_now = Some(now);

            let cmd = self
                .pilot
                .cycle(self.state.position_ne(), self.state.yaw(), now, dt);

            if !self
                .link
                .send_command(cmd.force_x_est, 0.0, cmd.torque_n_est)
            {
                warn!("command not delivered; vehicle reverts to drift within 3 s");
            }

            let sample = CycleSample {
                t: now,
                eta: self.state.eta,
                nu: self.state.nu,
                bearing: cmd.fix.bearing,
                distance: cmd.fix.distance,
                target: cmd.fix.target,
                tau_x: cmd.tau_x,
                tau_n: cmd.tau_n,
                n1: cmd.n1,
                n2: cmd.n2,
                u_actual: self.state.u_actual,
            };
            log.push(sample.clone());
            self.feed.publish(sample);

            let elapsed = cycle_start.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            }
        }

        self.shutdown(&log);
        log
    }

    /// Spawn the loop on its own thread and return the handle to the log.
    pub fn spawn(self) -> JoinHandle<CycleLog>
    where
        L: Send + 'static,
    {
        thread::spawn(move || self.run())
    }

    fn shutdown(&mut self, log: &CycleLog) {
        if !self.link.send_drift() {
            warn!("drift command was not delivered on shutdown");
        }
        info!(cycles = log.len(), "live loop cancelled, vehicle set to drift");
    }

    /// Fold a validated telemetry frame into the vehicle state. The first
    /// fix anchors the NED origin; later fixes are differenced against it.
    fn apply_frame(&mut self, frame: &TelemetryFrame) {
        let origin = *self
            .origin
            .get_or_insert((frame.latitude, frame.longitude));

        let ned = geodetic_to_ned(frame.latitude, frame.longitude, 0.0, origin.0, origin.1, 0.0);
        self.state.eta[0] = ned[0];
        self.state.eta[1] = ned[1];
        self.state.eta[3] = frame.roll_deg.to_radians();
        self.state.eta[4] = frame.pitch_deg.to_radians();
        self.state.eta[5] = wrap_pi(frame.yaw_deg.to_radians());
        self.state.nu[3] = frame.roll_rate.to_radians();
        self.state.nu[4] = frame.pitch_rate.to_radians();
        self.state.nu[5] = frame.yaw_rate.to_radians();

        // Ground speed by simple position differencing between fixes
        let position = Vector2::new(ned[0], ned[1]);
        let now = Instant::now();
        if let Some((then, prev)) = self.last_fix {
            let dt = now.duration_since(then).as_secs_f64();
            if dt > 0.0 {
                self.state.nu[0] = (position - prev).norm() / dt;
            }
        }
        self.last_fix = Some((now, position));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

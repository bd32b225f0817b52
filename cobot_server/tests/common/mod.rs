//! Shared test fixtures: a recording fake driver.
//!
//! The fake shares its state through an `Arc`, so a test keeps a handle to
//! inspect the call log after the boxed driver has moved into a session.

#![allow(dead_code)]

use cobot_common::prelude::*;
use cobot_server::command::CommandParser;
use cobot_server::handler::ConnectionHandler;
use cobot_server::session::{DeviceSession, SessionSettings};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One facade call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PowerOn,
    PowerOff,
    IsPoweredOn,
    GetPose(PoseKind),
    Move(Pose, i32),
    GetErrorCode,
    ClearErrorCode,
    Shutdown,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    powered: bool,
    angles: [i32; 6],
    coords: [i32; 6],
    fault: ErrorCode,
    /// Fault latched by the next move.
    fault_on_move: Option<ErrorCode>,
    /// Error returned by the next move.
    fail_next_move: Option<DeviceError>,
    /// Error returned by the next pose read.
    fail_next_get_pose: Option<DeviceError>,
    move_delay: Duration,
}

/// Cheaply clonable view of a [`FakeDriver`]'s recorded state.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn moves(&self) -> Vec<(Pose, i32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Move(pose, feed) => Some((pose, feed)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_powered(&self, powered: bool) {
        self.state.lock().powered = powered;
    }

    pub fn set_pose(&self, pose: Pose) {
        let mut state = self.state.lock();
        match pose.kind {
            PoseKind::Angles => state.angles = pose.values,
            PoseKind::Coords => state.coords = pose.values,
        }
    }

    pub fn pose(&self, kind: PoseKind) -> Pose {
        let state = self.state.lock();
        match kind {
            PoseKind::Angles => Pose::angles(state.angles),
            PoseKind::Coords => Pose::coords(state.coords),
        }
    }

    pub fn fault_on_next_move(&self, code: ErrorCode) {
        self.state.lock().fault_on_move = Some(code);
    }

    pub fn fail_next_move(&self, error: DeviceError) {
        self.state.lock().fail_next_move = Some(error);
    }

    pub fn fail_next_get_pose(&self, error: DeviceError) {
        self.state.lock().fail_next_get_pose = Some(error);
    }

    pub fn set_move_delay(&self, delay: Duration) {
        self.state.lock().move_delay = delay;
    }

    pub fn pending_fault(&self) -> ErrorCode {
        self.state.lock().fault
    }
}

/// Recording driver; every call bumps an in-flight counter for its duration.
pub struct FakeDriver {
    recorder: Recorder,
}

impl FakeDriver {
    pub fn new() -> (Self, Recorder) {
        let recorder = Recorder::default();
        (
            Self {
                recorder: recorder.clone(),
            },
            recorder,
        )
    }

    fn enter(&self, call: Call) -> InFlight<'_> {
        let now = self.recorder.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.recorder.state.lock().calls.push(call);
        InFlight(&self.recorder)
    }
}

struct InFlight<'a>(&'a Recorder);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DeviceDriver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn version(&self) -> &'static str {
        "0.0.0"
    }

    fn init(&mut self, _config: &DeviceConfig) -> Result<(), DeviceError> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), DeviceError> {
        let _g = self.enter(Call::Shutdown);
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), DeviceError> {
        let _g = self.enter(Call::PowerOn);
        self.recorder.state.lock().powered = true;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DeviceError> {
        let _g = self.enter(Call::PowerOff);
        self.recorder.state.lock().powered = false;
        Ok(())
    }

    fn is_powered_on(&mut self) -> Result<bool, DeviceError> {
        let _g = self.enter(Call::IsPoweredOn);
        Ok(self.recorder.state.lock().powered)
    }

    fn get_pose(&mut self, kind: PoseKind) -> Result<Pose, DeviceError> {
        let _g = self.enter(Call::GetPose(kind));
        if let Some(error) = self.recorder.state.lock().fail_next_get_pose.take() {
            return Err(error);
        }
        Ok(self.recorder.pose(kind))
    }

    fn move_blocking(&mut self, target: &Pose, feed_rate: i32) -> Result<(), DeviceError> {
        let _g = self.enter(Call::Move(*target, feed_rate));
        let (delay, failure, fault) = {
            let mut state = self.recorder.state.lock();
            (
                state.move_delay,
                state.fail_next_move.take(),
                state.fault_on_move.take(),
            )
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if let Some(error) = failure {
            if let DeviceError::Fault(code) = error {
                self.recorder.state.lock().fault = code;
            }
            return Err(error);
        }
        if let Some(code) = fault {
            self.recorder.state.lock().fault = code;
            return Ok(());
        }
        self.recorder.set_pose(*target);
        Ok(())
    }

    fn get_error_code(&mut self) -> Result<ErrorCode, DeviceError> {
        let _g = self.enter(Call::GetErrorCode);
        Ok(self.recorder.state.lock().fault)
    }

    fn clear_error_code(&mut self) -> Result<(), DeviceError> {
        let _g = self.enter(Call::ClearErrorCode);
        self.recorder.state.lock().fault = 0;
        Ok(())
    }
}

/// Session over a fresh fake driver.
pub fn fake_session(settings: SessionSettings) -> (Arc<DeviceSession>, Recorder) {
    let (driver, recorder) = FakeDriver::new();
    (
        Arc::new(DeviceSession::new(Box::new(driver), settings)),
        recorder,
    )
}

/// Handler over a fresh fake driver with default settings.
pub fn fake_handler() -> (ConnectionHandler, Recorder) {
    let (session, recorder) = fake_session(SessionSettings::default());
    (ConnectionHandler::new(session, CommandParser::default()), recorder)
}

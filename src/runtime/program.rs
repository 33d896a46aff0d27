use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use crate::core::detection::DetectionSnapshot;
use crate::core::mission::MissionPhase;
use crate::core::pose::Odometry;
use crate::device::{self, LineSensorDevice, Surface};

use super::motion::Chassis;

/// Execution context of a running program.
///
/// Rebuilt state is refreshed by the task engine between passes; the shared
/// handles live for the duration of the task.
pub struct Context {
    /// Time of start of the program.
    pub start: Instant,
    /// Total step count.
    pub step_count: usize,
    /// Latest published detection snapshot.
    pub snapshot: Arc<DetectionSnapshot>,
    chassis: Chassis,
    line_sensor: Arc<Mutex<Box<dyn LineSensorDevice>>>,
    odometry: Arc<RwLock<Odometry>>,
}

impl Context {
    pub(crate) fn new(
        chassis: Chassis,
        line_sensor: Arc<Mutex<Box<dyn LineSensorDevice>>>,
        odometry: Arc<RwLock<Odometry>>,
        snapshot: Arc<DetectionSnapshot>,
    ) -> Self {
        Self {
            start: Instant::now(),
            step_count: 0,
            snapshot,
            chassis,
            line_sensor,
            odometry,
        }
    }

    /// Motion publisher.
    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    /// Read both floor sensors.
    pub fn read_line_sensors(&self) -> device::Result<(Surface, Surface)> {
        self.line_sensor.lock().unwrap().read()
    }

    /// Credit forward motion to the coarse position estimate.
    pub fn advance_position(&self, pulses: f32) {
        self.odometry.write().unwrap().advance(pulses);
    }

    /// Fix the accurate position estimate from a landmark width.
    pub fn fix_position(&self, width: i32) {
        self.odometry
            .write()
            .unwrap()
            .fix_from_landmark_width(width);
    }
}

/// Program trait.
///
/// A program is run by the task engine. It reads the latest detection
/// snapshot and the floor sensors and commands the chassis. A program is run
/// to completion; the completion condition is polled once per trusted
/// snapshot.
#[async_trait::async_trait]
pub trait Program: Send {
    /// Boot the program.
    ///
    /// This method is called when the engine accepted this program and
    /// started its routine. A one-off orientation maneuver belongs here.
    async fn boot(&mut self, _context: &mut Context) -> device::Result<()> {
        Ok(())
    }

    /// Propagate the program forwards.
    ///
    /// The entire task is dedicated to the program, a step may claim its
    /// time slice for bounded motion pulses.
    async fn step(&mut self, context: &mut Context) -> device::Result<()>;

    /// Program termination condition.
    ///
    /// Check if program is finished. Evaluated against the latest snapshot,
    /// and only once that snapshot is trusted by the engine.
    fn can_terminate(&self, context: &Context) -> bool;

    /// Program termination action.
    ///
    /// This is an optional method to perform a final maneuver. This method
    /// is called after `can_terminate` returns true and before the program
    /// is terminated.
    async fn term_action(&mut self, _context: &mut Context) -> device::Result<()> {
        Ok(())
    }

    /// Called once per freshly published inference cycle.
    fn on_inference(&mut self) {}

    /// Called when the engine resumes motion after a completion check.
    fn on_resume(&mut self) {}

    /// Mission phase to run after this program completes.
    ///
    /// `None` marks the end of the mission.
    fn successor(&self) -> Option<MissionPhase> {
        None
    }
}

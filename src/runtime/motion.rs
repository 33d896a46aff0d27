use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::core::motion::{Direction, Motion};
use crate::device::MotionDevice;

/// Full speed for bounded maneuver pulses.
const PULSE_SPEED: f32 = 1.0;

/// Handle publishing motion instructions onto the motion queue.
///
/// Cheap to clone; every holder publishes into the same queue, consumed by
/// the single motion sink.
#[derive(Clone)]
pub struct Chassis {
    queue: mpsc::Sender<Motion>,
}

impl Chassis {
    pub fn new(queue: mpsc::Sender<Motion>) -> Self {
        Self { queue }
    }

    /// Drive in a direction until countermanded.
    pub async fn drive(&self, direction: Direction, speed: f32) {
        self.send(Motion::drive(direction, speed)).await;
    }

    /// Drive in a direction for a bounded duration.
    ///
    /// The chassis keeps its last instruction afterwards; follow up with
    /// another pulse or a halt.
    pub async fn pulse(&self, direction: Direction, duration: Duration) {
        self.send(Motion::drive(direction, PULSE_SPEED)).await;
        tokio::time::sleep(duration).await;
    }

    /// Stop all motion.
    pub async fn halt(&self) {
        self.send(Motion::StopAll).await;
    }

    /// Stop all motion from a synchronous caller.
    ///
    /// Used on the pause path where the stop must not wait behind the queue.
    pub fn halt_now(&self) {
        if self.queue.try_send(Motion::StopAll).is_err() {
            warn!("Motion queue reached maximum capacity");
        }
    }

    /// Publish a raw motion instruction.
    pub async fn send(&self, motion: Motion) {
        if self.queue.send(motion).await.is_err() {
            warn!("Motion queue closed");
        }
    }
}

/// Motion sink service.
///
/// Single consumer of the motion queue. Applies the motion configuration
/// gates and forwards instructions to the motion device. On shutdown the
/// device receives a final stop.
pub async fn motion_sink(
    mut queue: mpsc::Receiver<Motion>,
    mut device: Box<dyn MotionDevice>,
    enable_motion: bool,
    slow_motion: bool,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("Motion sink ({})", device.name());

    loop {
        let motion = tokio::select! {
            motion = queue.recv() => motion,
            _ = shutdown.recv() => None,
        };

        let motion = match motion {
            Some(motion) => motion,
            None => break,
        };

        let motion = if slow_motion {
            match motion {
                Motion::Drive { direction, speed } => Motion::drive(direction, speed / 2.0),
                stop => stop,
            }
        } else {
            motion
        };

        trace!("Motion: {}", motion);

        if !enable_motion {
            continue;
        }

        if let Err(e) = device.actuate(motion).await {
            error!("Motion device failure: {}", e);
        }
    }

    // Stop all motion for safety.
    if enable_motion {
        if let Err(e) = device.actuate(Motion::StopAll).await {
            error!("Motion device failure: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SimChassis;

    #[tokio::test]
    async fn test_sink_applies_slow_motion() {
        let (motion_tx, motion_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let device = SimChassis::new();
        let probe = device.clone();

        let sink = tokio::spawn(motion_sink(
            motion_rx,
            Box::new(device),
            true,
            true,
            shutdown_rx,
        ));

        let chassis = Chassis::new(motion_tx);
        chassis.drive(Direction::Forward, 1.0).await;

        // Close the queue so the sink drains and exits.
        drop(chassis);
        sink.await.unwrap();

        let history = probe.history();
        assert_eq!(history[0], Motion::drive(Direction::Forward, 0.5));
        assert_eq!(*history.last().unwrap(), Motion::StopAll);
    }

    #[tokio::test]
    async fn test_sink_frozen_mode_never_actuates() {
        let (motion_tx, motion_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let device = SimChassis::new();
        let probe = device.clone();

        let sink = tokio::spawn(motion_sink(
            motion_rx,
            Box::new(device),
            false,
            false,
            shutdown_rx,
        ));

        let chassis = Chassis::new(motion_tx);
        chassis.drive(Direction::Left, 1.0).await;
        chassis.halt().await;

        drop(chassis);
        sink.await.unwrap();

        assert!(probe.history().is_empty());
    }
}

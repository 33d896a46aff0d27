use std::time::Duration;

use crate::config::RetrieveConfig;
use crate::core::detection::Bounds;
use crate::core::mission::MissionPhase;
use crate::core::motion::Direction;
use crate::device;
use crate::runtime::program::{Context, Program};

/// Drive onto the card until it leaves the frame.
///
/// The card disappearing from view means it sits under the chassis and has
/// been captured. Decisions are only taken when the card's bounding box
/// moved since the previous pass, a box that did not move belongs to a frame
/// that has already been acted on.
pub struct Retrieve {
    config: RetrieveConfig,
    frame_size: i32,
    last_bounds: Option<Bounds>,
}

impl Retrieve {
    pub fn new(config: &RetrieveConfig, frame_size: i32) -> Self {
        Self {
            config: config.clone(),
            frame_size,
            last_bounds: None,
        }
    }
}

#[async_trait::async_trait]
impl Program for Retrieve {
    async fn step(&mut self, context: &mut Context) -> device::Result<()> {
        let previous = self.last_bounds;

        self.last_bounds = context
            .snapshot
            .find(&self.config.target)
            .map(|detection| detection.bounds);

        if let Some(bounds) = self.last_bounds {
            if previous != self.last_bounds {
                let offset = bounds.center_offset(self.frame_size);
                let dead_band = (self.frame_size as f32 * self.config.dead_band) as i32;

                if offset < -dead_band {
                    context
                        .chassis()
                        .pulse(
                            Direction::Left,
                            Duration::from_secs_f32(self.config.turn_pulse),
                        )
                        .await;
                } else if offset > dead_band {
                    context
                        .chassis()
                        .pulse(
                            Direction::Right,
                            Duration::from_secs_f32(self.config.turn_pulse),
                        )
                        .await;
                } else {
                    context
                        .chassis()
                        .pulse(
                            Direction::Forward,
                            Duration::from_secs_f32(self.config.forward_pulse),
                        )
                        .await;
                    context.advance_position(self.config.advance);
                }

                context.chassis().halt().await;
            }
        }

        Ok(())
    }

    fn can_terminate(&self, context: &Context) -> bool {
        !context.snapshot.contains(&self.config.target)
    }

    fn successor(&self) -> Option<MissionPhase> {
        Some(MissionPhase::FindCrocs)
    }
}

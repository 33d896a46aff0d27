pub mod detect;

pub use detect::{CommandDetector, Detector, ReplayDetector};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};

use crate::core::detection::{DetectionSnapshot, LabelHistory};
use crate::device::Camera;

/// Inference cycle source.
///
/// Owns the capture and detect cycle. Every cycle captures one still frame,
/// runs the detector on a worker thread, joins the worker, and only then
/// publishes the result: a fresh snapshot swapped into the watch channel and
/// exactly one availability signal on the broadcast channel. Consumers never
/// observe a half built snapshot.
pub struct InferenceSource {
    camera: Camera,
    detector: Box<dyn Detector>,
    snapshot_tx: watch::Sender<Arc<DetectionSnapshot>>,
    available_tx: broadcast::Sender<u64>,
    history: Arc<Mutex<LabelHistory>>,
}

impl InferenceSource {
    pub fn new(
        camera: Camera,
        detector: Box<dyn Detector>,
        snapshot_tx: watch::Sender<Arc<DetectionSnapshot>>,
        available_tx: broadcast::Sender<u64>,
        history: Arc<Mutex<LabelHistory>>,
    ) -> Self {
        Self {
            camera,
            detector,
            snapshot_tx,
            available_tx,
            history,
        }
    }

    /// Run inference cycles until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let InferenceSource {
            camera,
            mut detector,
            snapshot_tx,
            available_tx,
            history,
        } = self;

        info!("Run detector ({})", detector.name());

        let mut seq: u64 = 0;

        loop {
            let frame = tokio::select! {
                _ = shutdown.recv() => break,
                frame = camera.capture() => frame,
            };

            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Capture failed: {}", e);
                    tokio::time::sleep(crate::consts::CYCLE_RETRY_DELAY).await;
                    continue;
                }
            };

            let worker = tokio::task::spawn_blocking(move || {
                let result = detector.detect(&frame);
                (detector, result)
            });

            let result = match worker.await {
                Ok((returned, result)) => {
                    detector = returned;
                    result
                }
                Err(e) => {
                    error!("Detector worker panicked: {}", e);
                    break;
                }
            };

            match result {
                Ok(detections) => {
                    seq += 1;

                    let snapshot = Arc::new(DetectionSnapshot::new(seq, detections));

                    trace!(
                        "Inference cycle {}: {} objects",
                        seq,
                        snapshot.detections().len()
                    );

                    publish(&snapshot_tx, &available_tx, &history, snapshot, seq);
                }
                Err(e) => {
                    error!("Inference failed: {}", e);
                    tokio::time::sleep(crate::consts::CYCLE_RETRY_DELAY).await;
                }
            }
        }
    }
}

fn publish(
    snapshot_tx: &watch::Sender<Arc<DetectionSnapshot>>,
    available_tx: &broadcast::Sender<u64>,
    history: &Mutex<LabelHistory>,
    snapshot: Arc<DetectionSnapshot>,
    seq: u64,
) {
    history.lock().unwrap().observe(&snapshot);

    let _ = snapshot_tx.send(snapshot);
    let _ = available_tx.send(seq);
}

/// Live camera cycle.
///
/// Captures a live view frame and publishes its path for an external console
/// to render. Fully decoupled from the inference cycle. Runs until the
/// surrounding background task is torn down.
pub async fn live_camera_service(camera: Camera, frame_tx: watch::Sender<Option<PathBuf>>) {
    loop {
        match camera.capture().await {
            Ok(path) => {
                let _ = frame_tx.send(Some(path));
            }
            Err(e) => {
                warn!("Live capture failed: {}", e);
                tokio::time::sleep(crate::consts::CYCLE_RETRY_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detection::{Bounds, Detection};

    #[test]
    fn test_publish_is_copy_on_swap() {
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Arc::new(DetectionSnapshot::default()));
        let (available_tx, mut available_rx) = broadcast::channel(4);
        let history = Mutex::new(LabelHistory::new());

        // A consumer pins the first snapshot.
        let first = snapshot_rx.borrow().clone();

        let snapshot = Arc::new(DetectionSnapshot::new(
            1,
            vec![Detection {
                label: "crocs".to_owned(),
                confidence: 0.9,
                bounds: Bounds::new(0, 0, 50, 50),
            }],
        ));

        publish(&snapshot_tx, &available_tx, &history, snapshot, 1);

        // The pinned snapshot is untouched by the swap.
        assert!(first.is_empty());
        assert_eq!(snapshot_rx.borrow().seq(), 1);
        assert_eq!(available_rx.try_recv().unwrap(), 1);
        assert_eq!(
            history.lock().unwrap().labels().collect::<Vec<_>>(),
            vec!["crocs"]
        );
    }
}

mod error;

pub use self::error::Error;

pub type Result<T = ()> = std::result::Result<T, error::Error>;

pub mod builder;
pub mod exec;
pub mod motion;
pub mod operand;
pub mod program;
pub mod task;

pub struct RuntimeContext {
    /// Runtime event bus.
    pub shutdown: (
        tokio::sync::broadcast::Sender<()>,
        tokio::sync::broadcast::Receiver<()>,
    ),
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            shutdown: tokio::sync::broadcast::channel(1),
        }
    }

    /// Listen for shutdown signal.
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown.0.subscribe()
    }

    /// Spawn an asynchronous task in the background.
    ///
    /// The task will be terminated when the runtime is shutdown or when the
    /// shutdown signal is received.
    pub fn spawn_background_task<T>(&self, task: T)
    where
        T: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown_signal();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Shutting down background task");
                }
                _ = task => {}
            }
        });
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

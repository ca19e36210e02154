use tokio::task::JoinHandle;

/// Tracks the background tasks of the live connection.
///
/// Everything spawned here belongs to one transport; aborting the set is
/// how a superseded connection is torn down.
pub struct TaskManager {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it under `label`
    pub fn spawn<F>(&mut self, label: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|(_, handle)| !handle.is_finished());
        let handle = tokio::spawn(future);
        self.handles.push((label, handle));
    }

    /// Number of tracked tasks that are still running
    pub fn running(&self) -> usize {
        self.handles
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }

    /// Abort all tracked tasks and wait until they are gone
    pub async fn abort_all(&mut self) {
        for (label, handle) in self.handles.drain(..) {
            handle.abort();
            match handle.await {
                Err(e) if e.is_panic() => tracing::error!("Task '{}' panicked", label),
                _ => tracing::trace!("Task '{}' stopped", label),
            }
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

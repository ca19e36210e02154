// Infrastructure module - background task lifecycle, timers, keepalive
pub mod heartbeat;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatManager;
pub use task_manager::TaskManager;
pub use timer::RetryTimer;

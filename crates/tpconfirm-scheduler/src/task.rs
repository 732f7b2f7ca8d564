use std::time::Duration;

pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks on the main execution context.
///
/// Implementations must execute tasks one at a time and never block the
/// caller.
pub trait Scheduler: Send + Sync {
    fn run_now(&self, task: ScheduledTask);
    fn run_after(&self, delay: Duration, task: ScheduledTask);
}

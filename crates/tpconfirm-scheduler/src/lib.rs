//! Scheduling and time capabilities shared by the confirmation engine.
//!
//! The engine only ever sees [`Scheduler`] and [`Clock`]; which concrete
//! runtime executes a callback is decided by the host.

pub mod clock;
pub mod main_loop;
pub mod manual;
pub mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use main_loop::{main_loop, MainLoop, MainLoopScheduler};
pub use manual::ManualScheduler;
pub use task::{ScheduledTask, Scheduler};

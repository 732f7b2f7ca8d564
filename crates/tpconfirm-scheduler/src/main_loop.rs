use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::task::{ScheduledTask, Scheduler};

/// Single-consumer main execution context backed by a tokio runtime.
///
/// Tasks from any thread are funnelled into one queue that [`MainLoop::run`]
/// drains sequentially, so no two tasks ever run concurrently.
#[derive(Debug, Clone)]
pub struct MainLoopScheduler {
    sender: mpsc::UnboundedSender<ScheduledTask>,
    runtime: Handle,
}

pub struct MainLoop {
    receiver: mpsc::UnboundedReceiver<ScheduledTask>,
}

pub fn main_loop(runtime: Handle) -> (MainLoopScheduler, MainLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        MainLoopScheduler { sender, runtime },
        MainLoop { receiver },
    )
}

impl MainLoopScheduler {
    fn enqueue(sender: &mpsc::UnboundedSender<ScheduledTask>, task: ScheduledTask) {
        if sender.send(task).is_err() {
            tracing::debug!("main loop stopped; dropping scheduled task");
        }
    }
}

impl Scheduler for MainLoopScheduler {
    fn run_now(&self, task: ScheduledTask) {
        Self::enqueue(&self.sender, task);
    }

    fn run_after(&self, delay: Duration, task: ScheduledTask) {
        if delay.is_zero() {
            self.run_now(task);
            return;
        }
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            Self::enqueue(&sender, task);
        });
    }
}

impl MainLoop {
    /// Runs tasks until every scheduler handle has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.receiver.recv().await {
            task();
        }
    }

    /// Runs the next task, waiting for one to arrive.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs every task that is already queued without waiting.
    pub fn run_ready(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            executed += 1;
        }
        executed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::runtime::Handle;

    use super::main_loop;
    use crate::task::Scheduler;

    #[tokio::test]
    async fn run_now_tasks_execute_in_submission_order() {
        let (scheduler, mut main) = main_loop(Handle::current());
        let order = Arc::new(Mutex::new(Vec::new()));

        for value in 0..3 {
            let order = Arc::clone(&order);
            scheduler.run_now(Box::new(move || {
                order.lock().expect("order lock").push(value);
            }));
        }

        assert_eq!(main.run_ready(), 3);
        assert_eq!(*order.lock().expect("order lock"), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_after_delivers_task_once_delay_elapses() {
        let (scheduler, mut main) = main_loop(Handle::current());
        let fired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&fired);

        scheduler.run_after(
            Duration::from_millis(100),
            Box::new(move || {
                *flag.lock().expect("flag lock") = true;
            }),
        );

        tokio::task::yield_now().await;
        assert_eq!(main.run_ready(), 0);

        assert!(main.run_next().await);
        assert!(*fired.lock().expect("flag lock"));
    }

    #[tokio::test]
    async fn run_ends_once_all_schedulers_are_dropped() {
        let (scheduler, main) = main_loop(Handle::current());
        drop(scheduler);

        tokio::time::timeout(Duration::from_secs(1), main.run())
            .await
            .expect("main loop should stop without schedulers");
    }
}

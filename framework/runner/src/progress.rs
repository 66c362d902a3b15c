use std::cmp::min;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gust_core::prelude::DelegatedShutdownListener;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// What the progress bar counts towards.
#[derive(Debug, Clone)]
pub(crate) enum ProgressPlan {
    /// The run is bounded by time, show elapsed against planned run time.
    Duration(Duration),
    /// The run is bounded by a number of iterations, show how many have finished.
    Iterations {
        total: u64,
        completed: Arc<AtomicU64>,
    },
}

/// Displays a progress bar while the test is running to show the user how much is left.
pub(crate) fn start_progress(
    plan: ProgressPlan,
    shutdown_listener: DelegatedShutdownListener,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || match plan {
            ProgressPlan::Duration(planned_runtime) => {
                show_duration_progress(planned_runtime, shutdown_listener)
            }
            ProgressPlan::Iterations { total, completed } => {
                show_iteration_progress(total, completed, shutdown_listener)
            }
        })
}

fn show_duration_progress(
    planned_runtime: Duration,
    shutdown_listener: DelegatedShutdownListener,
) {
    let start_time = Instant::now();
    let pb = ProgressBar::new(planned_runtime.as_secs());
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
        )
        .expect("Failed to set progress style")
        .with_key("planned_runtime", {
            let hours = planned_runtime.as_secs() / 3600;
            let minutes = (planned_runtime.as_secs() % 3600) / 60;
            let seconds = planned_runtime.as_secs() % 60;
            move |_state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds);
            }
        })
        .progress_chars("#>-"),
    );

    while !shutdown_listener.should_shutdown() {
        let new = min(start_time.elapsed().as_secs(), planned_runtime.as_secs());
        pb.set_position(new);
        std::thread::sleep(Duration::from_millis(500));
    }

    log::trace!("Progress thread shutting down");
    pb.finish_and_clear();
}

fn show_iteration_progress(
    total: u64,
    completed: Arc<AtomicU64>,
    shutdown_listener: DelegatedShutdownListener,
) {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} iterations [{elapsed_precise}]",
        )
        .expect("Failed to set progress style")
        .progress_chars("#>-"),
    );

    while !shutdown_listener.should_shutdown() {
        pb.set_position(min(completed.load(Ordering::Relaxed), total));
        std::thread::sleep(Duration::from_millis(500));
    }

    log::trace!("Progress thread shutting down");
    pb.finish_and_clear();
}

use std::time::SystemTime;

use log::debug;

/// Runs a function and logs how long it took under the given target.
pub fn run_timed<F, Out>(target: &'static str, task_desc: &'static str, function: F) -> Out
where
    F: FnOnce() -> Out,
{
    let start_time = SystemTime::now();

    let out = function();

    match start_time.elapsed() {
        Ok(elapsed) => debug!(target: target, "{} finished (took {:?})", task_desc, elapsed),
        // the clock may have jumped backwards while we were running
        Err(_) => debug!(target: target, "{} finished", task_desc),
    }

    out
}

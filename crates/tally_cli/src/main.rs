//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tally_core` linkage.
//! - Evaluate one sample habit in the machine's local zone.

use chrono::{Local, Utc};
use tally_core::{Habit, HabitProgress, Recurrence, DAY_MS};

fn main() {
    println!("tally_core ping={}", tally_core::ping());
    println!("tally_core version={}", tally_core::core_version());

    let now = Utc::now().timestamp_millis();
    let mut sample = Habit::new("sample", 1, Recurrence::Daily, now - 7 * DAY_MS);
    sample.logs = (1..=3).map(|days_ago| now - days_ago * DAY_MS).collect();

    match HabitProgress::evaluate(&sample, now, &Local) {
        Ok(progress) => println!(
            "tally_core sample progress={}/{} streak={} total={}",
            progress.progress,
            progress.target_count,
            progress.stats.streak,
            progress.stats.total_accumulated
        ),
        Err(err) => eprintln!("tally_core sample failed: {err}"),
    }
}

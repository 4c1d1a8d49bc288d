//! Spinner around a slow task, with a direct write mid-run.
//!
//! Run with `cargo run --example basic`. Pipe it through `cat` to see the
//! redirected behavior: plain text, no frames, no escapes.

use std::io::Write;
use std::thread;
use std::time::Duration;

use spingate::{spin, SpinnerConfig};

fn main() {
    let total = spin(
        SpinnerConfig::new().start("Crunching").end("Done"),
        || {
            let mut total = 0u64;
            for step in 1..=4u64 {
                thread::sleep(Duration::from_millis(400));
                writeln!(spingate::stdout(), "finished step {step}").expect("stdout write failed");
                total += step;
            }
            total
        },
    );
    println!("total: {total}");
}

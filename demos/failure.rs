//! Failure reporting: configured error message plus the cause chain.

use std::thread;
use std::time::Duration;

use spingate::{Session, SpinnerConfig};

#[derive(Debug)]
struct ConnectError;

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection refused by 10.0.0.7:5432")
    }
}

impl std::error::Error for ConnectError {}

fn main() {
    let config = SpinnerConfig::new()
        .start("Connecting")
        .error("Could not reach the database");

    let outcome = Session::new(config).run(|| {
        thread::sleep(Duration::from_millis(1200));
        Err::<(), _>(ConnectError)
    });

    // The failure was already reported; the value is still available.
    if let Ok(outcome) = outcome {
        if let Err(error) = outcome.into_result() {
            eprintln!("(caller still sees: {error})");
        }
    }
}

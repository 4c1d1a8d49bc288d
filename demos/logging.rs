//! Log records emitted during a session stay legible.

use std::thread;
use std::time::Duration;

use spingate::logging::{self, StreamHandler};
use spingate::{spin, SpinnerConfig};

fn main() {
    logging::try_init().expect("logger already installed");
    logging::add_handler(StreamHandler::stdout());

    spin(
        SpinnerConfig::new()
            .start("Syncing")
            .end("Synced")
            .frames_str("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .interval(Duration::from_millis(80)),
        || {
            for shard in ["users", "orders", "events"] {
                thread::sleep(Duration::from_millis(600));
                log::info!("shard {shard} synced");
            }
        },
    );
}

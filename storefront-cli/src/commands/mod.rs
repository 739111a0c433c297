//! CLI command implementations.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub mod invalidate;
pub mod resolve;
pub mod status;
pub mod warm;

/// Start a spinner with a message. Hidden when `quiet` is set.
pub(crate) fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

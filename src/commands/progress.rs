//! Terminal progress for queue execution
//!
//! Each device step is reported as one status line on stderr, e.g.
//! `sending 'boot' (4096 KB)... OKAY [  1.204s]`. Payload downloads show an
//! indicatif bar while the bytes are on the wire.

use std::time::Duration;

use fastboot_core::protocol::ExecutionProgress;
use indicatif::{ProgressBar, ProgressStyle};

fn create_transfer_bar(total: u64, description: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(description.to_string());
    Ok(pb)
}

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    current_bar: Option<ProgressBar>,
    step: String,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            current_bar: None,
            step: String::new(),
        }
    }

    fn clear_bar(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a line without tearing an active bar
    fn print(&self, line: String) {
        match &self.current_bar {
            Some(pb) => pb.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionProgress for IndicatifProgress {
    fn begin(&mut self, description: &str) {
        self.step = description.to_string();
    }

    fn transfer_started(&mut self, total_bytes: usize) {
        let total = total_bytes as u64;
        self.current_bar = Some(
            create_transfer_bar(total, &self.step).unwrap_or_else(|_| ProgressBar::new(total)),
        );
    }

    fn transfer_progress(&mut self, bytes_sent: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(bytes_sent as u64);
        }
    }

    fn transfer_done(&mut self) {
        self.clear_bar();
    }

    fn okay(&mut self, elapsed: Duration) {
        self.clear_bar();
        eprintln!("{}... {}", self.step, okay_status(elapsed));
        self.step.clear();
    }

    fn failed(&mut self, reason: &str) {
        self.clear_bar();
        if self.step.is_empty() {
            eprintln!("FAILED ({})", reason);
        } else {
            eprintln!("{}... FAILED ({})", self.step, reason);
        }
        self.step.clear();
    }

    fn info(&mut self, text: &str) {
        self.print(format!("(bootloader) {}", text));
    }

    fn display(&mut self, label: &str, value: &str) {
        self.print(format!("{}: {}", label, value));
    }

    fn notice(&mut self, message: &str) {
        self.print(message.to_string());
    }

    fn finished(&mut self, elapsed: Duration) {
        self.clear_bar();
        eprintln!("finished. total time: {:.3}s", elapsed.as_secs_f64());
    }
}

fn okay_status(elapsed: Duration) -> String {
    format!("OKAY [{:7.3}s]", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_okay_status_format() {
        assert_eq!(okay_status(Duration::from_millis(12)), "OKAY [  0.012s]");
        assert_eq!(okay_status(Duration::from_millis(123_456)), "OKAY [123.456s]");
    }

    #[test]
    fn test_step_lifecycle() {
        let mut progress = IndicatifProgress::new();
        progress.begin("sending 'boot' (4 KB)");
        progress.transfer_started(4096);
        progress.transfer_progress(4096);
        progress.transfer_done();
        assert!(progress.current_bar.is_none());
        assert_eq!(progress.step, "sending 'boot' (4 KB)");
        progress.okay(Duration::ZERO);
        assert!(progress.step.is_empty());

        progress.transfer_started(10);
        progress.failed("remote: too large");
        assert!(progress.current_bar.is_none());
        assert!(progress.step.is_empty());
    }
}

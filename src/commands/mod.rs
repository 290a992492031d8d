//! CLI command implementations
//!
//! - `devices`: one-shot listing of every connected fastboot device
//! - `progress`: terminal reporting while a queue executes

mod devices;
mod progress;

pub use devices::run_devices;
pub use progress::IndicatifProgress;

//! A very basic example of a program blinking a LED diode using native library API.
//!
//! This example assumes that header pin #7 is connected to diode's anode (+).
//! Make sure to put resistor to reduce current flowing through the diode.
//!
//! Run with `RUST_LOG=debug` to see pins being exported.

use raspi_sysfs_adaptor::{Adaptor, AdaptorConfig, Value};
use std::error::Error;
use std::thread::sleep;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut raspi = Adaptor::new(AdaptorConfig::default().with_name("blinker"));
    raspi.connect()?;
    let blink_interval = Duration::from_millis(500);

    for _ in 0..10 {
        raspi.digital_write("7", Value::High)?;
        sleep(blink_interval);
        raspi.digital_write("7", Value::Low)?;
        sleep(blink_interval);
    }

    for err in raspi.finalize() {
        eprintln!("cleanup failed: {}", err);
    }
    Ok(())
}

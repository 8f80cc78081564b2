//! This crate exposes GPIO and I2C of the [Raspberry Pi](https://www.raspberrypi.org/) header for programmatic use in Rust.
//!
//! Pins are addressed by their **header labels** (physical positions, `"7"`, `"13"`...). The crate detects the board revision
//! from `/proc/cpuinfo` and translates labels into the GPIO numbers that revision uses, so the same program works on the first
//! Model B as well as on boards with the 40-pin header. I2C talks to the bus routed to the header (`/dev/i2c-0` on the oldest
//! boards, `/dev/i2c-1` everywhere else).
//!
//! All hardware access goes through the kernel's sysfs GPIO interface and the i2c-dev device nodes. The `sysfs::Filesystem`
//! trait abstracts both, and `sysfs::mock::MockFilesystem` provides an in-memory stand-in, so code built on `Adaptor` can be
//! tested on any machine.
//!
//! Output pins and the I2C bus implement relevant [`embedded_hal`](https://crates.io/crates/embedded-hal) abstractions so this
//! crate can be used with driver implementations using `embedded_hal` generic traits.
//!
//! The crate logs through [`tracing`](https://crates.io/crates/tracing) and never installs a subscriber by itself.

use thiserror::Error;

mod adaptor;
mod config;
pub mod pin_map;
pub mod revision;
pub mod sysfs;

pub use adaptor::error::{GpioError, I2cError, PinError, RevisionError};
pub use adaptor::{Adaptor, DigitalPin, Direction, I2cChannel, OutputPin, Value};
pub use config::AdaptorConfig;
pub use revision::{CpuInfo, HardwareRevision, RevisionSource};

/// Main error type for this crate.
///
/// Every variant wraps the error of the component that failed, so callers can still match on the underlying kind.
/// For more details, see `RevisionError`, `PinError`, `GpioError` and `I2cError` enums documentation.
#[derive(Error, Debug)]
pub enum RaspiError {
    #[error("error while detecting board revision")]
    Revision(#[from] RevisionError),
    #[error("error while resolving a pin")]
    Pin(#[from] PinError),
    #[error("error while operating on a gpio pin")]
    Gpio(#[from] GpioError),
    #[error("error while operating on the i2c bus")]
    I2c(#[from] I2cError),
    #[error("adaptor is not connected, call connect first")]
    NotConnected,
}

pub type RaspiResult<T> = Result<T, RaspiError>;

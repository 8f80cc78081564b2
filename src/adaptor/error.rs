use crate::revision::HardwareRevision;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Enum representing possible failures when detecting the board revision.
///
/// - SourceUnavailable - The system information source (usually `/proc/cpuinfo`) could not be read.
/// - Parse - The source was read but carries no `Revision` line, or its value is not a hexadecimal number.
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("failed to read system information source")]
    SourceUnavailable(#[source] io::Error),
    #[error("failed to parse board revision: {0}")]
    Parse(String),
}

/// Enum representing failures of the logical pin name lookup.
///
/// Some header pins exist only on newer boards, so a name valid for one revision can be unknown for another.
#[derive(Error, Debug)]
pub enum PinError {
    #[error("unknown pin {name:?} for board revision {revision}")]
    UnknownPin {
        name: String,
        revision: HardwareRevision,
    },
}

/// Enum representing failures when operating on sysfs GPIO pins.
///
/// Every variant carries the BCM number of the pin in question.
#[derive(Error, Debug)]
pub enum GpioError {
    #[error("failed to export gpio{pin}")]
    Export {
        pin: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to set direction of gpio{pin}")]
    Direction {
        pin: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to write value of gpio{pin}")]
    Write {
        pin: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to read value of gpio{pin}")]
    Read {
        pin: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to unexport gpio{pin}")]
    Unexport {
        pin: u8,
        #[source]
        source: io::Error,
    },
}

/// Enum representing failures when talking over the I2C bus.
///
/// - BusOpen - The bus device node could not be opened.
/// - Address - The kernel refused to select the slave address.
/// - Write / Read - The transfer failed or was cut short. `done` tells how many bytes actually went through.
/// - NotStarted - A transfer was requested before `Adaptor::i2c_start`.
#[derive(Error, Debug)]
pub enum I2cError {
    #[error("failed to open i2c bus {}", .path.display())]
    BusOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to select i2c address {address:#04x}")]
    Address {
        address: u16,
        #[source]
        source: nix::Error,
    },
    #[error("i2c write incomplete: {done} of {requested} bytes written")]
    Write {
        done: usize,
        requested: usize,
        #[source]
        source: Option<io::Error>,
    },
    #[error("i2c read incomplete: {done} of {requested} bytes read")]
    Read {
        done: usize,
        requested: usize,
        #[source]
        source: Option<io::Error>,
    },
    #[error("i2c transfer requested before i2c_start")]
    NotStarted,
}

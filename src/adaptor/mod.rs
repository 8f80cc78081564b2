use crate::config::AdaptorConfig;
use crate::pin_map;
use crate::revision::{self, CpuInfo, HardwareRevision, RevisionSource};
use crate::sysfs::{Filesystem, SysFs};
use crate::{RaspiError, RaspiResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod error;
mod hal;
mod i2c;
mod pin;

use error::I2cError;
pub use hal::OutputPin;
pub use i2c::I2cChannel;
pub use pin::{DigitalPin, Direction, Value};

/// The main abstraction for a Raspberry Pi board.
///
/// The adaptor translates header pin labels into GPIO numbers of the detected board revision,
/// exports pins through sysfs on first use and keeps them until `finalize`. It also owns the
/// connection to the I2C bus routed to the header.
///
/// `connect` has to be called before any pin or I2C operation, since the pin numbering depends
/// on the board revision.
///
/// # Example
/// ```no_run
/// use raspi_sysfs_adaptor::{Adaptor, AdaptorConfig, Value};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///   let mut raspi = Adaptor::new(AdaptorConfig::default());
///   raspi.connect()?;
///   raspi.digital_write("7", Value::High)?;
///
///   raspi.i2c_start(0x48)?;
///   raspi.i2c_write(&[0x00])?;
///   let temperature = raspi.i2c_read(2)?;
///   println!("{:?}", temperature);
///
///   for err in raspi.finalize() {
///     eprintln!("{}", err);
///   }
///   Ok(())
/// }
/// ```
pub struct Adaptor<S = CpuInfo, F: Filesystem = SysFs> {
    name: String,
    gpio_root: PathBuf,
    source: S,
    fs: F,
    revision: Option<HardwareRevision>,
    pins: HashMap<String, DigitalPin<F::File>>,
    i2c: Option<I2cChannel<F::I2c>>,
}

impl Adaptor {
    /// Creates an adaptor working on the real `/proc/cpuinfo` and sysfs.
    pub fn new(config: AdaptorConfig) -> Self {
        Self::with_backends(config, CpuInfo::default(), SysFs)
    }
}

impl<S, F: Filesystem> Adaptor<S, F> {
    /// Creates an adaptor reading the board revision from `source` and doing all I/O through `fs`.
    ///
    /// Use `CpuInfo::new` as `source` to read a cpuinfo file other than `/proc/cpuinfo`.
    pub fn with_backends(config: AdaptorConfig, source: S, fs: F) -> Self {
        Self {
            name: config.name,
            gpio_root: config.gpio_root,
            source,
            fs,
            revision: None,
            pins: HashMap::new(),
            i2c: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Board revision detected by the last `connect`.
    pub fn revision(&self) -> Option<HardwareRevision> {
        self.revision
    }

    /// Device node of the I2C bus for the detected board revision.
    pub fn i2c_location(&self) -> Option<&'static str> {
        self.revision.map(pin_map::i2c_bus_path)
    }

    /// GPIO numbers of the pins currently held by the adaptor, keyed by header label.
    pub fn exported_pins(&self) -> impl Iterator<Item = (&str, u8)> {
        self.pins
            .iter()
            .filter(|(_, pin)| pin.is_exported())
            .map(|(name, pin)| (name.as_str(), pin.number()))
    }

    /// Releases every exported pin and the I2C bus.
    ///
    /// Release failures don't stop the process, all of them are returned. Afterwards the adaptor
    /// is back in its freshly constructed state and needs another `connect`.
    pub fn finalize(&mut self) -> Vec<RaspiError> {
        let mut errors = Vec::new();

        for (name, mut pin) in self.pins.drain() {
            if let Err(err) = pin.unexport(&self.fs) {
                warn!(adaptor = %self.name, pin = %name, error = %err, "failed to release pin");
                errors.push(err.into());
            }
        }

        if let Some(mut channel) = self.i2c.take() {
            channel.close();
        }

        if self.revision.take().is_some() {
            info!(adaptor = %self.name, released_with_errors = errors.len(), "finalized");
        }
        errors
    }

    fn connected(&self) -> RaspiResult<HardwareRevision> {
        self.revision.ok_or(RaspiError::NotConnected)
    }

    fn digital_pin(&mut self, name: &str) -> RaspiResult<&mut DigitalPin<F::File>> {
        let number = pin_map::physical_pin(name, self.connected()?)?;

        let root = &self.gpio_root;
        let pin = self
            .pins
            .entry(name.to_owned())
            .or_insert_with(|| DigitalPin::new(number, root.clone()));
        pin.export(&self.fs)?;

        Ok(pin)
    }
}

impl<S: RevisionSource, F: Filesystem> Adaptor<S, F> {
    /// Detects the board revision, which selects the pin numbering and the I2C bus.
    ///
    /// Reconnecting to a different revision first releases every pin and the I2C bus, as their
    /// numbering no longer applies. Release failures are logged, not returned.
    pub fn connect(&mut self) -> RaspiResult<()> {
        let revision = revision::detect_revision(&self.source)?;

        if let Some(previous) = self.revision {
            if previous != revision {
                warn!(
                    adaptor = %self.name,
                    %previous,
                    %revision,
                    "board revision changed, releasing resources"
                );
                self.finalize();
            }
        }
        self.revision = Some(revision);

        info!(
            adaptor = %self.name,
            %revision,
            i2c = pin_map::i2c_bus_path(revision),
            "connected"
        );
        Ok(())
    }

    /// Drives the pin with the given header label, exporting it on first use.
    pub fn digital_write(&mut self, name: &str, value: Value) -> RaspiResult<()> {
        self.digital_pin(name)?.write(value)?;
        Ok(())
    }

    /// Samples the pin with the given header label, exporting it on first use.
    pub fn digital_read(&mut self, name: &str) -> RaspiResult<Value> {
        Ok(self.digital_pin(name)?.read()?)
    }

    /// Opens the I2C bus if needed and addresses the slave at `address`.
    ///
    /// The address is set on every call, so one open bus can be used to talk to several devices.
    pub fn i2c_start(&mut self, address: u16) -> RaspiResult<()> {
        let revision = self.connected()?;

        if self.i2c.is_none() {
            let path = Path::new(pin_map::i2c_bus_path(revision));
            self.i2c = Some(I2cChannel::open(&self.fs, path)?);
        }

        let channel = self.i2c.as_mut().ok_or(I2cError::NotStarted)?;
        channel.set_address(address)?;
        Ok(())
    }

    pub fn i2c_write(&mut self, data: &[u8]) -> RaspiResult<()> {
        self.i2c_channel()?.write(data)?;
        Ok(())
    }

    pub fn i2c_read(&mut self, len: usize) -> RaspiResult<Vec<u8>> {
        Ok(self.i2c_channel()?.read(len)?)
    }

    fn i2c_channel(&mut self) -> Result<&mut I2cChannel<F::I2c>, I2cError> {
        self.i2c.as_mut().ok_or(I2cError::NotStarted)
    }
}

impl<S, F: Filesystem> Drop for Adaptor<S, F> {
    fn drop(&mut self) {
        // Errors are already logged by `finalize`.
        let _ = self.finalize();
    }
}

impl<S, F: Filesystem> fmt::Debug for Adaptor<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adaptor")
            .field("name", &self.name)
            .field("gpio_root", &self.gpio_root)
            .field("revision", &self.revision)
            .field("pins", &self.pins.keys().collect::<Vec<_>>())
            .field("i2c", &self.i2c.as_ref().map(|channel| channel.path()))
            .finish()
    }
}

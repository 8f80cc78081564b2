//! `embedded_hal` implementations, so drivers written against its generic traits can run on top
//! of an `Adaptor`.
use super::{Adaptor, Value};
use crate::revision::RevisionSource;
use crate::sysfs::Filesystem;
use crate::{RaspiError, RaspiResult};
use embedded_hal::blocking::i2c;
use embedded_hal::digital::v2 as eh;

/// Header pin borrowed from an `Adaptor` for output.
///
/// This is obtainable by using `output_pin` method of `Adaptor`. The pin is exported when
/// borrowed and stays exported after the borrow ends, like any other pin the adaptor touched.
pub struct OutputPin<'adaptor, S, F: Filesystem> {
    adaptor: &'adaptor mut Adaptor<S, F>,
    name: String,
}

impl<S: RevisionSource, F: Filesystem> Adaptor<S, F> {
    pub fn output_pin(&mut self, name: &str) -> RaspiResult<OutputPin<'_, S, F>> {
        self.digital_pin(name)?;

        Ok(OutputPin {
            adaptor: self,
            name: name.to_owned(),
        })
    }
}

impl<'adaptor, S, F: Filesystem> OutputPin<'adaptor, S, F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'adaptor, S: RevisionSource, F: Filesystem> eh::OutputPin for OutputPin<'adaptor, S, F> {
    type Error = RaspiError;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.adaptor.digital_write(&self.name, Value::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.adaptor.digital_write(&self.name, Value::High)
    }
}

impl<S: RevisionSource, F: Filesystem> i2c::Write for Adaptor<S, F> {
    type Error = RaspiError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c_start(address.into())?;
        self.i2c_write(bytes)
    }
}

impl<S: RevisionSource, F: Filesystem> i2c::Read for Adaptor<S, F> {
    type Error = RaspiError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c_start(address.into())?;
        let data = self.i2c_read(buffer.len())?;
        buffer.copy_from_slice(&data);
        Ok(())
    }
}

impl<S: RevisionSource, F: Filesystem> i2c::WriteRead for Adaptor<S, F> {
    type Error = RaspiError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c_start(address.into())?;
        self.i2c_write(bytes)?;
        let data = self.i2c_read(buffer.len())?;
        buffer.copy_from_slice(&data);
        Ok(())
    }
}

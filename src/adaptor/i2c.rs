use super::error::I2cError;
use crate::sysfs::{Filesystem, I2cDevice};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An open I2C bus together with the slave address currently talked to.
///
/// Several devices can share a bus, so the address may change between transfers while the
/// device node stays open.
#[derive(Debug)]
pub struct I2cChannel<D> {
    path: PathBuf,
    device: Option<D>,
    address: Option<u16>,
}

impl<D: I2cDevice> I2cChannel<D> {
    /// Opens the bus device node at `path`.
    pub fn open<F>(fs: &F, path: &Path) -> Result<Self, I2cError>
    where
        F: Filesystem<I2c = D>,
    {
        let device = fs.open_i2c(path).map_err(|source| I2cError::BusOpen {
            path: path.to_owned(),
            source,
        })?;

        debug!(bus = %path.display(), "opened i2c bus");
        Ok(Self {
            path: path.to_owned(),
            device: Some(device),
            address: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn address(&self) -> Option<u16> {
        self.address
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Selects the slave the following transfers go to.
    pub fn set_address(&mut self, address: u16) -> Result<(), I2cError> {
        let device = self.device.as_mut().ok_or(I2cError::NotStarted)?;
        device
            .set_address(address)
            .map_err(|source| I2cError::Address { address, source })?;

        if self.address != Some(address) {
            debug!(bus = %self.path.display(), address, "selected i2c slave");
        }
        self.address = Some(address);
        Ok(())
    }

    /// Sends `data` in a single transfer.
    pub fn write(&mut self, data: &[u8]) -> Result<(), I2cError> {
        let requested = data.len();
        let device = self.device.as_mut().ok_or(I2cError::NotStarted)?;

        match device.write(data) {
            Ok(done) if done == requested => Ok(()),
            Ok(done) => Err(I2cError::Write {
                done,
                requested,
                source: None,
            }),
            Err(source) => Err(I2cError::Write {
                done: 0,
                requested,
                source: Some(source),
            }),
        }
    }

    /// Reads exactly `len` bytes, issuing further reads while the device returns short chunks.
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>, I2cError> {
        let device = self.device.as_mut().ok_or(I2cError::NotStarted)?;
        let mut buf = vec![0u8; len];
        let mut done = 0;

        while done < len {
            match device.read(&mut buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(I2cError::Read {
                        done,
                        requested: len,
                        source: Some(source),
                    })
                }
            }
        }

        if done < len {
            return Err(I2cError::Read {
                done,
                requested: len,
                source: None,
            });
        }
        Ok(buf)
    }

    /// Closes the device node. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!(bus = %self.path.display(), "closed i2c bus");
        }
        self.address = None;
    }
}

//! Access to the files and device nodes the kernel exposes for GPIO and I2C.
//!
//! Everything the adaptor does to the operating system goes through the `Filesystem` trait.
//! `SysFs` is the real thing; `mock::MockFilesystem` keeps everything in memory so the adaptor
//! can be exercised on machines without a GPIO header.
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::libc;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::path::Path;

pub mod mock;

/// How a file should be opened.
///
/// The sysfs `export` and `unexport` entries are write-only, so they cannot be opened for reading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Access {
    WriteOnly,
    ReadWrite,
}

/// A sysfs attribute file holding one short textual value.
pub trait AttributeFile {
    /// Replaces the whole content of the attribute.
    fn write_attribute(&mut self, value: &str) -> io::Result<()>;

    /// Reads the whole content of the attribute from its beginning.
    fn read_attribute(&mut self) -> io::Result<String>;
}

/// An open I2C bus device node.
///
/// Reads and writes go to the slave selected by the last `set_address` call.
pub trait I2cDevice: Read + Write {
    fn set_address(&mut self, address: u16) -> nix::Result<()>;
}

/// Capability of opening attribute files and I2C bus devices.
pub trait Filesystem {
    type File: AttributeFile;
    type I2c: I2cDevice;

    fn open(&self, path: &Path, access: Access) -> io::Result<Self::File>;

    fn open_i2c(&self, path: &Path) -> io::Result<Self::I2c>;
}

/// The operating system's filesystem.
#[derive(Copy, Clone, Debug, Default)]
pub struct SysFs;

/// An attribute file on the real filesystem.
#[derive(Debug)]
pub struct SysfsFile {
    file: File,
}

impl AttributeFile for SysfsFile {
    fn write_attribute(&mut self, value: &str) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(value.as_bytes())
    }

    fn read_attribute(&mut self) -> io::Result<String> {
        let mut contents = String::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_string(&mut contents)?;
        Ok(contents)
    }
}

/// An I2C bus device node, e.g. `/dev/i2c-1`.
#[derive(Debug)]
pub struct I2cDev {
    file: File,
}

mod ioctl {
    use nix::{convert_ioctl_res, ioctl_write_int_bad};

    // I2C_SLAVE from linux/i2c-dev.h.
    ioctl_write_int_bad!(i2c_set_slave, 0x0703);
}

impl I2cDevice for I2cDev {
    fn set_address(&mut self, address: u16) -> nix::Result<()> {
        // SAFETY: The descriptor is owned by `self.file` and stays open for the duration of the call.
        unsafe { ioctl::i2c_set_slave(self.file.as_raw_fd(), libc::c_int::from(address)) }.map(drop)
    }
}

impl Read for I2cDev {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for I2cDev {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Filesystem for SysFs {
    type File = SysfsFile;
    type I2c = I2cDev;

    fn open(&self, path: &Path, access: Access) -> io::Result<Self::File> {
        let file = std::fs::OpenOptions::new()
            .read(access == Access::ReadWrite)
            .write(true)
            .open(path)?;

        Ok(SysfsFile { file })
    }

    fn open_i2c(&self, path: &Path) -> io::Result<Self::I2c> {
        let mut open_flags = OFlag::empty();
        open_flags.insert(OFlag::O_RDWR);
        open_flags.insert(OFlag::O_CLOEXEC);

        let fd = open(path, open_flags, Mode::empty()).map_err(nix_to_io)?;

        // SAFETY: Validity of fd is checked by Nix and nothing else owns it.
        let file = unsafe { File::from_raw_fd(fd) };

        Ok(I2cDev { file })
    }
}

fn nix_to_io(err: nix::Error) -> io::Error {
    match err.as_errno() {
        Some(errno) => io::Error::from_raw_os_error(errno as i32),
        None => io::Error::new(io::ErrorKind::Other, err),
    }
}

//! In-memory filesystem for running the adaptor without hardware.
//!
//! Only paths registered up front exist. Writing an attribute replaces its content and is
//! recorded, so tests can check both the final state and every write that happened. I2C buses
//! behave as loopback devices: bytes written to them are handed back by the following reads.
use super::{Access, AttributeFile, Filesystem, I2cDevice};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockEntry {
    contents: String,
    writes: Vec<String>,
}

#[derive(Debug, Default)]
struct MockBus {
    address: Option<u16>,
    addresses: Vec<u16>,
    data: VecDeque<u8>,
    opened: usize,
    write_limit: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, MockEntry>,
    buses: HashMap<PathBuf, MockBus>,
    failing: HashSet<PathBuf>,
}

/// Shared handle to an in-memory filesystem. Clones see the same state.
#[derive(Clone, Debug, Default)]
pub struct MockFilesystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFilesystem {
    /// Creates a filesystem containing the given attribute files, all empty.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fs = Self::default();
        for path in paths {
            fs.add_file(path);
        }
        fs
    }

    /// Creates the `export`/`unexport` entries under `root` plus `direction` and `value` of every listed pin.
    pub fn with_gpio<P: AsRef<Path>>(root: P, pins: &[u8]) -> Self {
        let root = root.as_ref();
        let fs = Self::new(vec![root.join("export"), root.join("unexport")]);
        for pin in pins {
            let pin_dir = root.join(format!("gpio{}", pin));
            fs.add_file(pin_dir.join("direction"));
            fs.add_file(pin_dir.join("value"));
        }
        fs
    }

    pub fn add_file<P: Into<PathBuf>>(&self, path: P) {
        self.lock().files.entry(path.into()).or_default();
    }

    /// Registers a loopback I2C bus device node.
    pub fn add_i2c_bus<P: Into<PathBuf>>(&self, path: P) {
        self.lock().buses.entry(path.into()).or_default();
    }

    /// Makes every later read, write or address selection on `path` fail with a permission error.
    pub fn fail_on<P: Into<PathBuf>>(&self, path: P) {
        self.lock().failing.insert(path.into());
    }

    /// Caps how many bytes a single write to the bus accepts.
    pub fn limit_i2c_writes<P: AsRef<Path>>(&self, path: P, limit: usize) {
        if let Some(bus) = self.lock().buses.get_mut(path.as_ref()) {
            bus.write_limit = Some(limit);
        }
    }

    /// Current content of an attribute file.
    pub fn contents<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|entry| entry.contents.clone())
    }

    /// Every value written to an attribute file, oldest first.
    pub fn writes<P: AsRef<Path>>(&self, path: P) -> Vec<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|entry| entry.writes.clone())
            .unwrap_or_default()
    }

    /// Slave address currently selected on the bus.
    pub fn i2c_address<P: AsRef<Path>>(&self, path: P) -> Option<u16> {
        self.lock()
            .buses
            .get(path.as_ref())
            .and_then(|bus| bus.address)
    }

    /// Every address selection issued on the bus, oldest first.
    pub fn i2c_addresses<P: AsRef<Path>>(&self, path: P) -> Vec<u16> {
        self.lock()
            .buses
            .get(path.as_ref())
            .map(|bus| bus.addresses.clone())
            .unwrap_or_default()
    }

    /// How many times the bus device node was opened.
    pub fn i2c_open_count<P: AsRef<Path>>(&self, path: P) -> usize {
        self.lock()
            .buses
            .get(path.as_ref())
            .map_or(0, |bus| bus.opened)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("{} refused the operation", path.display()),
    )
}

/// An open attribute file of a `MockFilesystem`.
#[derive(Debug)]
pub struct MockFile {
    fs: MockFilesystem,
    path: PathBuf,
}

impl AttributeFile for MockFile {
    fn write_attribute(&mut self, value: &str) -> io::Result<()> {
        let mut state = self.fs.lock();
        if state.failing.contains(&self.path) {
            return Err(denied(&self.path));
        }
        let entry = state
            .files
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;
        entry.contents = value.to_owned();
        entry.writes.push(value.to_owned());
        Ok(())
    }

    fn read_attribute(&mut self) -> io::Result<String> {
        let state = self.fs.lock();
        if state.failing.contains(&self.path) {
            return Err(denied(&self.path));
        }
        state
            .files
            .get(&self.path)
            .map(|entry| entry.contents.clone())
            .ok_or_else(|| not_found(&self.path))
    }
}

/// An open loopback bus of a `MockFilesystem`.
#[derive(Debug)]
pub struct MockI2c {
    fs: MockFilesystem,
    path: PathBuf,
}

impl MockI2c {
    fn with_bus<T>(&self, f: impl FnOnce(&mut MockBus, bool) -> T) -> io::Result<T> {
        let mut state = self.fs.lock();
        let failing = state.failing.contains(&self.path);
        let bus = state
            .buses
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;
        Ok(f(bus, failing))
    }
}

impl I2cDevice for MockI2c {
    fn set_address(&mut self, address: u16) -> nix::Result<()> {
        let result = self.with_bus(|bus, failing| {
            if failing {
                return false;
            }
            bus.address = Some(address);
            bus.addresses.push(address);
            true
        });

        match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(nix::Error::Sys(nix::errno::Errno::EACCES)),
            Err(_) => Err(nix::Error::Sys(nix::errno::Errno::ENODEV)),
        }
    }
}

impl Read for MockI2c {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let path = self.path.clone();
        self.with_bus(|bus, failing| {
            if failing {
                return Err(denied(&path));
            }
            let count = buf.len().min(bus.data.len());
            for (slot, byte) in buf.iter_mut().zip(bus.data.drain(..count)) {
                *slot = byte;
            }
            Ok(count)
        })?
    }
}

impl Write for MockI2c {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let path = self.path.clone();
        self.with_bus(|bus, failing| {
            if failing {
                return Err(denied(&path));
            }
            let count = bus.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
            bus.data.extend(&buf[..count]);
            Ok(count)
        })?
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Filesystem for MockFilesystem {
    type File = MockFile;
    type I2c = MockI2c;

    fn open(&self, path: &Path, _access: Access) -> io::Result<Self::File> {
        if !self.lock().files.contains_key(path) {
            return Err(not_found(path));
        }

        Ok(MockFile {
            fs: self.clone(),
            path: path.to_owned(),
        })
    }

    fn open_i2c(&self, path: &Path) -> io::Result<Self::I2c> {
        let mut state = self.lock();
        let bus = state.buses.get_mut(path).ok_or_else(|| not_found(path))?;
        bus.opened += 1;

        Ok(MockI2c {
            fs: self.clone(),
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_registered_paths_open() {
        let fs = MockFilesystem::new(vec!["/sys/class/gpio/export"]);
        assert!(fs
            .open(Path::new("/sys/class/gpio/export"), Access::WriteOnly)
            .is_ok());
        let err = fs
            .open(Path::new("/sys/class/gpio/gpio4/value"), Access::ReadWrite)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.open_i2c(Path::new("/dev/i2c-1")).is_err());
    }

    #[test]
    fn writes_replace_contents_and_are_recorded() {
        let fs = MockFilesystem::with_gpio("/sys/class/gpio", &[4]);
        let path = Path::new("/sys/class/gpio/gpio4/direction");
        let mut file = fs.open(path, Access::ReadWrite).unwrap();

        file.write_attribute("out").unwrap();
        file.write_attribute("in").unwrap();

        assert_eq!(file.read_attribute().unwrap(), "in");
        assert_eq!(fs.contents(path).as_deref(), Some("in"));
        assert_eq!(fs.writes(path), vec!["out", "in"]);
    }

    #[test]
    fn failing_path_rejects_reads_and_writes() {
        let fs = MockFilesystem::new(vec!["/sys/class/gpio/unexport"]);
        fs.fail_on("/sys/class/gpio/unexport");
        let mut file = fs
            .open(Path::new("/sys/class/gpio/unexport"), Access::WriteOnly)
            .unwrap();

        let err = file.write_attribute("4").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let err = file.read_attribute().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn i2c_bus_loops_back() {
        let fs = MockFilesystem::default();
        fs.add_i2c_bus("/dev/i2c-1");
        let mut bus = fs.open_i2c(Path::new("/dev/i2c-1")).unwrap();

        bus.set_address(0x40).unwrap();
        assert_eq!(bus.write(&[1, 2, 3]).unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(bus.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        let mut rest = [0u8; 4];
        assert_eq!(bus.read(&mut rest).unwrap(), 1);
        assert_eq!(bus.read(&mut rest).unwrap(), 0);

        assert_eq!(fs.i2c_address("/dev/i2c-1"), Some(0x40));
        assert_eq!(fs.i2c_open_count("/dev/i2c-1"), 1);
    }
}

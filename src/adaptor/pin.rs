use super::error::GpioError;
use crate::sysfs::{Access, AttributeFile, Filesystem};
use derive_try_from_primitive::TryFromPrimitive;
use std::convert::TryFrom;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Enum representing the state of a given pin.
///
/// This correlates to electric low/high state of voltage for GPIO pins. The sysfs `value` entry
/// spells them as `0` and `1`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum Value {
    High = 1,
    Low = 0,
}

impl Value {
    fn as_str(self) -> &'static str {
        match self {
            Value::High => "1",
            Value::Low => "0",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<u8>()
            .ok()
            .and_then(|v| Value::try_from(v).ok())
    }
}

impl From<bool> for Value {
    fn from(high: bool) -> Self {
        if high {
            Value::High
        } else {
            Value::Low
        }
    }
}

impl From<Value> for u8 {
    fn from(value: Value) -> Self {
        value as u8
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }
}

#[derive(Debug)]
enum PinState<T> {
    Unexported,
    // Export was accepted by the kernel but the attribute files could not be opened yet.
    Requested,
    Exported {
        direction_file: T,
        value_file: T,
        direction: Option<Direction>,
    },
    Released,
}

/// A GPIO pin driven through the sysfs interface.
///
/// The pin goes through `Unexported -> Exported -> Released`. While exported it keeps its
/// `direction` and `value` entries open and remembers the last direction it wrote, so switching
/// between reads and writes only touches `direction` when it actually changes.
#[derive(Debug)]
pub struct DigitalPin<T> {
    number: u8,
    root: PathBuf,
    state: PinState<T>,
}

impl<T: AttributeFile> DigitalPin<T> {
    pub fn new<P: Into<PathBuf>>(number: u8, root: P) -> Self {
        Self {
            number,
            root: root.into(),
            state: PinState::Unexported,
        }
    }

    /// BCM number of the pin.
    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_exported(&self) -> bool {
        matches!(self.state, PinState::Exported { .. })
    }

    /// Asks the kernel to expose the pin and opens its attribute files. Does nothing once exported.
    pub fn export<F>(&mut self, fs: &F) -> Result<(), GpioError>
    where
        F: Filesystem<File = T>,
    {
        if self.is_exported() {
            return Ok(());
        }

        let pin = self.number;
        let export_err = |source| GpioError::Export { pin, source };

        if let PinState::Unexported = self.state {
            write_control(fs, &self.root.join("export"), pin).map_err(export_err)?;
            self.state = PinState::Requested;
        }

        let pin_dir = self.root.join(format!("gpio{}", pin));
        let direction_file = fs
            .open(&pin_dir.join("direction"), Access::ReadWrite)
            .map_err(export_err)?;
        let value_file = fs
            .open(&pin_dir.join("value"), Access::ReadWrite)
            .map_err(export_err)?;

        debug!(pin, "exported gpio");
        self.state = PinState::Exported {
            direction_file,
            value_file,
            direction: None,
        };
        Ok(())
    }

    pub fn set_direction(&mut self, wanted: Direction) -> Result<(), GpioError> {
        let pin = self.number;
        match &mut self.state {
            PinState::Exported {
                direction: Some(current),
                ..
            } if *current == wanted => Ok(()),
            PinState::Exported {
                direction_file,
                direction,
                ..
            } => {
                direction_file
                    .write_attribute(wanted.as_str())
                    .map_err(|source| GpioError::Direction { pin, source })?;
                debug!(pin, direction = wanted.as_str(), "changed gpio direction");
                *direction = Some(wanted);
                Ok(())
            }
            _ => Err(GpioError::Direction {
                pin,
                source: not_exported(pin),
            }),
        }
    }

    pub fn write(&mut self, value: Value) -> Result<(), GpioError> {
        let pin = self.number;
        self.set_direction(Direction::Output)?;
        self.value_file()
            .and_then(|file| file.write_attribute(value.as_str()))
            .map_err(|source| GpioError::Write { pin, source })
    }

    pub fn read(&mut self) -> Result<Value, GpioError> {
        let pin = self.number;
        self.set_direction(Direction::Input)?;
        let raw = self
            .value_file()
            .and_then(|file| file.read_attribute())
            .map_err(|source| GpioError::Read { pin, source })?;

        Value::parse(&raw).ok_or_else(|| GpioError::Read {
            pin,
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected gpio value {:?}", raw),
            ),
        })
    }

    /// Hands the pin back to the kernel. Releasing an already released pin is a no-op.
    pub fn unexport<F>(&mut self, fs: &F) -> Result<(), GpioError>
    where
        F: Filesystem<File = T>,
    {
        // The attribute files are closed before the kernel removes them.
        match std::mem::replace(&mut self.state, PinState::Released) {
            PinState::Released | PinState::Unexported => return Ok(()),
            PinState::Requested | PinState::Exported { .. } => {}
        }
        write_control(fs, &self.root.join("unexport"), self.number).map_err(|source| {
            GpioError::Unexport {
                pin: self.number,
                source,
            }
        })?;

        debug!(pin = self.number, "unexported gpio");
        Ok(())
    }

    fn value_file(&mut self) -> io::Result<&mut T> {
        match &mut self.state {
            PinState::Exported { value_file, .. } => Ok(value_file),
            _ => Err(not_exported(self.number)),
        }
    }
}

fn write_control<F: Filesystem>(fs: &F, path: &Path, pin: u8) -> io::Result<()> {
    fs.open(path, Access::WriteOnly)?
        .write_attribute(&pin.to_string())
}

fn not_exported(pin: u8) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotConnected,
        format!("gpio{} is not exported", pin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::mock::{MockFile, MockFilesystem};

    const ROOT: &str = "/sys/class/gpio";

    fn exported(fs: &MockFilesystem, number: u8) -> DigitalPin<MockFile> {
        let mut pin = DigitalPin::new(number, ROOT);
        pin.export(fs).unwrap();
        pin
    }

    #[test]
    fn export_writes_number_once() {
        let fs = MockFilesystem::with_gpio(ROOT, &[17]);
        let mut pin = exported(&fs, 17);
        pin.export(&fs).unwrap();

        assert!(pin.is_exported());
        assert_eq!(fs.writes("/sys/class/gpio/export"), vec!["17"]);
    }

    #[test]
    fn export_fails_without_pin_entries() {
        let fs = MockFilesystem::with_gpio(ROOT, &[]);
        let mut pin = DigitalPin::<MockFile>::new(2, ROOT);

        assert!(matches!(
            pin.export(&fs),
            Err(GpioError::Export { pin: 2, .. })
        ));
        assert!(!pin.is_exported());
    }

    #[test]
    fn half_exported_pin_is_still_released() {
        let fs = MockFilesystem::with_gpio(ROOT, &[]);
        let mut pin = DigitalPin::<MockFile>::new(5, ROOT);
        assert!(pin.export(&fs).is_err());

        fs.add_file("/sys/class/gpio/gpio5/direction");
        fs.add_file("/sys/class/gpio/gpio5/value");
        pin.export(&fs).unwrap();
        pin.unexport(&fs).unwrap();

        assert_eq!(fs.writes("/sys/class/gpio/export"), vec!["5"]);
        assert_eq!(fs.writes("/sys/class/gpio/unexport"), vec!["5"]);
    }

    #[test]
    fn never_exported_pin_releases_silently() {
        let fs = MockFilesystem::with_gpio(ROOT, &[]);
        let mut pin = DigitalPin::<MockFile>::new(6, ROOT);

        pin.unexport(&fs).unwrap();
        assert!(fs.writes("/sys/class/gpio/unexport").is_empty());
    }

    #[test]
    fn direction_is_written_only_on_change() {
        let fs = MockFilesystem::with_gpio(ROOT, &[4]);
        let mut pin = exported(&fs, 4);

        pin.write(Value::High).unwrap();
        pin.write(Value::Low).unwrap();
        pin.read().unwrap();
        pin.read().unwrap();
        pin.write(Value::High).unwrap();

        assert_eq!(
            fs.writes("/sys/class/gpio/gpio4/direction"),
            vec!["out", "in", "out"]
        );
        assert_eq!(fs.writes("/sys/class/gpio/gpio4/value"), vec!["1", "0", "1"]);
    }

    #[test]
    fn read_parses_value_entry() {
        let fs = MockFilesystem::with_gpio(ROOT, &[27]);
        let mut pin = exported(&fs, 27);

        pin.write(Value::High).unwrap();
        assert_eq!(pin.read().unwrap(), Value::High);
    }

    #[test]
    fn read_rejects_garbage() {
        let fs = MockFilesystem::with_gpio(ROOT, &[22]);
        let mut pin = exported(&fs, 22);
        fs.open(Path::new("/sys/class/gpio/gpio22/value"), Access::ReadWrite)
            .unwrap()
            .write_attribute("2\n")
            .unwrap();

        match pin.read() {
            Err(GpioError::Read { pin: 22, source }) => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn failing_direction_entry_is_reported() {
        let fs = MockFilesystem::with_gpio(ROOT, &[18]);
        fs.fail_on("/sys/class/gpio/gpio18/direction");
        let mut pin = exported(&fs, 18);

        assert!(matches!(
            pin.write(Value::High),
            Err(GpioError::Direction { pin: 18, .. })
        ));
    }

    #[test]
    fn failing_value_entry_is_a_write_error() {
        let fs = MockFilesystem::with_gpio(ROOT, &[23]);
        fs.fail_on("/sys/class/gpio/gpio23/value");
        let mut pin = exported(&fs, 23);

        assert!(matches!(
            pin.write(Value::Low),
            Err(GpioError::Write { pin: 23, .. })
        ));
    }

    #[test]
    fn failing_value_entry_is_a_read_error() {
        let fs = MockFilesystem::with_gpio(ROOT, &[25]);
        let mut pin = exported(&fs, 25);
        fs.fail_on("/sys/class/gpio/gpio25/value");

        match pin.read() {
            Err(GpioError::Read { pin: 25, source }) => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs.writes("/sys/class/gpio/gpio25/direction"), vec!["in"]);
    }

    #[test]
    fn unexport_is_idempotent() {
        let fs = MockFilesystem::with_gpio(ROOT, &[24]);
        let mut pin = exported(&fs, 24);

        pin.unexport(&fs).unwrap();
        pin.unexport(&fs).unwrap();

        assert!(!pin.is_exported());
        assert_eq!(fs.writes("/sys/class/gpio/unexport"), vec!["24"]);
        assert!(matches!(
            pin.write(Value::High),
            Err(GpioError::Direction { pin: 24, .. })
        ));
    }

    #[test]
    fn values_convert_from_primitives() {
        assert_eq!(Value::try_from(1u8).ok(), Some(Value::High));
        assert!(Value::try_from(7u8).is_err());
        assert_eq!(Value::from(false), Value::Low);
        assert_eq!(u8::from(Value::High), 1);
        assert_eq!(Value::parse("0\n"), Some(Value::Low));
    }
}

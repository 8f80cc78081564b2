//! Runs the adaptor against the real filesystem, using a temporary directory laid out like `/sys/class/gpio`.

use raspi_sysfs_adaptor::sysfs::{Filesystem, I2cDevice, SysFs};
use raspi_sysfs_adaptor::{
    Adaptor, AdaptorConfig, CpuInfo, GpioError, HardwareRevision, RaspiError, Value,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const CPUINFO: &str = "processor       : 0
model name      : ARMv6-compatible processor rev 7 (v6l)

Hardware        : BCM2708
Revision        : 0010
Serial          : 000000003bc748ea
";

struct Board {
    dir: TempDir,
}

impl Board {
    fn new(pins: &[u8]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cpuinfo"), CPUINFO).unwrap();

        let gpio = dir.path().join("gpio");
        fs::create_dir(&gpio).unwrap();
        fs::write(gpio.join("export"), "").unwrap();
        fs::write(gpio.join("unexport"), "").unwrap();
        for pin in pins {
            let pin_dir = gpio.join(format!("gpio{}", pin));
            fs::create_dir(&pin_dir).unwrap();
            fs::write(pin_dir.join("direction"), "in").unwrap();
            fs::write(pin_dir.join("value"), "0").unwrap();
        }

        Self { dir }
    }

    fn config(&self) -> AdaptorConfig {
        AdaptorConfig::default()
            .with_name("integration")
            .with_gpio_root(self.dir.path().join("gpio"))
    }

    fn adaptor(&self, config: AdaptorConfig) -> Adaptor {
        let cpuinfo = CpuInfo::new(self.dir.path().join("cpuinfo"));
        Adaptor::with_backends(config, cpuinfo, SysFs)
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join("gpio").join(relative)).unwrap()
    }
}

#[test]
fn detects_revision_from_cpuinfo_file() {
    let board = Board::new(&[]);
    let mut raspi = board.adaptor(board.config());

    raspi.connect().unwrap();

    assert_eq!(raspi.revision(), Some(HardwareRevision::Rev3));
    assert_eq!(raspi.i2c_location(), Some("/dev/i2c-1"));
}

#[test]
fn writes_land_in_value_entries() {
    let board = Board::new(&[4, 27]);
    let mut raspi = board.adaptor(board.config());
    raspi.connect().unwrap();

    raspi.digital_write("7", Value::High).unwrap();
    assert_eq!(board.read("export"), "4");
    assert_eq!(board.read("gpio4/direction"), "out");
    assert_eq!(board.read("gpio4/value"), "1");

    raspi.digital_write("13", Value::High).unwrap();
    assert_eq!(raspi.digital_read("13").unwrap(), Value::High);
    // "out" is replaced as a whole, not overwritten in place.
    assert_eq!(board.read("gpio27/direction"), "in");

    assert!(raspi.finalize().is_empty());
    let last_released = board.read("unexport");
    assert!(last_released == "4" || last_released == "27");
}

#[test]
fn unparseable_value_is_a_read_error() {
    let board = Board::new(&[4]);
    let mut raspi = board.adaptor(board.config());
    raspi.connect().unwrap();
    raspi.digital_write("7", Value::Low).unwrap();

    fs::write(board.dir.path().join("gpio/gpio4/value"), "x").unwrap();

    assert!(matches!(
        raspi.digital_read("7"),
        Err(RaspiError::Gpio(GpioError::Read { pin: 4, .. }))
    ));
}

#[test]
fn missing_sysfs_fails_export() {
    let board = Board::new(&[]);
    let config = board.config().with_gpio_root(board.dir.path().join("nowhere"));
    let mut raspi = board.adaptor(config);
    raspi.connect().unwrap();

    assert!(matches!(
        raspi.digital_write("7", Value::High),
        Err(RaspiError::Gpio(GpioError::Export { pin: 4, .. }))
    ));
}

#[test]
fn regular_file_is_not_an_i2c_bus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("i2c-1");
    fs::write(&path, "").unwrap();

    let mut bus = SysFs.open_i2c(&path).unwrap();
    assert!(bus.set_address(0x48).is_err());
    assert_eq!(bus.write(&[0x01, 0x02]).unwrap(), 2);

    assert!(SysFs.open_i2c(Path::new("/nonexistent/i2c-9")).is_err());
}

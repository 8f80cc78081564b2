use crate::adaptor::error::PinError;
use crate::revision::HardwareRevision;

/// A header pin as seen by one board revision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinSpec {
    /// Label of the pin on the board header (its physical position).
    pub name: &'static str,
    /// BCM GPIO number exposed by the kernel under `/sys/class/gpio`.
    pub number: u8,
}

/// Mapping from physical position of header pins to BCM GPIO numbers, one column per board revision.
///
/// Pins with `None` in a column are not routed to the header on that revision.
static PINS: [(&str, [Option<u8>; 3]); 26] = [
    ("3", [Some(0), Some(2), Some(2)]),
    ("5", [Some(1), Some(3), Some(3)]),
    ("7", [Some(4), Some(4), Some(4)]),
    ("8", [Some(14), Some(14), Some(14)]),
    ("10", [Some(15), Some(15), Some(15)]),
    ("11", [Some(17), Some(17), Some(17)]),
    ("12", [Some(18), Some(18), Some(18)]),
    ("13", [Some(21), Some(27), Some(27)]),
    ("15", [Some(22), Some(22), Some(22)]),
    ("16", [Some(23), Some(23), Some(23)]),
    ("18", [Some(24), Some(24), Some(24)]),
    ("19", [Some(10), Some(10), Some(10)]),
    ("21", [Some(9), Some(9), Some(9)]),
    ("22", [Some(25), Some(25), Some(25)]),
    ("23", [Some(11), Some(11), Some(11)]),
    ("24", [Some(8), Some(8), Some(8)]),
    ("26", [Some(7), Some(7), Some(7)]),
    ("29", [None, None, Some(5)]),
    ("31", [None, None, Some(6)]),
    ("32", [None, None, Some(12)]),
    ("33", [None, None, Some(13)]),
    ("35", [None, None, Some(19)]),
    ("36", [None, None, Some(16)]),
    ("37", [None, None, Some(26)]),
    ("38", [None, None, Some(20)]),
    ("40", [None, None, Some(21)]),
];

const I2C_BUS_0: &str = "/dev/i2c-0";
const I2C_BUS_1: &str = "/dev/i2c-1";

fn column(revision: HardwareRevision) -> usize {
    use HardwareRevision::*;
    match revision {
        Rev1 => 0,
        Rev2 => 1,
        Rev3 => 2,
    }
}

/// Translates a header label into the BCM number used by the given revision.
pub fn physical_pin(name: &str, revision: HardwareRevision) -> Result<u8, PinError> {
    PINS.iter()
        .find(|(label, _)| *label == name)
        .and_then(|(_, numbers)| numbers[column(revision)])
        .ok_or_else(|| PinError::UnknownPin {
            name: name.to_owned(),
            revision,
        })
}

/// Every header pin usable as GPIO on the given revision, in header order.
pub fn pins(revision: HardwareRevision) -> impl Iterator<Item = PinSpec> {
    let column = column(revision);
    PINS.iter().filter_map(move |(name, numbers)| {
        numbers[column].map(|number| PinSpec {
            name: *name,
            number,
        })
    })
}

/// Device node of the I2C bus routed to the header. First revision boards use bus 0.
pub fn i2c_bus_path(revision: HardwareRevision) -> &'static str {
    match revision {
        HardwareRevision::Rev1 => I2C_BUS_0,
        _ => I2C_BUS_1,
    }
}

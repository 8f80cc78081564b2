//! Board revision detection.
//!
//! Raspberry Pi boards report their revision code in the `Revision` line of `/proc/cpuinfo`.
//! The code decides which pin numbering and which I2C bus a board uses, so it is the first
//! thing `Adaptor::connect` looks at.
use crate::adaptor::error::RevisionError;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Normalized classification of a board revision.
///
/// Only the differences relevant to the GPIO header matter here:
///
/// * `Rev1` - Model B revision 1.0 boards (raw codes up to `0003`), wired to I2C bus 0.
/// * `Rev2` - Revision 2.0 boards with the 26-pin header (raw codes `0004` to `000f`).
/// * `Rev3` - Every board with the 40-pin header. Unknown codes land here as well, so unseen boards
///   still get the most recent mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HardwareRevision {
    Rev1,
    Rev2,
    Rev3,
}

impl HardwareRevision {
    const WARRANTY_BIT: u32 = 1 << 24;
    const NEW_STYLE_BIT: u32 = 1 << 23;

    /// Classifies a raw revision code as reported by the firmware.
    pub fn from_code(code: u32) -> Self {
        use HardwareRevision::*;

        // Old-style codes of over-volted boards carry an extra warranty bit.
        let code = if code & Self::NEW_STYLE_BIT == 0 {
            code & !Self::WARRANTY_BIT
        } else {
            code
        };

        match code {
            0..=3 => Rev1,
            4..=15 => Rev2,
            _ => Rev3,
        }
    }
}

impl fmt::Display for HardwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HardwareRevision::*;
        let number = match self {
            Rev1 => 1,
            Rev2 => 2,
            Rev3 => 3,
        };
        write!(f, "{}", number)
    }
}

/// Capability of reading the raw system information text.
///
/// Implemented for `CpuInfo` and for any closure returning the text, which is handy in tests.
pub trait RevisionSource {
    fn read_source(&self) -> io::Result<String>;
}

impl<F> RevisionSource for F
where
    F: Fn() -> io::Result<String>,
{
    fn read_source(&self) -> io::Result<String> {
        self()
    }
}

/// Reads system information from a file, `/proc/cpuinfo` by default.
#[derive(Clone, Debug)]
pub struct CpuInfo {
    path: PathBuf,
}

impl CpuInfo {
    pub const DEFAULT_PATH: &'static str = "/proc/cpuinfo";

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl RevisionSource for CpuInfo {
    fn read_source(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Reads the source once and classifies the board revision found in it.
pub fn detect_revision<S: RevisionSource + ?Sized>(
    source: &S,
) -> Result<HardwareRevision, RevisionError> {
    let contents = source
        .read_source()
        .map_err(RevisionError::SourceUnavailable)?;
    let code = parse_revision_code(&contents)?;

    Ok(HardwareRevision::from_code(code))
}

/// Extracts the hexadecimal value of the `Revision` line.
pub fn parse_revision_code(contents: &str) -> Result<u32, RevisionError> {
    let raw = contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("revision"))
        .map(|(_, value)| value.trim())
        .ok_or_else(|| RevisionError::Parse("no Revision line found".to_owned()))?;

    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    u32::from_str_radix(digits, 16)
        .map_err(|err| RevisionError::Parse(format!("invalid revision code {:?}: {}", raw, err)))
}

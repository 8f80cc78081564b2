//! Reads two bytes from register 0 of an I2C device, e.g. the temperature of a TMP102 sensor.
//!
//! Usage: `i2c_probe [address]`, the address is hexadecimal and defaults to 48.

use raspi_sysfs_adaptor::{Adaptor, AdaptorConfig};
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let address = match env::args().nth(1) {
        Some(arg) => u16::from_str_radix(arg.trim_start_matches("0x"), 16)?,
        None => 0x48,
    };

    let mut raspi = Adaptor::new(AdaptorConfig::default());
    raspi.connect()?;
    println!(
        "board revision {}, using {}",
        raspi.revision().map_or_else(|| "?".to_owned(), |r| r.to_string()),
        raspi.i2c_location().unwrap_or("?")
    );

    raspi.i2c_start(address)?;
    raspi.i2c_write(&[0x00])?;
    let data = raspi.i2c_read(2)?;
    println!("{:#04x}: {:02x?}", address, data);

    Ok(())
}

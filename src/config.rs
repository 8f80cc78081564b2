use std::path::{Path, PathBuf};

/// Settings of an `Adaptor`.
///
/// The defaults match a stock Raspberry Pi OS installation. Overriding the GPIO root is mostly
/// useful for tests and for systems mounting sysfs somewhere unusual. Where the board revision is
/// read from is not a setting, it is the `RevisionSource` handed to `Adaptor::with_backends`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdaptorConfig {
    pub name: String,
    pub gpio_root: PathBuf,
}

impl AdaptorConfig {
    pub const DEFAULT_NAME: &'static str = "raspi";
    pub const DEFAULT_GPIO_ROOT: &'static str = "/sys/class/gpio";

    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_gpio_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.gpio_root = root.as_ref().to_owned();
        self
    }
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_owned(),
            gpio_root: PathBuf::from(Self::DEFAULT_GPIO_ROOT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = AdaptorConfig::default()
            .with_name("rover")
            .with_gpio_root("/tmp/gpio");

        assert_eq!(config.name, "rover");
        assert_eq!(config.gpio_root, Path::new("/tmp/gpio"));
    }
}

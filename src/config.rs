//! Configuration for flatdb
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a flatdb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Open-time Validation
    // -------------------------------------------------------------------------
    /// Expected magic cookie. When set, opening a file whose header
    /// carries a different cookie fails with a metadata error. When
    /// `None`, the cookie is parsed but not checked, matching the
    /// historical behavior of the file format.
    pub expected_magic: Option<i32>,

    // -------------------------------------------------------------------------
    // Access Mode
    // -------------------------------------------------------------------------
    /// Open the file without write access. `create`, `update`, and
    /// `delete` fail immediately; `read`, `find`, and locking still work.
    pub read_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_magic: None,
            read_only: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Require the file header to carry this magic cookie
    pub fn expected_magic(mut self, magic: i32) -> Self {
        self.config.expected_magic = Some(magic);
        self
    }

    /// Open the file read-only
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

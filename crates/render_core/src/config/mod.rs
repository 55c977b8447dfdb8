//! Configuration system
//!
//! Device configuration with TOML and RON file support. The file format is
//! picked from the extension, matching how the rest of the engine stores
//! its settings.

pub use serde::{Deserialize, Serialize};

use crate::render::backends::GraphicsBackend;
use crate::render::cache::CollisionPolicy;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but make no sense
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Device Configuration
///
/// Settings consumed by [`GraphicsDevice`](crate::render::GraphicsDevice) at
/// construction: which backend to bring up, how large the resource caches
/// start out, and what to do when two descriptions hash to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Application name, used in log output
    pub application_name: String,
    /// Backend to instantiate when using `GraphicsDevice::from_config`
    pub backend: GraphicsBackend,
    /// Initial capacity of the texture cache
    pub texture_cache_capacity: usize,
    /// Initial capacity of the program cache
    pub program_cache_capacity: usize,
    /// Initial capacity of the material cache
    pub material_cache_capacity: usize,
    /// Behavior when a cache key is inserted twice
    pub collision_policy: CollisionPolicy,
    /// Default log filter for applications that initialize logging from config
    pub log_level: String,
}

impl DeviceConfig {
    /// Create a new device configuration with defaults
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            backend: GraphicsBackend::Headless,
            texture_cache_capacity: 64,
            program_cache_capacity: 32,
            material_cache_capacity: 64,
            collision_policy: CollisionPolicy::KeepFirst,
            log_level: "info".to_string(),
        }
    }

    /// Select the graphics backend
    pub fn with_backend(mut self, backend: GraphicsBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Set all initial cache capacities
    pub fn with_cache_capacity(mut self, textures: usize, programs: usize, materials: usize) -> Self {
        self.texture_cache_capacity = textures;
        self.program_cache_capacity = programs;
        self.material_cache_capacity = materials;
        self
    }

    /// Set the cache key collision policy
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the default log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }

        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("Log level cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new("Render Core Application")
    }
}

impl Config for DeviceConfig {}

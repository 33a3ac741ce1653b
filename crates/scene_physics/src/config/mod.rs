//! Configuration system
//!
//! File-backed configuration in TOML or RON; the file extension selects the
//! format.

pub mod physics;

pub use serde::{Serialize, Deserialize};
pub use physics::{PhysicsConfig, CombineRule};

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `*.toml`
    Toml,
    /// `*.ron`
    Ron,
}

impl Format {
    /// Pick the format from a file name
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_string())),
        }
    }
}

/// Serde-backed configuration value
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and parse a configuration file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let format = Format::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loaded configuration from {path}");
        Self::from_text(format, &contents)
    }

    /// Parse configuration text; `path` is only used to pick the format
    fn parse(path: &str, contents: &str) -> Result<Self, ConfigError> {
        Self::from_text(Format::from_path(path)?, contents)
    }

    /// Parse configuration text in a known format
    fn from_text(format: Format, contents: &str) -> Result<Self, ConfigError> {
        let parsed = match format {
            Format::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            Format::Ron => ron::from_str(contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(ConfigError::Parse)
    }

    /// Render configuration text in the format implied by `path`
    fn render(&self, path: &str) -> Result<String, ConfigError> {
        let rendered = match Format::from_path(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| e.to_string()),
        };
        rendered.map_err(ConfigError::Serialize)
    }

    /// Write configuration to a file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        std::fs::write(path, self.render(path)?)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Text did not deserialize
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value did not serialize
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Extension is neither `.toml` nor `.ron`
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path("world.toml").ok(), Some(Format::Toml));
        assert_eq!(Format::from_path("dir.v2/world.ron").ok(), Some(Format::Ron));
        assert!(matches!(Format::from_path("world.json"), Err(ConfigError::UnsupportedFormat(_))));
        assert!(matches!(Format::from_path("toml"), Err(ConfigError::UnsupportedFormat(_))));
    }
}

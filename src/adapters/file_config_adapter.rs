//! INI file configuration adapter.

use crate::domain::error::RegimeTraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_uint(&self, section: &str, key: &str) -> Result<Option<u64>, RegimeTraderError> {
        self.config
            .getuint(section, key)
            .map_err(|e| RegimeTraderError::invalid(section, key, e))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, RegimeTraderError> {
        self.config
            .getfloat(section, key)
            .map_err(|e| RegimeTraderError::invalid(section, key, e))
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, RegimeTraderError> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(v) => Self::parse_bool(&v).map(Some).ok_or_else(|| {
                RegimeTraderError::invalid(section, key, format!("'{v}' is not a boolean"))
            }),
        }
    }
}

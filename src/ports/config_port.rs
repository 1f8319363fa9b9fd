//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for an absent key and an error for a
//! value that is present but does not parse.

use crate::domain::error::RegimeTraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_uint(&self, section: &str, key: &str) -> Result<Option<u64>, RegimeTraderError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, RegimeTraderError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, RegimeTraderError>;

    /// Comma-separated values, trimmed, empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
    }
}

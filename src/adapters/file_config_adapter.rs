//! INI file configuration adapter.
//!
//! Values are read lazily through [`ConfigPort`]; range checks live in
//! `domain::config_validation`.

use crate::domain::error::SignalError;
use crate::ports::config_port::{parse_flag, ConfigPort};
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        Self::load(path.display().to_string(), |ini| ini.load(path).map(|_| ()))
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        Self::load("<inline>".to_string(), |ini| {
            ini.read(content.to_string()).map(|_| ())
        })
    }

    fn load(
        origin: String,
        fill: impl FnOnce(&mut Ini) -> Result<(), String>,
    ) -> Result<Self, SignalError> {
        let mut ini = Ini::new();
        fill(&mut ini).map_err(|reason| SignalError::ConfigParse {
            file: origin,
            reason,
        })?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.ini.getint(section, key) {
            Ok(Some(value)) => value,
            _ => default,
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.ini.getfloat(section, key) {
            Ok(Some(value)) => value,
            _ => default,
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(default)
    }
}

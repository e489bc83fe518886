//! INI file configuration adapter.

use crate::domain::error::DeskError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeskError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| DeskError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, DeskError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| DeskError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
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
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_values_by_type() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nsource = stooq\ndays = 90\n\n[backtest]\nfee_bps = 2.5\n\n[web]\nenabled = on\n",
        )
        .unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("stooq".into()));
        assert_eq!(adapter.get_int("data", "days", 0), 90);
        assert_eq!(adapter.get_double("backtest", "fee_bps", 0.0), 2.5);
        assert!(adapter.get_bool("web", "enabled", false));
    }

    #[test]
    fn missing_and_malformed_fall_back() {
        let adapter = FileConfigAdapter::from_string("[data]\ndays = lots\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("nope", "days"), None);
        assert_eq!(adapter.get_int("data", "days", 252), 252);
        assert_eq!(adapter.get_double("data", "days", 1.5), 1.5);
        assert!(!adapter.get_bool("data", "days", false));
    }

    #[test]
    fn get_string_or_treats_blank_as_missing() {
        let adapter = FileConfigAdapter::from_string("[database]\npath =   \n").unwrap();
        assert_eq!(
            adapter.get_string_or("database", "path", "data/chartdesk.db"),
            "data/chartdesk.db"
        );
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[database]\npath = /var/lib/chartdesk.db\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("database", "path"),
            Some("/var/lib/chartdesk.db".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, DeskError::ConfigParse { .. }));
    }
}

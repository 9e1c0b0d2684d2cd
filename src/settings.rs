//! Handles settings for the application. Configuration is read from an
//! optional `costbook.toml` in the working directory and from
//! `COSTBOOK__*` environment variables (e.g. `COSTBOOK__DATABASE__PATH`).
use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::{MonthNames, MonthTableError};

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub log: Log,
    /// Month name -> month number; the Russian table is used when absent.
    pub months: Option<HashMap<String, u32>>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("costbook")
    }

    /// Load settings from `name` (any extension `config` understands),
    /// falling back to defaults when the file doesn't exist.
    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("database.path", "costbook.db")?
            .set_default("log.level", "info")?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("COSTBOOK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn month_names(&self) -> Result<MonthNames, MonthTableError> {
        match &self.months {
            Some(table) => MonthNames::new(table.iter().map(|(name, n)| (name, *n))),
            None => Ok(MonthNames::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::from_file("does-not-exist/costbook").unwrap();
        assert_eq!(settings.database.path, "costbook.db");
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.month_names().unwrap(), MonthNames::default());
    }

    #[test]
    fn test_custom_month_table_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("costbook.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[database]
path = "ledger.db"

[months]
january = 1
february = 2
march = 3
april = 4
may = 5
june = 6
july = 7
august = 8
september = 9
october = 10
november = 11
december = 12
"#
        )
        .unwrap();

        let settings = Settings::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.database.path, "ledger.db");

        let months = settings.month_names().unwrap();
        assert_eq!(months.month_number("March"), Some(3));
        assert_eq!(months.month_number("март"), None);
    }

    #[test]
    fn test_incomplete_month_table_is_rejected() {
        let settings = Settings {
            database: Database {
                path: "x.db".to_string(),
            },
            log: Log {
                level: "info".to_string(),
            },
            months: Some(HashMap::from([("jan".to_string(), 1)])),
        };
        assert!(settings.month_names().is_err());
    }
}

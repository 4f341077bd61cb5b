use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    5
}

fn default_pacing_secs() -> u64 {
    3
}

fn default_top_left_cell() -> String {
    "A1".into()
}

#[derive(Debug, Deserialize)]
pub struct CrawlerSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl CrawlerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            pacing_secs: default_pacing_secs(),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub csv: bool,
    #[serde(default)]
    pub csv_path: String,
    #[serde(default)]
    pub gsheet: bool,
    #[serde(default)]
    pub gsheet_access_token: String,
    #[serde(default)]
    pub gsheet_spreadsheet_id: String,
    #[serde(default)]
    pub gsheet_sheet_name: String,
    #[serde(default = "default_top_left_cell")]
    pub gsheet_top_left_cell: String,
    #[serde(default)]
    pub gsheet_sheet_id: i64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv: false,
            csv_path: String::new(),
            gsheet: false,
            gsheet_access_token: String::new(),
            gsheet_spreadsheet_id: String::new(),
            gsheet_sheet_name: String::new(),
            gsheet_top_left_cell: default_top_left_cell(),
            gsheet_sheet_id: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub crawler: CrawlerSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut s = Config::new();
        s.merge(Environment::new().separator("__"))?;
        s.try_into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.crawler.timeout(), Duration::from_secs(5));
        assert_eq!(settings.crawler.pacing(), Duration::from_secs(3));
        assert!(!settings.crawler.accept_invalid_certs);
        assert!(!settings.output.csv);
        assert!(!settings.output.gsheet);
        assert_eq!(settings.output.gsheet_top_left_cell, "A1");
        assert_eq!(settings.output.gsheet_sheet_id, 0);
    }

    #[test]
    fn test_partial_sections() {
        let settings: Settings = serde_json::from_str(
            r#"{"crawler": {"pacing_secs": 1}, "output": {"csv": true, "csv_path": "out.csv"}}"#,
        )
        .unwrap();
        assert_eq!(settings.crawler.pacing(), Duration::from_secs(1));
        assert_eq!(settings.crawler.timeout(), Duration::from_secs(5));
        assert!(settings.output.csv);
        assert_eq!(settings.output.csv_path, "out.csv");
        assert_eq!(settings.output.gsheet_top_left_cell, "A1");
    }

    #[test]
    fn test_missing_output_section_keeps_field_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"crawler": {}}"#).unwrap();
        assert_eq!(settings.output.gsheet_top_left_cell, "A1");
        assert_eq!(
            OutputSettings::default().gsheet_top_left_cell,
            default_top_left_cell()
        );
        assert_eq!(Settings::default().output.gsheet_top_left_cell, "A1");
    }
}

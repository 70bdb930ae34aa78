use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub neighborhoods_csv: PathBuf,
    pub businesses_csv: PathBuf,
    pub bus_stops_csv: PathBuf,
    #[serde(default = "default_comma")]
    pub neighborhoods_delimiter: char,
    #[serde(default = "default_semicolon")]
    pub businesses_delimiter: char,
    #[serde(default = "default_semicolon")]
    pub bus_stops_delimiter: char,
    #[serde(default = "default_map_dir")]
    pub map_dir: PathBuf,
    #[serde(default)]
    pub columns: ColumnConfig,
}

/// Header names looked up in each registry CSV.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnConfig {
    pub neighborhood_name: String,
    pub neighborhood_code: String,
    pub business_trade_name: String,
    pub business_neighborhood: String,
    pub business_cnae_code: String,
    pub business_cnae_description: String,
    pub business_mei: String,
    pub stop_line_code: String,
    pub stop_line_name: String,
    pub stop_origin: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            neighborhood_name: "NOME".to_string(),
            neighborhood_code: "CODIGO".to_string(),
            business_trade_name: "NOME_FANTASIA".to_string(),
            business_neighborhood: "NOME_BAIRRO".to_string(),
            business_cnae_code: "CNAE_PRINCIPAL".to_string(),
            business_cnae_description: "DESCRICAO_CNAE_PRINCIPAL".to_string(),
            business_mei: "IND_MEI".to_string(),
            stop_line_code: "COD_LINHA".to_string(),
            stop_line_name: "NOME_LINHA".to_string(),
            stop_origin: "ORIGEM".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Row limits and label widths used when rendering pages.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub preview_rows: usize,
    pub top_neighborhoods: usize,
    pub neighborhood_choices: usize,
    pub top_activities: usize,
    pub top_lines: usize,
    pub top_origins: usize,
    pub activity_label_width: usize,
    pub line_label_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_rows: 100,
            top_neighborhoods: 10,
            neighborhood_choices: 20,
            top_activities: 10,
            top_lines: 15,
            top_origins: 10,
            activity_label_width: 40,
            line_label_width: 35,
        }
    }
}

fn default_comma() -> char {
    ','
}

fn default_semicolon() -> char {
    ';'
}

fn default_map_dir() -> PathBuf {
    PathBuf::from("mapas_exportados")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            neighborhoods_csv = "raw_data/bairros.csv"
            businesses_csv = "raw_data/economia.csv"
            bus_stops_csv = "raw_data/onibus.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.neighborhoods_delimiter, ',');
        assert_eq!(config.input.businesses_delimiter, ';');
        assert_eq!(config.input.map_dir, PathBuf::from("mapas_exportados"));
        assert_eq!(config.input.columns.business_mei, "IND_MEI");
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.display.preview_rows, 100);
        assert_eq!(config.display.top_lines, 15);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            neighborhoods_csv = "a.csv"
            businesses_csv = "b.csv"
            bus_stops_csv = "c.csv"
            businesses_delimiter = ","

            [input.columns]
            business_mei = "MEI"

            [server]
            port = 9000

            [display]
            top_lines = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.input.businesses_delimiter, ',');
        assert_eq!(config.input.columns.business_mei, "MEI");
        assert_eq!(config.input.columns.business_neighborhood, "NOME_BAIRRO");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.display.top_lines, 5);
        assert_eq!(config.display.top_activities, 10);
    }

    #[test]
    fn missing_input_section_is_an_error() {
        assert!(AppConfig::from_toml("[server]\nport = 1").is_err());
    }
}

// Application settings
// Loaded from ~/.config/tesisview/settings.json

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tesisview_io::{ExportFormat, DEFAULT_FILE_STEM};

/// Logging threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by env filters ("warn", "debug", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Analysis service
    #[serde(rename = "server.baseUrl")]
    pub server_base_url: String,

    #[serde(rename = "server.requestTimeoutMs")]
    pub request_timeout_ms: Option<u64>,  // None = transport default

    // Export
    #[serde(rename = "export.format")]
    pub export_format: ExportFormat,

    #[serde(rename = "export.fileName")]
    pub export_file_name: String,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: None,
            export_format: ExportFormat::default(),
            export_file_name: ExportFormat::default().default_file_name(),
            log_level: LogLevel::Warn,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Analysis service
    "server.baseUrl": "http://localhost:5000",
    // Whole-request deadline in milliseconds (null = no explicit deadline)
    "server.requestTimeoutMs": null,

    // Client-side export: "xlsx" or "csv"
    "export.format": "xlsx",
    "export.fileName": "resultados_tesis.xlsx",

    // Logging: "off", "error", "warn", "info", "debug", "trace"
    "log.level": "warn"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tesisview");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with defaults;
    /// an unreadable or malformed one yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            create_default_file(path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Export file name with the extension forced to match `export.format`
    pub fn export_file_name(&self) -> String {
        let name = self.export_file_name.trim();
        let stem = if name.is_empty() { DEFAULT_FILE_STEM } else { name };
        Path::new(stem)
            .with_extension(self.export_format.extension())
            .to_string_lossy()
            .into_owned()
    }
}

fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        eprintln!("Error writing default settings.json: {}", e);
    }
}

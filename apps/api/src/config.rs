use anyhow::{bail, Context, Result};

use crate::report::{default_report_layout, ReportLayout};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Overrides the fraction of the line width report tables span.
    pub report_table_width: Option<f64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            report_table_width: match std::env::var("REPORT_TABLE_WIDTH") {
                Ok(raw) => Some(parse_table_width(&raw)?),
                Err(_) => None,
            },
        })
    }

    pub fn report_layout(&self) -> ReportLayout {
        let mut layout = default_report_layout();
        if let Some(width) = self.report_table_width {
            layout.table_width_fraction = width;
        }
        layout
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_table_width(raw: &str) -> Result<f64> {
    let width = raw
        .trim()
        .parse::<f64>()
        .context("REPORT_TABLE_WIDTH must be a number")?;
    if !(width > 0.0 && width <= 1.0) {
        bail!("REPORT_TABLE_WIDTH must lie in (0, 1], got {width}");
    }
    Ok(width)
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "uat.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct UatConfig {
    pub api: ApiConfig,
    #[serde(rename = "target")]
    pub targets: Vec<TargetConfig>,
    pub docs: DocsConfig,
}

impl Default for UatConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            targets: vec![
                TargetConfig::split(
                    "EHS_UAT_Signoff_v1/EHS_UAT_Signoff_v1.xlsx",
                    "UAT Sign-Off",
                ),
                TargetConfig::split(
                    "EHS_UAT_Phase5_Analytics/EHS_UAT_Phase5_Analytics.xlsx",
                    "Phase 5 UAT",
                ),
            ],
            docs: DocsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub credentials: HashMap<String, Credentials>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let credentials = HashMap::from([
            (
                "admin".to_string(),
                Credentials::new("admin@ehs.local", "Admin123!"),
            ),
            (
                "manager".to_string(),
                Credentials::new("manager@ehs.local", "Manager123!"),
            ),
            (
                "worker".to_string(),
                Credentials::new("worker@ehs.local", "Worker123!"),
            ),
        ]);
        Self {
            base_url: "http://127.0.0.1:3001/api".to_string(),
            timeout_secs: 5,
            credentials,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            bail!("api.base_url cannot be empty");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!("api.base_url must start with http:// or https://");
        }
        if self.timeout_secs == 0 {
            bail!("api.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

/// Where the result and notes land within a matched row. Columns are 1-based.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultLayout {
    Split {
        result_column: u32,
        notes_column: u32,
    },
    /// One cell holding "<status> - <notes>".
    Combined { column: u32 },
}

impl Default for ResultLayout {
    fn default() -> Self {
        ResultLayout::Split {
            result_column: 6,
            notes_column: 7,
        }
    }
}

fn default_id_column() -> u32 {
    2
}

fn default_first_row() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetConfig {
    pub path: PathBuf,
    pub sheet: String,
    #[serde(default = "default_id_column")]
    pub id_column: u32,
    #[serde(default = "default_first_row")]
    pub first_row: u32,
    #[serde(default)]
    pub id_prefix: Option<String>,
    #[serde(default)]
    pub layout: ResultLayout,
}

impl TargetConfig {
    pub fn split(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
            id_column: default_id_column(),
            first_row: default_first_row(),
            id_prefix: None,
            layout: ResultLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: ResultLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let columns = match self.layout {
            ResultLayout::Split {
                result_column,
                notes_column,
            } => vec![self.id_column, result_column, notes_column],
            ResultLayout::Combined { column } => vec![self.id_column, column],
        };
        if columns.contains(&0) {
            bail!(
                "target {}: column numbers are 1-based and must be greater than 0",
                self.path.display()
            );
        }
        if self.first_row == 0 {
            bail!("target {}: first_row must be greater than 0", self.path.display());
        }
        if self.sheet.is_empty() {
            bail!("target {}: sheet name cannot be empty", self.path.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DocSection {
    pub heading: String,
    pub source: String,
}

impl DocSection {
    fn new(heading: &str, source: &str) -> Self {
        Self {
            heading: heading.to_string(),
            source: source.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocsConfig {
    pub title: String,
    pub output: PathBuf,
    #[serde(rename = "section")]
    pub sections: Vec<DocSection>,
    pub diagram_sources: Vec<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            title: "EHS Portal - Phase 1 Design".to_string(),
            output: PathBuf::from("EHS_Phase1_Design.docx"),
            sections: vec![
                DocSection::new("Introduction & Scope", "docs/BRD_EHS_PORTAL_PHASE1.md"),
                DocSection::new(
                    "Business Requirements (Phase 1)",
                    "docs/BRD_EHS_PORTAL_PHASE1.md",
                ),
                DocSection::new("Architecture Overview", "docs/ARCHITECTURE_PHASE1.md"),
                DocSection::new("Data Model (ERD)", "docs/DATA_MODEL_PHASE1.md"),
                DocSection::new("Key Workflows", "docs/WORKFLOWS_PHASE1.md"),
                DocSection::new("API Summary", "docs/API_SPEC_PHASE1.md"),
                DocSection::new("Test Strategy (Phase 1)", "docs/TEST_STRATEGY_PHASE1.md"),
            ],
            diagram_sources: vec![
                "docs/ARCHITECTURE_PHASE1.md".to_string(),
                "docs/DATA_MODEL_PHASE1.md".to_string(),
                "docs/WORKFLOWS_PHASE1.md".to_string(),
            ],
        }
    }
}

impl UatConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: UatConfig = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }

    /// Reads `path` if given. Otherwise reads `uat.toml` from the working
    /// directory when present, falling back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("in config file: {}", path.display()))?;
        info!(path = %path.display(), targets = config.targets.len(), "loaded configuration");
        Ok(config)
    }
}

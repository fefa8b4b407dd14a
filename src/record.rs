use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::info;

use crate::config::UatConfig;
use crate::status::{ResultSet, TestResult, TestStatus};
use crate::writer;

#[derive(Debug, Deserialize)]
struct ResultsFile {
    #[serde(rename = "result", default)]
    results: Vec<ResultEntry>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    id: String,
    status: TestStatus,
    #[serde(default)]
    notes: String,
}

pub fn parse_results(text: &str) -> Result<ResultSet> {
    let file: ResultsFile = toml::from_str(text).context("invalid results file")?;
    let mut set = ResultSet::new();
    for entry in file.results {
        let id = entry.id.trim();
        if id.is_empty() {
            bail!("result entry with empty id");
        }
        set.insert(TestResult::new(id, entry.status, entry.notes));
    }
    Ok(set)
}

pub fn load_results(path: &Path) -> Result<ResultSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read results file: {}", path.display()))?;
    parse_results(&text).with_context(|| format!("in results file: {}", path.display()))
}

#[derive(Debug, Parser)]
#[command(name = "uat-record")]
#[command(about = "Write a prepared set of test results into the UAT workbooks")]
struct RecordCli {
    /// TOML file with [[result]] entries (id, status, notes)
    #[arg(short, long)]
    results: PathBuf,
    /// Configuration file (defaults to ./uat.toml, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn run(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<()> {
    let cli = RecordCli::parse_from(args);
    let config = UatConfig::load(cli.config.as_deref())?;
    let results = load_results(&cli.results)?;
    info!(count = results.len(), "loaded results");

    let total = writer::record_all(&config.targets, &results)?;
    println!(
        "Recorded {total} results [Timestamp: {}]",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let text = r#"
[[result]]
id = "ST-AUTH-01"
status = "pass"
notes = "Login screens captured for all roles"

[[result]]
id = "ST-2FA-01"
status = "Planned"
notes = "2FA feature scheduled for Phase 6+"

[[result]]
id = "ST-EXP-01"
status = "fail"
"#;
        let set = parse_results(text).unwrap();
        let ids: Vec<_> = set.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(ids, ["ST-AUTH-01", "ST-2FA-01", "ST-EXP-01"]);
        assert_eq!(set.get("ST-2FA-01").unwrap().status, TestStatus::Planned);
        assert_eq!(set.get("ST-EXP-01").unwrap().notes, "");
    }

    #[test]
    fn duplicate_ids_keep_last_value() {
        let text = r#"
[[result]]
id = "P1-02"
status = "pass"
notes = "form accessible"

[[result]]
id = "P1-02"
status = "pass"
notes = "REST API operational"
"#;
        let set = parse_results(text).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("P1-02").unwrap().notes, "REST API operational");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let text = "[[result]]\nid = \"P1-01\"\nstatus = \"skipped\"\n";
        let err = parse_results(text).unwrap_err();
        assert!(format!("{err:#}").contains("skipped"));
    }

    #[test]
    fn bundled_demo_results_parse() {
        let set = parse_results(include_str!("../demos/results.toml")).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.get("ST-AUTH-05").unwrap().status, TestStatus::Planned);
    }

    #[test]
    fn empty_id_is_rejected() {
        let text = "[[result]]\nid = \"  \"\nstatus = \"pass\"\n";
        assert!(parse_results(text).is_err());
    }
}

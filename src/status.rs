use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Pass,
    Fail,
    Planned,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Pass => "Pass",
            TestStatus::Fail => "Fail",
            TestStatus::Planned => "Planned",
        }
    }

    pub fn from_bool(passed: bool) -> Self {
        if passed {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(TestStatus::Pass),
            "fail" => Ok(TestStatus::Fail),
            "planned" => Ok(TestStatus::Planned),
            other => Err(anyhow!("unknown test status: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for TestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub test_id: String,
    pub status: TestStatus,
    pub notes: String,
}

impl TestResult {
    pub fn new(test_id: impl Into<String>, status: TestStatus, notes: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            status,
            notes: notes.into(),
        }
    }

    pub fn pass(test_id: impl Into<String>, notes: impl Into<String>) -> Self {
        Self::new(test_id, TestStatus::Pass, notes)
    }

    pub fn fail(test_id: impl Into<String>, notes: impl Into<String>) -> Self {
        Self::new(test_id, TestStatus::Fail, notes)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.test_id, self.status, self.notes)
    }
}

/// Test results keyed by identifier, in insertion order.
///
/// Re-inserting an identifier replaces its status and notes but keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: Vec<TestResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: TestResult) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.test_id == result.test_id)
        {
            Some(existing) => *existing = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, test_id: &str) -> Option<&TestResult> {
        self.entries.iter().find(|r| r.test_id == test_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<TestResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = TestResult>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

//! HTTP smoke tests against the portal API.
//!
//! Every probe reduces to a [`TestResult`]; transport and body errors become
//! `Fail` results carrying the error text, never an `Err` out of the sequence.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, Credentials, UatConfig};
use crate::status::{ResultSet, TestResult, TestStatus};
use crate::writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    Worker,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Worker];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Worker => "worker",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Worker => "Worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no credentials configured for {0}")]
    MissingCredentials(Role),
    #[error("login for {role} rejected, Status: {status}")]
    LoginRejected { role: Role, status: u16 },
    #[error("login for {0} returned no token")]
    MissingToken(Role),
    #[error("unexpected response shape: {0}")]
    Shape(&'static str),
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

fn read_json(response: Response) -> ProbeResult<Value> {
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

fn settle(test_id: &str, outcome: ProbeResult<TestResult>) -> TestResult {
    outcome.unwrap_or_else(|err| {
        warn!(test_id, error = %err, "probe failed");
        TestResult::fail(test_id, err.to_string())
    })
}

pub struct ProbeClient {
    http: Client,
    base_url: String,
    credentials: HashMap<String, Credentials>,
    tokens: HashMap<Role, String>,
}

impl ProbeClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            tokens: HashMap::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn login(&mut self, role: Role) -> ProbeResult<String> {
        let creds = self
            .credentials
            .get(role.as_str())
            .ok_or(ProbeError::MissingCredentials(role))?;

        let response = self
            .http
            .post(self.url("auth/login"))
            .json(&json!({ "email": creds.email, "password": creds.password }))
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProbeError::LoginRejected {
                role,
                status: status.as_u16(),
            });
        }

        let body = read_json(response)?;
        let token = body
            .pointer("/data/token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or(ProbeError::MissingToken(role))?
            .to_string();

        debug!(%role, "logged in");
        self.tokens.insert(role, token.clone());
        Ok(token)
    }

    fn token(&mut self, role: Role) -> ProbeResult<String> {
        match self.tokens.get(&role) {
            Some(token) => Ok(token.clone()),
            None => self.login(role),
        }
    }

    /// P1-01: every role can log in.
    pub fn probe_login(&mut self) -> TestResult {
        let mut outcomes = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let ok = match self.login(role) {
                Ok(_) => true,
                Err(err) => {
                    warn!(%role, error = %err, "login failed");
                    false
                }
            };
            outcomes.push((role, ok));
        }

        let notes = outcomes
            .iter()
            .map(|(role, ok)| format!("{}:{}", role.label(), ok))
            .collect::<Vec<_>>()
            .join(", ");
        let passed = outcomes.iter().all(|(_, ok)| *ok);
        TestResult::new("P1-01", TestStatus::from_bool(passed), notes)
    }

    /// P1-02: a worker can create an incident.
    pub fn probe_create_incident(&mut self) -> TestResult {
        settle("P1-02", self.create_incident())
    }

    fn create_incident(&mut self) -> ProbeResult<TestResult> {
        let token = self.token(Role::Worker)?;
        let payload = json!({
            "title": format!("UAT-{}", chrono::Utc::now().timestamp()),
            "description": "Test",
            "severity": "medium",
            "incident_type_id": 1,
            "site_id": null,
        });
        let response = self
            .http
            .post(self.url("incidents"))
            .bearer_auth(token)
            .json(&payload)
            .send()?;

        let status = response.status().as_u16();
        let created = matches!(status, 200 | 201);
        Ok(TestResult::new(
            "P1-02",
            TestStatus::from_bool(created),
            format!("Status: {status}"),
        ))
    }

    /// P1-03: a manager can close the most recent incident.
    pub fn probe_update_status(&mut self) -> TestResult {
        settle("P1-03", self.update_status())
    }

    fn update_status(&mut self) -> ProbeResult<TestResult> {
        let token = self.token(Role::Manager)?;
        let response = self
            .http
            .get(self.url("incidents"))
            .query(&[("limit", "1")])
            .bearer_auth(&token)
            .send()?;

        if response.status() != StatusCode::OK {
            return Ok(TestResult::fail("P1-03", "No incidents"));
        }
        let body = read_json(response)?;
        let items = match body.get("data") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(ProbeError::Shape("`data` is not an array")),
        };
        let Some(first) = items.first() else {
            return Ok(TestResult::fail("P1-03", "No incidents"));
        };

        let incident_id = match first.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(ProbeError::Shape("incident has no `id`")),
        };

        let update = self
            .http
            .put(self.url(&format!("incidents/{incident_id}")))
            .bearer_auth(&token)
            .json(&json!({ "status": "closed" }))
            .send()?;

        let status = update.status().as_u16();
        Ok(TestResult::new(
            "P1-03",
            TestStatus::from_bool(matches!(status, 200 | 204)),
            format!("Update status: {status}"),
        ))
    }

    /// P1-04: the dashboard summary returns data.
    pub fn probe_dashboard(&mut self) -> TestResult {
        settle("P1-04", self.dashboard())
    }

    fn dashboard(&mut self) -> ProbeResult<TestResult> {
        let token = self.token(Role::Manager)?;
        let response = self
            .http
            .get(self.url("dashboard/summary"))
            .bearer_auth(token)
            .send()?;

        let status = response.status().as_u16();
        let has_data = status == 200 && read_json(response)?.get("data").is_some();
        Ok(TestResult::new(
            "P1-04",
            TestStatus::from_bool(has_data),
            format!("Status: {status}"),
        ))
    }

    /// Runs P1-01 through P1-04 in order.
    pub fn run_all(&mut self) -> ResultSet {
        let mut results = ResultSet::new();

        println!("Testing P1-01: Login...");
        results.insert(self.probe_login());
        println!("Testing P1-02: Create Incident...");
        results.insert(self.probe_create_incident());
        println!("Testing P1-03: Update Status...");
        results.insert(self.probe_update_status());
        println!("Testing P1-04: Dashboard...");
        results.insert(self.probe_dashboard());

        results
    }
}

#[derive(Debug, Parser)]
#[command(name = "uat-probe")]
#[command(about = "Run the API smoke tests and record the outcomes into the UAT workbooks")]
struct ProbeCli {
    /// Configuration file (defaults to ./uat.toml, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override api.base_url from the configuration
    #[arg(long)]
    base_url: Option<String>,
    /// Print the results without touching any workbook
    #[arg(long)]
    no_record: bool,
}

pub fn run(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<()> {
    let cli = ProbeCli::parse_from(args);
    let mut config = UatConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api = config.api.with_base_url(base_url);
    }

    info!(base_url = %config.api.base_url, "starting probes");
    let mut client = ProbeClient::new(&config.api)?;
    let results = client.run_all();

    println!("\nResults:");
    for result in results.iter() {
        println!("{result}");
    }

    if cli.no_record {
        return Ok(());
    }

    println!("\nUpdating Excel files...");
    writer::record_all(&config.targets, &results)?;
    println!("\nDone!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn client_for(server: &Server) -> ProbeClient {
        let config = ApiConfig::default().with_base_url(format!("{}/api", server.url()));
        ProbeClient::new(&config).unwrap()
    }

    fn mock_login(server: &mut Server, email: &str, token: &str) -> mockito::Mock {
        server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::PartialJson(json!({ "email": email })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": { "token": token } }).to_string())
            .create()
    }

    #[test]
    fn login_probe_passes_when_all_roles_succeed() {
        let mut server = Server::new();
        let _admin = mock_login(&mut server, "admin@ehs.local", "a");
        let _manager = mock_login(&mut server, "manager@ehs.local", "m");
        let _worker = mock_login(&mut server, "worker@ehs.local", "w");

        let result = client_for(&server).probe_login();
        assert_eq!(result.status, TestStatus::Pass);
        assert_eq!(result.notes, "Admin:true, Manager:true, Worker:true");
    }

    #[test]
    fn login_probe_reports_each_role() {
        let mut server = Server::new();
        let _admin = mock_login(&mut server, "admin@ehs.local", "a");
        let _manager = mock_login(&mut server, "manager@ehs.local", "m");
        let _worker = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::PartialJson(json!({ "email": "worker@ehs.local" })))
            .with_status(401)
            .create();

        let result = client_for(&server).probe_login();
        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.notes, "Admin:true, Manager:true, Worker:false");
    }

    #[test]
    fn login_without_token_is_a_failure() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"data":{}}"#)
            .create();

        let mut client = client_for(&server);
        let err = client.login(Role::Admin).unwrap_err();
        assert!(matches!(err, ProbeError::MissingToken(Role::Admin)));
    }

    #[test]
    fn create_incident_uses_worker_token() {
        let mut server = Server::new();
        let login = mock_login(&mut server, "worker@ehs.local", "w-token");
        let create = server
            .mock("POST", "/api/incidents")
            .match_header("authorization", "Bearer w-token")
            .match_body(Matcher::PartialJson(
                json!({ "severity": "medium", "incident_type_id": 1 }),
            ))
            .with_status(201)
            .create();

        let result = client_for(&server).probe_create_incident();
        assert_eq!(result, TestResult::pass("P1-02", "Status: 201"));
        login.assert();
        create.assert();
    }

    #[test]
    fn cached_token_is_reused() {
        let mut server = Server::new();
        let login = server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"data":{"token":"m-token"}}"#)
            .expect(1)
            .create();
        let _summary = server
            .mock("GET", "/api/dashboard/summary")
            .match_header("authorization", "Bearer m-token")
            .with_status(200)
            .with_body(r#"{"data":{"open":3}}"#)
            .expect(2)
            .create();

        let mut client = client_for(&server);
        assert_eq!(client.probe_dashboard().status, TestStatus::Pass);
        assert_eq!(client.probe_dashboard().status, TestStatus::Pass);
        login.assert();
    }

    #[test]
    fn update_status_closes_first_incident() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _list = server
            .mock("GET", "/api/incidents")
            .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"data":[{"id":42,"status":"open"}]}"#)
            .create();
        let update = server
            .mock("PUT", "/api/incidents/42")
            .match_body(Matcher::Json(json!({ "status": "closed" })))
            .with_status(204)
            .create();

        let result = client_for(&server).probe_update_status();
        assert_eq!(result, TestResult::pass("P1-03", "Update status: 204"));
        update.assert();
    }

    #[test]
    fn update_status_without_incidents_fails() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _list = server
            .mock("GET", "/api/incidents")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create();

        let result = client_for(&server).probe_update_status();
        assert_eq!(result, TestResult::fail("P1-03", "No incidents"));
    }

    #[test]
    fn incident_list_that_is_not_an_array_fails_with_shape() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _list = server
            .mock("GET", "/api/incidents")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":{"id":7}}"#)
            .create();

        let result = client_for(&server).probe_update_status();
        assert_eq!(
            result,
            TestResult::fail("P1-03", "unexpected response shape: `data` is not an array")
        );
    }

    #[test]
    fn incident_without_id_fails_with_shape() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _list = server
            .mock("GET", "/api/incidents")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"status":"open"}]}"#)
            .create();
        let update = server.mock("PUT", Matcher::Any).expect(0).create();

        let result = client_for(&server).probe_update_status();
        assert_eq!(
            result,
            TestResult::fail("P1-03", "unexpected response shape: incident has no `id`")
        );
        update.assert();
    }

    #[test]
    fn dashboard_without_data_field_fails() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _summary = server
            .mock("GET", "/api/dashboard/summary")
            .with_status(200)
            .with_body(r#"{"error":"none"}"#)
            .create();

        let result = client_for(&server).probe_dashboard();
        assert_eq!(result, TestResult::fail("P1-04", "Status: 200"));
    }

    #[test]
    fn malformed_body_becomes_failure_with_message() {
        let mut server = Server::new();
        let _login = mock_login(&mut server, "manager@ehs.local", "m");
        let _summary = server
            .mock("GET", "/api/dashboard/summary")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create();

        let result = client_for(&server).probe_dashboard();
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.notes.starts_with("invalid JSON body"));
    }

    #[test]
    fn unreachable_api_fails_every_probe() {
        let config = ApiConfig {
            timeout_secs: 1,
            ..ApiConfig::default()
        }
        .with_base_url("http://127.0.0.1:1/api");
        let mut client = ProbeClient::new(&config).unwrap();

        let results = client.run_all();
        assert_eq!(results.len(), 4);
        for result in results.iter() {
            assert_eq!(result.status, TestStatus::Fail, "{result}");
            assert!(!result.notes.is_empty());
        }
        assert_eq!(
            results.get("P1-01").unwrap().notes,
            "Admin:false, Manager:false, Worker:false"
        );
    }
}

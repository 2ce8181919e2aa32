#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lgr_core::credentials::Credentials;
use lgr_core::job::{JobConfig, ScriptBody};
use lgr_core::manifest::OutputFileRecord;
use lgr_provisioning::{CredentialProvider, ProvisioningError};
use lgr_runner::config::RunnerConfig;
use lgr_runner::error::RunError;
use lgr_runner::warehouse::{OutputCatalog, Warehouse};
use serde_json::json;

pub const PASSWORD: &str = "s3cr3t pass";

/// Write an executable bash script that stands in for `Rscript`.
pub fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("Rscript");
    std::fs::write(&path, format!("#!/bin/bash\n{body}")).expect("write fake interpreter");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

/// Build a config from explicit variables only.
pub fn test_config(vars: &[(&str, String)]) -> RunnerConfig {
    let mut map: HashMap<String, String> = HashMap::new();
    map.insert("EVENTS_ENABLED".into(), "false".into());
    for (key, value) in vars {
        map.insert(key.to_string(), value.clone());
    }
    RunnerConfig::from_lookup(|key| map.get(key).cloned()).expect("test config")
}

pub fn credentials() -> Credentials {
    Credentials {
        hostname: "warehouse.example".into(),
        port: 5439,
        db: "sapi_1".into(),
        schema: "tx_1".into(),
        user: "tx_user".into(),
        password: PASSWORD.into(),
    }
}

pub fn job(debug: bool) -> JobConfig {
    JobConfig {
        script: ScriptBody::Lines(vec!["library(stats)".into(), "run()".into()]),
        source_table: "in.c-main.sales".into(),
        script_parameters: json!({"horizon": 12}),
        file_tags: vec![" weekly ".into()],
        debug,
        token: "tok".into(),
        run_id: "run-1".into(),
    }
}

pub fn record(name: &str, value: &str) -> OutputFileRecord {
    OutputFileRecord {
        name: name.into(),
        value: value.into(),
    }
}

/// Credential provider that counts lookups.
pub struct StaticProvider {
    result: Option<Credentials>,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            result: Some(credentials),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose response carries no credentials.
    pub fn empty() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for StaticProvider {
    async fn credentials(&self, _resource_class: &str) -> Result<Credentials, ProvisioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(ProvisioningError::MissingCredentials)
    }
}

/// In-memory stand-in for the warehouse's `r__file_names` table.
#[derive(Default)]
pub struct MemoryWarehouse {
    records: Vec<OutputFileRecord>,
    pub recorded_ids: Arc<Mutex<Vec<(String, i64)>>>,
    pub opens: AtomicUsize,
}

impl MemoryWarehouse {
    pub fn with_records(records: Vec<OutputFileRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn open(&self, _credentials: &Credentials) -> Result<Box<dyn OutputCatalog>, RunError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCatalog {
            records: self.records.clone(),
            recorded_ids: Arc::clone(&self.recorded_ids),
        }))
    }
}

struct MemoryCatalog {
    records: Vec<OutputFileRecord>,
    recorded_ids: Arc<Mutex<Vec<(String, i64)>>>,
}

#[async_trait]
impl OutputCatalog for MemoryCatalog {
    async fn output_files(&self) -> Result<Vec<OutputFileRecord>, RunError> {
        Ok(self.records.clone())
    }

    async fn record_file_id(&self, record: &OutputFileRecord, file_id: i64) -> Result<(), RunError> {
        self.recorded_ids
            .lock()
            .expect("lock")
            .push((record.name.clone(), file_id));
        Ok(())
    }
}

/// Run directories left below `root`.
pub fn run_dirs(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .expect("read work root")
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("run-"))
        })
        .collect()
}

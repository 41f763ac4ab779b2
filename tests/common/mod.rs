//! Common test utilities for integration tests
//!
//! Provides rustls setup for the Pact tests and scripted fakes for the
//! zone probe and template catalog used by the control loop scenarios.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use az_failover_controller::catalog::types::NodeTemplateList;
use az_failover_controller::catalog::{NodeTemplate, TemplateCatalog};
use az_failover_controller::error::{FetchError, ProbeError, UpdateError};
use az_failover_controller::provider::ZoneStateProbe;
use az_failover_controller::zone::{ZoneId, ZoneState};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, Once};
use tokio::time::Instant;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // We use ring as the crypto provider (matches main application)
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Zone probe answering from a per-zone script
///
/// Each probe consumes the next answer for that zone; the last answer
/// repeats forever. `None` answers are probe errors.
#[derive(Default)]
pub struct ScriptedProbe {
    script: Mutex<HashMap<String, VecDeque<Option<ZoneState>>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedProbe {
    pub fn answer(self, zone: &str, answers: &[Option<ZoneState>]) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(zone.to_string(), answers.iter().copied().collect());
        self
    }

    /// Replace the script of `zone` while a test is running
    pub fn set(&self, zone: &str, answers: &[Option<ZoneState>]) {
        self.script
            .lock()
            .unwrap()
            .insert(zone.to_string(), answers.iter().copied().collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(zone, _)| zone.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl ZoneStateProbe for ScriptedProbe {
    async fn probe(&self, zone: &ZoneId) -> Result<ZoneState, ProbeError> {
        self.calls
            .lock()
            .unwrap()
            .push((zone.to_string(), Instant::now()));
        let mut script = self.script.lock().unwrap();
        let queue = script.entry(zone.to_string()).or_default();
        let answer = if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().copied().flatten()
        };
        answer.ok_or_else(|| ProbeError::Query {
            zone: zone.clone(),
            region: zone.region().to_string(),
            message: "scripted failure".to_string(),
        })
    }
}

/// In-memory template catalog recording every update
#[derive(Default)]
pub struct RecordingCatalog {
    templates: Mutex<Vec<NodeTemplate>>,
    fail_updates: Mutex<HashSet<String>>,
    updates: Mutex<Vec<(String, NodeTemplate)>>,
}

impl RecordingCatalog {
    /// Seed from a CAST AI listing payload
    pub fn from_listing(listing: serde_json::Value) -> Self {
        let list: NodeTemplateList = serde_json::from_value(listing).unwrap();
        Self {
            templates: Mutex::new(list.into_templates()),
            ..Self::default()
        }
    }

    pub fn fail_updates_for(&self, name: &str) {
        self.fail_updates.lock().unwrap().insert(name.to_string());
    }

    pub fn template(&self, name: &str) -> NodeTemplate {
        self.templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .unwrap()
    }

    pub fn azs_of(&self, name: &str) -> Vec<String> {
        self.template(name).azs().to_vec()
    }

    pub fn updates(&self) -> Vec<(String, NodeTemplate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updated_names(&self) -> Vec<String> {
        self.updates().into_iter().map(|(name, _)| name).collect()
    }
}

#[async_trait]
impl TemplateCatalog for RecordingCatalog {
    async fn list_templates(&self, _cluster_id: &str) -> Result<Vec<NodeTemplate>, FetchError> {
        Ok(self.templates.lock().unwrap().clone())
    }

    async fn update_template(
        &self,
        _cluster_id: &str,
        template_name: &str,
        template: &NodeTemplate,
    ) -> Result<NodeTemplate, UpdateError> {
        self.updates
            .lock()
            .unwrap()
            .push((template_name.to_string(), template.clone()));
        if self.fail_updates.lock().unwrap().contains(template_name) {
            return Err(UpdateError::Status {
                template: template_name.to_string(),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        let mut templates = self.templates.lock().unwrap();
        if let Some(existing) = templates.iter_mut().find(|t| t.name == template_name) {
            *existing = template.clone();
        }
        Ok(template.clone())
    }
}

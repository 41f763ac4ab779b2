//! # Reconciler
//!
//! Pins selected node templates to the active availability zone.
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch every node template of the cluster
//! 2. Drop templates whose name is not in the selector (never compared, never mutated)
//! 3. For each selected template, in fetch order:
//!    - **Unchanged**: AZ list already equals the target, no call is made
//!    - **Update**: replace only `constraints.azs` and submit the template
//! 4. After each successful update, wait the inter-update delay before the
//!    next selected template
//!
//! A failed fetch skips the pass. A failed update is logged and the next
//! template is still attempted. Neither is fatal: the next cycle retries.

use crate::catalog::{NodeTemplate, TemplateCatalog};
use crate::config::TemplateSelector;
use crate::controller::shutdown::Shutdown;
use crate::observability::metrics;
use crate::zone::ActiveZoneSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Why a pass issued no updates at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Listing the cluster's templates failed
    FetchFailed,
    /// The cluster has no templates
    NoTemplates,
    /// No zone is available and clearing is not enabled
    NoActiveZone,
}

/// What happened to one selected template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutcome {
    Updated,
    Unchanged,
    /// Dry run: the update that would have been submitted
    Planned,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResult {
    pub name: String,
    pub previous_azs: Vec<String>,
    pub outcome: TemplateOutcome,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub target: ActiveZoneSet,
    pub skipped: Option<SkipReason>,
    /// Selected templates in fetch order
    pub results: Vec<TemplateResult>,
    /// Fetched templates outside the selector
    pub ignored: usize,
    /// Shutdown cut the pass short
    pub interrupted: bool,
}

impl ReconciliationReport {
    fn skipped(target: &ActiveZoneSet, reason: SkipReason) -> Self {
        Self {
            target: target.clone(),
            skipped: Some(reason),
            results: Vec::new(),
            ignored: 0,
            interrupted: false,
        }
    }

    fn count(&self, pred: impl Fn(&TemplateOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, TemplateOutcome::Updated))
    }

    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, TemplateOutcome::Unchanged))
    }

    #[must_use]
    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, TemplateOutcome::Planned))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TemplateOutcome::Failed(_)))
    }
}

pub struct ReconciliationEngine {
    catalog: Arc<dyn TemplateCatalog>,
    update_delay: Duration,
    dry_run: bool,
    clear_on_empty: bool,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("update_delay", &self.update_delay)
            .field("dry_run", &self.dry_run)
            .field("clear_on_empty", &self.clear_on_empty)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(catalog: Arc<dyn TemplateCatalog>, update_delay: Duration) -> Self {
        Self {
            catalog,
            update_delay,
            dry_run: false,
            clear_on_empty: false,
        }
    }

    /// Log planned updates instead of submitting them
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write an empty AZ list when no zone is available
    #[must_use]
    pub fn with_clear_on_empty(mut self, clear_on_empty: bool) -> Self {
        self.clear_on_empty = clear_on_empty;
        self
    }

    /// Run one reconciliation pass for `cluster_id` against `target`
    pub async fn reconcile(
        &self,
        cluster_id: &str,
        selector: &TemplateSelector,
        target: &ActiveZoneSet,
        shutdown: &mut Shutdown,
    ) -> ReconciliationReport {
        let span = info_span!("reconcile", cluster.id = cluster_id, active_zone = %target);
        let start = Instant::now();
        let report = self
            .reconcile_inner(cluster_id, selector, target, shutdown)
            .instrument(span)
            .await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        report
    }

    async fn reconcile_inner(
        &self,
        cluster_id: &str,
        selector: &TemplateSelector,
        target: &ActiveZoneSet,
        shutdown: &mut Shutdown,
    ) -> ReconciliationReport {
        if target.is_empty() && !self.clear_on_empty {
            warn!("No available zone; leaving node templates untouched");
            return ReconciliationReport::skipped(target, SkipReason::NoActiveZone);
        }

        let templates = match self.catalog.list_templates(cluster_id).await {
            Ok(templates) => templates,
            Err(e) => {
                error!("Failed to fetch node templates: {}", e);
                metrics::increment_template_fetch_errors();
                return ReconciliationReport::skipped(target, SkipReason::FetchFailed);
            }
        };

        if templates.is_empty() {
            info!("No node templates found for cluster ID {}", cluster_id);
            return ReconciliationReport::skipped(target, SkipReason::NoTemplates);
        }

        let total = templates.len();
        let selected: Vec<NodeTemplate> = templates
            .into_iter()
            .filter(|t| selector.contains(&t.name))
            .collect();
        let ignored = total - selected.len();
        debug!(
            "{} of {} node templates selected ({} ignored)",
            selected.len(),
            total,
            ignored
        );

        let mut report = ReconciliationReport {
            target: target.clone(),
            skipped: None,
            results: Vec::with_capacity(selected.len()),
            ignored,
            interrupted: false,
        };

        let desired = target.to_az_list();
        let last = selected.len().saturating_sub(1);
        for (idx, template) in selected.iter().enumerate() {
            let previous_azs = template.azs().to_vec();

            if target.is_satisfied_by(&previous_azs) {
                info!(
                    "No update needed for node template '{}', already set to {}",
                    template.name, target
                );
                metrics::increment_templates_unchanged();
                report.results.push(TemplateResult {
                    name: template.name.clone(),
                    previous_azs,
                    outcome: TemplateOutcome::Unchanged,
                });
                continue;
            }

            let updated = template.with_azs(desired.clone());
            if self.dry_run {
                info!(
                    "[dry-run] Would update node template '{}' AZs from {:?} to {:?}",
                    template.name, previous_azs, desired
                );
                report.results.push(TemplateResult {
                    name: template.name.clone(),
                    previous_azs,
                    outcome: TemplateOutcome::Planned,
                });
                continue;
            }

            info!(
                "Updating node template '{}' AZs from {:?} to {:?}",
                template.name, previous_azs, desired
            );
            match self
                .catalog
                .update_template(cluster_id, &template.name, &updated)
                .await
            {
                Ok(_) => {
                    metrics::increment_template_updates();
                    report.results.push(TemplateResult {
                        name: template.name.clone(),
                        previous_azs,
                        outcome: TemplateOutcome::Updated,
                    });

                    if idx < last && !shutdown.sleep(self.update_delay).await {
                        info!("Shutdown requested, stopping reconciliation early");
                        report.interrupted = true;
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to update node template '{}': {}", template.name, e);
                    metrics::increment_template_update_errors();
                    report.results.push(TemplateResult {
                        name: template.name.clone(),
                        previous_azs,
                        outcome: TemplateOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        info!(
            "Reconciliation finished: {} updated, {} unchanged, {} failed, {} planned",
            report.updated(),
            report.unchanged(),
            report.failed(),
            report.planned()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::NodeTemplateList;
    use crate::error::{FetchError, UpdateError};
    use crate::zone::ZoneId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory catalog that applies updates so later listings see them
    #[derive(Default)]
    struct FakeCatalog {
        templates: Mutex<Vec<NodeTemplate>>,
        fail_list: bool,
        fail_updates: HashSet<String>,
        lists: AtomicUsize,
        puts: Mutex<Vec<(String, NodeTemplate, tokio::time::Instant)>>,
    }

    impl FakeCatalog {
        fn with(templates: serde_json::Value) -> Self {
            let list: NodeTemplateList = serde_json::from_value(templates).unwrap();
            Self {
                templates: Mutex::new(list.into_templates()),
                ..Self::default()
            }
        }

        fn put_names(&self) -> Vec<String> {
            self.puts
                .lock()
                .unwrap()
                .iter()
                .map(|(n, _, _)| n.clone())
                .collect()
        }
    }

    #[async_trait]
    impl TemplateCatalog for FakeCatalog {
        async fn list_templates(&self, cluster_id: &str) -> Result<Vec<NodeTemplate>, FetchError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail_list {
                return Err(FetchError::Status {
                    cluster_id: cluster_id.to_string(),
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(self.templates.lock().unwrap().clone())
        }

        async fn update_template(
            &self,
            _cluster_id: &str,
            template_name: &str,
            template: &NodeTemplate,
        ) -> Result<NodeTemplate, UpdateError> {
            self.puts.lock().unwrap().push((
                template_name.to_string(),
                template.clone(),
                tokio::time::Instant::now(),
            ));
            if self.fail_updates.contains(template_name) {
                return Err(UpdateError::Status {
                    template: template_name.to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let mut templates = self.templates.lock().unwrap();
            if let Some(existing) = templates.iter_mut().find(|t| t.name == template_name) {
                *existing = template.clone();
            }
            Ok(template.clone())
        }
    }

    fn pools() -> serde_json::Value {
        json!({"items": [
            {"template": {"name": "gpu-pool", "constraints": {"azs": ["us-east-1a"], "spot": true}}},
            {"template": {"name": "cpu-pool", "constraints": {"azs": ["us-east-1a"]}}},
            {"template": {"name": "other", "constraints": {"azs": ["us-east-1a"]}}}
        ]})
    }

    fn selector() -> TemplateSelector {
        TemplateSelector::new(["gpu-pool", "cpu-pool"])
    }

    fn target(zone: &str) -> ActiveZoneSet {
        ActiveZoneSet::single(ZoneId::new(zone))
    }

    fn engine(catalog: &Arc<FakeCatalog>) -> ReconciliationEngine {
        ReconciliationEngine::new(Arc::clone(catalog), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_selected_templates_move_to_active_zone() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(report.skipped, None);
        assert_eq!(report.updated(), 2);
        assert_eq!(report.ignored, 1);
        assert_eq!(catalog.put_names(), vec!["gpu-pool", "cpu-pool"]);

        let puts = catalog.puts.lock().unwrap();
        for (_, body, _) in puts.iter() {
            assert_eq!(body.azs(), ["us-east-1b".to_string()]);
        }
        // Second update waits out the inter-update delay
        assert!(puts[1].2 - puts[0].2 >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_last_update() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (_trigger, mut shutdown) = Shutdown::channel();
        let start = tokio::time::Instant::now();

        engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_pinned_template_is_left_alone() {
        let catalog = Arc::new(FakeCatalog::with(json!({"items": [
            {"template": {"name": "gpu-pool", "constraints": {"azs": ["us-east-1b"]}}}
        ]})));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile(
                "c-1",
                &TemplateSelector::new(["gpu-pool"]),
                &target("us-east-1b"),
                &mut shutdown,
            )
            .await;

        assert_eq!(report.unchanged(), 1);
        assert!(catalog.put_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_pass_is_a_no_op() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let engine = engine(&catalog);
        let (_trigger, mut shutdown) = Shutdown::channel();

        engine
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;
        let puts_after_first = catalog.put_names().len();

        let second = engine
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(second.updated(), 0);
        assert_eq!(second.unchanged(), 2);
        assert_eq!(catalog.put_names().len(), puts_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unselected_templates_are_never_touched() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert!(report.results.iter().all(|r| r.name != "other"));
        assert!(!catalog.put_names().contains(&"other".to_string()));
        let other = catalog
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == "other")
            .cloned()
            .unwrap();
        assert_eq!(other.azs(), ["us-east-1a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superset_list_is_narrowed() {
        let catalog = Arc::new(FakeCatalog::with(json!({"items": [
            {"template": {"name": "gpu-pool", "constraints": {"azs": ["us-east-1b", "us-east-1a"]}}}
        ]})));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile(
                "c-1",
                &TemplateSelector::new(["gpu-pool"]),
                &target("us-east-1b"),
                &mut shutdown,
            )
            .await;

        assert_eq!(report.updated(), 1);
        assert_eq!(
            report.results[0].previous_azs,
            vec!["us-east-1b".to_string(), "us-east-1a".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_preserves_other_fields() {
        let catalog = Arc::new(FakeCatalog::with(json!({"items": [
            {"template": {
                "name": "gpu-pool",
                "configurationId": "cfg-1",
                "shouldTaint": true,
                "constraints": {"azs": ["us-east-1a"], "spot": true, "minCpu": 4}
            }}
        ]})));
        let original = catalog.templates.lock().unwrap()[0].clone();
        let (_trigger, mut shutdown) = Shutdown::channel();

        engine(&catalog)
            .reconcile(
                "c-1",
                &TemplateSelector::new(["gpu-pool"]),
                &target("us-east-1b"),
                &mut shutdown,
            )
            .await;

        let sent = catalog.puts.lock().unwrap()[0].1.clone();
        assert_eq!(sent.name, original.name);
        assert_eq!(sent.other, original.other);
        assert_eq!(sent.constraints.other, original.constraints.other);
        assert_eq!(sent.azs(), ["us-east-1b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_update_does_not_stop_the_pass() {
        let mut fake = FakeCatalog::with(pools());
        fake.fail_updates.insert("gpu-pool".to_string());
        let catalog = Arc::new(fake);
        let (_trigger, mut shutdown) = Shutdown::channel();
        let start = tokio::time::Instant::now();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(catalog.put_names(), vec!["gpu-pool", "cpu-pool"]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.updated(), 1);
        assert!(matches!(
            report.results[0].outcome,
            TemplateOutcome::Failed(_)
        ));
        // No delay follows a failure, none follows the last template
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_skips_pass() {
        let catalog = Arc::new(FakeCatalog {
            fail_list: true,
            ..FakeCatalog::default()
        });
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(report.skipped, Some(SkipReason::FetchFailed));
        assert!(catalog.put_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_catalog_skips_pass() {
        let catalog = Arc::new(FakeCatalog::with(json!({"items": null})));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(report.skipped, Some(SkipReason::NoTemplates));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_target_is_skipped_by_default() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &ActiveZoneSet::empty(), &mut shutdown)
            .await;

        assert_eq!(report.skipped, Some(SkipReason::NoActiveZone));
        assert_eq!(catalog.lists.load(Ordering::SeqCst), 0);
        assert!(catalog.put_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_target_clears_when_enabled() {
        let catalog = Arc::new(FakeCatalog::with(json!({"items": [
            {"template": {"name": "gpu-pool", "constraints": {"azs": ["us-east-1a"]}}},
            {"template": {"name": "cpu-pool", "constraints": {"azs": []}}}
        ]})));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .with_clear_on_empty(true)
            .reconcile("c-1", &selector(), &ActiveZoneSet::empty(), &mut shutdown)
            .await;

        assert_eq!(report.updated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(catalog.put_names(), vec!["gpu-pool"]);
        assert!(catalog.puts.lock().unwrap()[0].1.azs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_never_submits() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (_trigger, mut shutdown) = Shutdown::channel();

        let report = engine(&catalog)
            .with_dry_run(true)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert_eq!(report.planned(), 2);
        assert!(catalog.put_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_delay_interrupts_pass() {
        let catalog = Arc::new(FakeCatalog::with(pools()));
        let (trigger, mut shutdown) = Shutdown::channel();
        trigger.trigger();

        let report = engine(&catalog)
            .reconcile("c-1", &selector(), &target("us-east-1b"), &mut shutdown)
            .await;

        assert!(report.interrupted);
        assert_eq!(catalog.put_names(), vec!["gpu-pool"]);
    }
}

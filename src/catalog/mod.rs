//! # Template Catalog
//!
//! Access to the node templates of a cluster in the orchestration service.

use crate::error::{FetchError, UpdateError};
use async_trait::async_trait;

pub mod rest;
pub mod types;

pub use rest::CastAiCatalog;
pub use types::{NodeTemplate, TemplateConstraints};

/// List and update node templates of a cluster
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Fetch every node template of the cluster, in service order
    async fn list_templates(&self, cluster_id: &str) -> Result<Vec<NodeTemplate>, FetchError>;

    /// Replace a node template with `template`
    ///
    /// The body is sent as-is; callers are responsible for only changing the
    /// fields they own.
    async fn update_template(
        &self,
        cluster_id: &str,
        template_name: &str,
        template: &NodeTemplate,
    ) -> Result<NodeTemplate, UpdateError>;
}

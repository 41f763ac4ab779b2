//! # Node Template Types
//!
//! CAST AI node template payloads.
//!
//! Only the fields the controller reads are typed. Everything else is kept in
//! flattened maps and written back verbatim, so an update never drops or
//! rewrites constraint fields it does not own.
//!
//! API Reference: <https://api.cast.ai/v1/spec/#/NodeTemplatesAPI>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /v1/kubernetes/clusters/{clusterId}/node-templates`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeTemplateList {
    /// A missing or `null` collection means the cluster has no templates
    #[serde(default)]
    pub items: Option<Vec<NodeTemplateItem>>,
}

impl NodeTemplateList {
    #[must_use]
    pub fn into_templates(self) -> Vec<NodeTemplate> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.template)
            .collect()
    }
}

/// One entry of the listing; the template plus listing-only metadata
#[derive(Debug, Clone, Deserialize)]
pub struct NodeTemplateItem {
    pub template: NodeTemplate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Node template body, as accepted by `PUT .../node-templates/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub name: String,
    #[serde(default)]
    pub constraints: TemplateConstraints,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Placement constraints of a node template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azs: Option<Vec<String>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl NodeTemplate {
    /// Current AZ constraint list; absent and `null` both read as empty
    #[must_use]
    pub fn azs(&self) -> &[String] {
        self.constraints.azs.as_deref().unwrap_or_default()
    }

    /// Copy of this template with only the AZ constraint replaced
    #[must_use]
    pub fn with_azs(&self, azs: Vec<String>) -> Self {
        let mut updated = self.clone();
        updated.constraints.azs = Some(azs);
        updated
    }
}

//! Template rendering context for a dry run

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::module::{ChartMetadata, Module};
use crate::values::Values;

/// API version added on top of the baseline so templates guarded by a
/// VerticalPodAutoscaler capability check render in a dry run
pub const VPA_API_VERSION: &str = "autoscaling.k8s.io/v1/VerticalPodAutoscaler";

/// Release service reported to templates
pub const RELEASE_SERVICE: &str = "Helm";

const BASELINE_API_VERSIONS: &[&str] = &[
    "v1",
    "admissionregistration.k8s.io/v1",
    "apiextensions.k8s.io/v1",
    "apiregistration.k8s.io/v1",
    "apps/v1",
    "authentication.k8s.io/v1",
    "authorization.k8s.io/v1",
    "autoscaling/v1",
    "autoscaling/v2",
    "batch/v1",
    "certificates.k8s.io/v1",
    "coordination.k8s.io/v1",
    "discovery.k8s.io/v1",
    "events.k8s.io/v1",
    "flowcontrol.apiserver.k8s.io/v1beta3",
    "networking.k8s.io/v1",
    "node.k8s.io/v1",
    "policy/v1",
    "rbac.authorization.k8s.io/v1",
    "scheduling.k8s.io/v1",
    "storage.k8s.io/v1",
];

/// The context handed to the template engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderContext {
    pub chart: ChartMetadata,
    pub capabilities: Capabilities,
    pub release: ReleaseInfo,
    pub values: Values,
}

impl RenderContext {
    /// Bundle module identity and generated values
    pub fn assemble(module: &Module, values: Values) -> Self {
        Self {
            chart: module.chart.clone(),
            capabilities: Capabilities::for_dry_run(),
            release: ReleaseInfo::for_dry_run(&module.name, &module.namespace),
            values,
        }
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Cluster capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Capabilities {
    pub kube_version: KubeVersion,

    #[serde(rename = "APIVersions")]
    pub api_versions: Vec<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            kube_version: KubeVersion::default(),
            api_versions: BASELINE_API_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Capabilities {
    /// Baseline capabilities plus [`VPA_API_VERSION`]
    pub fn for_dry_run() -> Self {
        Self::default().with_api_version(VPA_API_VERSION)
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_versions.push(version.into());
        self
    }

    pub fn has(&self, version: &str) -> bool {
        self.api_versions.iter().any(|v| v == version)
    }
}

/// Kubernetes version info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KubeVersion {
    pub version: String,
    pub major: String,
    pub minor: String,
}

impl Default for KubeVersion {
    fn default() -> Self {
        Self {
            version: "v1.28.0".to_string(),
            major: "1".to_string(),
            minor: "28".to_string(),
        }
    }
}

/// Release information for templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    pub is_upgrade: bool,
    pub is_install: bool,
    pub revision: u32,
    pub service: String,
}

impl ReleaseInfo {
    /// A release that is both an install and an upgrade, at revision 0
    pub fn for_dry_run(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            is_upgrade: true,
            is_install: true,
            revision: 0,
            service: RELEASE_SERVICE.to_string(),
        }
    }
}

//! Advisor panel definitions and loading.
//!
//! Panels are defined in YAML: the set of advisors to consult, their
//! backends and timeouts, the detection thresholds, and optionally the
//! synthesis endpoint.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{
    Advisor, HttpAdvisor, HttpSynthesizer, StaticAdvisor, SubprocessAdvisor, Synthesizer,
};

use super::conflict::DetectionThresholds;

/// A complete panel definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Panel name (used in the CLI)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Detection thresholds for this panel
    #[serde(default)]
    pub thresholds: DetectionThresholds,

    /// Default per-advisor timeout in seconds
    #[serde(default = "default_advisor_timeout")]
    pub advisor_timeout_seconds: u64,

    /// Synthesis call timeout in seconds
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_seconds: u64,

    /// Confidence assigned to advisors whose backend reports none
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,

    /// Advisors to consult, in panel order
    pub advisors: Vec<AdvisorSpec>,

    /// Synthesis capability; absent means fallback-only decisions
    #[serde(default)]
    pub synthesis: Option<SynthesisSpec>,
}

fn default_advisor_timeout() -> u64 {
    30
}
fn default_synthesis_timeout() -> u64 {
    45
}
fn default_confidence() -> f64 {
    0.7
}

/// One advisor entry in a panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorSpec {
    /// Stable identifier (unique within the panel)
    pub id: String,

    /// Role description fed to the backend
    pub role: String,

    /// Backend to invoke
    #[serde(flatten)]
    pub kind: AdvisorKind,

    /// Override timeout for this advisor
    /// (uses `advisor_timeout_seconds` if not set)
    pub timeout_seconds: Option<u64>,

    /// Extra context passed with every query
    #[serde(default)]
    pub context: String,
}

impl AdvisorSpec {
    /// Effective timeout for this advisor.
    pub fn timeout(&self, panel: &Panel) -> Duration {
        let seconds = self
            .timeout_seconds
            .unwrap_or(panel.advisor_timeout_seconds);
        Duration::from_secs(seconds)
    }
}

/// Supported advisor backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisorKind {
    /// Local command; the prompt goes to stdin, the analysis is stdout
    Subprocess {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Remote JSON endpoint
    Http { endpoint: String },

    /// Canned analysis (offline demos, tests)
    Static {
        analysis: String,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
}

/// Synthesis capability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSpec {
    pub endpoint: String,
}

/// One advisor wired up and ready to consult.
pub struct PanelMember {
    pub advisor: Arc<dyn Advisor>,
    pub timeout: Duration,
    pub context: String,
}

impl Panel {
    /// Load a panel from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read panel file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a panel from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse panel YAML")
    }

    /// Validate the panel definition.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Panel name cannot be empty");
        }

        if self.advisors.is_empty() {
            anyhow::bail!("Panel must have at least one advisor");
        }

        for (i, spec) in self.advisors.iter().enumerate() {
            if spec.id.is_empty() {
                anyhow::bail!("Advisor {} has an empty id", i);
            }

            let duplicates = self
                .advisors
                .iter()
                .filter(|other| other.id == spec.id)
                .count();
            if duplicates > 1 {
                anyhow::bail!("Duplicate advisor id '{}'", spec.id);
            }
        }

        Ok(())
    }

    /// Instantiate every advisor with its effective timeout.
    pub fn build_members(&self) -> Vec<PanelMember> {
        self.advisors
            .iter()
            .map(|spec| {
                let advisor: Arc<dyn Advisor> = match &spec.kind {
                    AdvisorKind::Subprocess { command, args } => Arc::new(
                        SubprocessAdvisor::new(&spec.id, &spec.role, command, args.clone()),
                    ),
                    AdvisorKind::Http { endpoint } => {
                        Arc::new(HttpAdvisor::new(&spec.id, &spec.role, endpoint))
                    }
                    AdvisorKind::Static {
                        analysis,
                        confidence,
                    } => Arc::new(StaticAdvisor::new(
                        &spec.id,
                        &spec.role,
                        analysis,
                        *confidence,
                    )),
                };

                PanelMember {
                    advisor,
                    timeout: spec.timeout(self),
                    context: spec.context.clone(),
                }
            })
            .collect()
    }

    /// Instantiate the synthesis capability, if configured.
    pub fn build_synthesizer(&self) -> Option<Box<dyn Synthesizer>> {
        self.synthesis
            .as_ref()
            .map(|spec| Box::new(HttpSynthesizer::new(&spec.endpoint)) as Box<dyn Synthesizer>)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_seconds)
    }
}

//! Client-side filtering of deployment logs

use crate::model::{DeploymentLog, Environment};

/// Selection of the environment and status filter controls
///
/// `None` means the criterion is not selected. Filtering never reorders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub environment: Option<Environment>,
    pub success: Option<bool>,
}

impl LogFilter {
    /// Build from the raw control values. An empty value selects nothing;
    /// the status control means success only when it reads `true`.
    pub fn from_controls(environment: &str, status: &str) -> Self {
        Self {
            environment: (!environment.is_empty()).then(|| Environment::new(environment)),
            success: (!status.is_empty()).then(|| status == "true"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.environment.is_none() && self.success.is_none()
    }

    pub fn matches(&self, log: &DeploymentLog) -> bool {
        self.environment
            .as_ref()
            .map_or(true, |env| &log.environment == env)
            && self.success.map_or(true, |success| log.success == success)
    }

    pub fn apply<'a>(&self, logs: &'a [DeploymentLog]) -> Vec<&'a DeploymentLog> {
        logs.iter().filter(|log| self.matches(log)).collect()
    }

    /// Current value of the environment control
    pub fn environment_value(&self) -> &str {
        self.environment.as_ref().map_or("", Environment::as_str)
    }

    /// Current value of the status control
    pub fn status_value(&self) -> &'static str {
        match self.success {
            None => "",
            Some(true) => "true",
            Some(false) => "false",
        }
    }
}

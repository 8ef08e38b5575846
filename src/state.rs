//! In-memory application state
//!
//! Holds the three collections as last fetched, the active section, form
//! contents and the tables rendered from the collections. Collections are
//! only ever replaced as a whole.

use crate::filter::LogFilter;
use crate::model::{DeploymentLog, Release, User};
use crate::render::Table;
use std::fmt;
use std::str::FromStr;

/// Top-level section of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Users,
    Releases,
    Logs,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Users, Section::Releases, Section::Logs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Users => "users",
            Section::Releases => "releases",
            Section::Logs => "logs",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Users => "Users",
            Section::Releases => "Releases",
            Section::Logs => "Deployment Logs",
        }
    }

    /// Id of the navigation button
    pub fn tab_id(&self) -> &'static str {
        match self {
            Section::Users => "usersTab",
            Section::Releases => "releasesTab",
            Section::Logs => "logsTab",
        }
    }

    /// Id of the section element
    pub fn section_id(&self) -> &'static str {
        match self {
            Section::Users => "usersSection",
            Section::Releases => "releasesSection",
            Section::Logs => "logsSection",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" => Ok(Section::Users),
            "releases" => Ok(Section::Releases),
            "logs" | "deployment-logs" => Ok(Section::Logs),
            other => Err(format!("unknown section '{}'", other)),
        }
    }
}

/// Entry of the release owner selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChoice {
    pub value: i64,
    pub label: String,
}

/// Contents of the user creation form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl UserForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Contents of the release creation form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseForm {
    pub version_number: String,
    pub description: String,
    /// Selected owner id, if any
    pub owner_id: Option<i64>,
}

impl ReleaseForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub users: Vec<User>,
    pub releases: Vec<Release>,
    pub logs: Vec<DeploymentLog>,
    active: Section,
    pub owner_choices: Vec<OwnerChoice>,
    pub user_form: UserForm,
    pub release_form: ReleaseForm,
    pub log_filter: LogFilter,
    pub users_table: Table,
    pub releases_table: Table,
    pub logs_table: Table,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            releases: Vec::new(),
            logs: Vec::new(),
            active: Section::default(),
            owner_choices: Vec::new(),
            user_form: UserForm::default(),
            release_form: ReleaseForm::default(),
            log_filter: LogFilter::default(),
            users_table: Table::users(),
            releases_table: Table::releases(),
            logs_table: Table::logs(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn is_active(&self, section: Section) -> bool {
        self.active == section
    }

    /// Deactivate every section, then activate `section`
    pub fn activate(&mut self, section: Section) {
        self.active = section;
    }

    /// Table shown by a section
    pub fn table(&self, section: Section) -> &Table {
        match section {
            Section::Users => &self.users_table,
            Section::Releases => &self.releases_table,
            Section::Logs => &self.logs_table,
        }
    }

    pub fn active_table(&self) -> &Table {
        self.table(self.active)
    }

    pub fn find_user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_section_is_users() {
        let state = AppState::new();
        assert_eq!(state.active(), Section::Users);
        assert!(state.is_active(Section::Users));
        assert_eq!(state.active_table().id, "usersTable");
    }

    #[test]
    fn test_exactly_one_section_active() {
        let mut state = AppState::new();
        for target in Section::ALL {
            state.activate(target);
            let active: Vec<Section> = Section::ALL
                .into_iter()
                .filter(|s| state.is_active(*s))
                .collect();
            assert_eq!(active, vec![target]);
        }
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!("users".parse::<Section>().unwrap(), Section::Users);
        assert_eq!("Releases".parse::<Section>().unwrap(), Section::Releases);
        assert_eq!("deployment-logs".parse::<Section>().unwrap(), Section::Logs);
        assert!("settings".parse::<Section>().is_err());
    }

    #[test]
    fn test_section_ids() {
        assert_eq!(Section::Logs.tab_id(), "logsTab");
        assert_eq!(Section::Logs.section_id(), "logsSection");
        assert_eq!(Section::Releases.to_string(), "releases");
    }

    #[test]
    fn test_form_reset() {
        let mut form = UserForm {
            username: "alice".into(),
            email: "a@x.com".into(),
            full_name: "Alice A".into(),
            role: "ADMIN".into(),
        };
        form.reset();
        assert_eq!(form, UserForm::default());

        let mut form = ReleaseForm {
            version_number: "1.0.0".into(),
            description: "first".into(),
            owner_id: Some(1),
        };
        form.reset();
        assert_eq!(form.owner_id, None);
    }
}

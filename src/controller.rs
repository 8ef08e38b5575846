//! Command handlers and navigation
//!
//! [`Dashboard`] owns the API client, the application state and the user
//! interaction. Every handler issues at most one mutating request, catches
//! all errors and reports them as a notice, then re-renders what changed.
//! Failures never touch the in-memory collections.

use crate::client::ApiClient;
use crate::config::Catalog;
use crate::error::ClientError;
use crate::filter::LogFilter;
use crate::interaction::{Interaction, Notice};
use crate::model::{DeploymentLog, NewRelease, NewUser, Release, User, UserRole};
use crate::render;
use crate::state::{AppState, OwnerChoice, ReleaseForm, Section, UserForm};
use tracing::{debug, info, warn};

/// Result of a command handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and succeeded
    Done,
    /// The user declined a confirmation or left a prompt empty
    Cancelled,
    /// A request failed; an error notice was shown
    Failed,
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }
}

pub struct Dashboard<I: Interaction> {
    client: ApiClient,
    catalog: Catalog,
    /// User id attributed to promotions and rollbacks, when known
    actor: Option<i64>,
    state: AppState,
    interaction: I,
}

impl<I: Interaction> Dashboard<I> {
    pub fn new(client: ApiClient, catalog: Catalog, interaction: I) -> Self {
        Self {
            client,
            catalog,
            actor: None,
            state: AppState::new(),
            interaction,
        }
    }

    pub fn with_actor(mut self, actor: Option<i64>) -> Self {
        self.actor = actor;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn interaction(&self) -> &I {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut I {
        &mut self.interaction
    }

    fn succeed(&mut self, message: &str) -> Outcome {
        self.interaction.notify(Notice::Success(message.to_string()));
        Outcome::Done
    }

    fn fail(&mut self, message: String, error: &ClientError) -> Outcome {
        warn!(kind = error.kind().as_str(), error = %error, "Command failed");
        self.interaction.notify(Notice::Error(message));
        Outcome::Failed
    }

    /// Load the data of the default section
    pub async fn start(&mut self) -> Outcome {
        self.state.activate(Section::Users);
        self.list_users().await
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Switch the active section and load what it shows.
    ///
    /// Releases reload the release list and the owner choices, logs reload
    /// the log list. The users section relies on the data loaded at start.
    pub async fn navigate(&mut self, section: Section) -> Outcome {
        debug!(section = section.as_str(), "Switching section");
        self.state.activate(section);

        match section {
            Section::Releases => {
                let outcome = self.list_releases().await;
                self.populate_owner_choices();
                outcome
            }
            Section::Logs => self.list_deployment_logs().await,
            Section::Users => Outcome::Done,
        }
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn list_users(&mut self) -> Outcome {
        match self.client.list_users().await {
            Ok(users) => {
                debug!(count = users.len(), "Loaded users");
                self.state.users = users;
                self.state.users_table = render::render_users(&self.state.users);
                Outcome::Done
            }
            Err(e) => self.fail(e.load_message("users"), &e),
        }
    }

    /// Submit the user form. The form is kept on failure and cleared on success.
    pub async fn create_user(&mut self, form: UserForm) -> Outcome {
        self.state.user_form = form;
        let user = NewUser {
            username: self.state.user_form.username.clone(),
            email: self.state.user_form.email.clone(),
            full_name: self.state.user_form.full_name.clone(),
            role: UserRole::new(self.state.user_form.role.clone()),
        };

        match self.client.create_user(&user).await {
            Ok(created) => {
                info!(user_id = created.id, username = %created.username, "User created");
                self.succeed("User created successfully");
                self.state.user_form.reset();
                self.list_users().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("creating user"), &e),
        }
    }

    pub async fn update_user(&mut self, id: i64, form: UserForm) -> Outcome {
        let user = NewUser {
            username: form.username,
            email: form.email,
            full_name: form.full_name,
            role: UserRole::new(form.role),
        };

        match self.client.update_user(id, &user).await {
            Ok(_) => {
                info!(user_id = id, "User updated");
                self.succeed("User updated successfully");
                self.list_users().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("updating user"), &e),
        }
    }

    pub async fn delete_user(&mut self, id: i64) -> Outcome {
        if !self
            .interaction
            .confirm("Are you sure you want to delete this user?")
        {
            return Outcome::Cancelled;
        }

        match self.client.delete_user(id).await {
            Ok(()) => {
                info!(user_id = id, "User deleted");
                self.succeed("User deleted successfully");
                self.list_users().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("deleting user"), &e),
        }
    }

    /// Fetch a single user without touching the collection
    pub async fn find_user(&mut self, id: i64) -> Option<User> {
        match self.client.get_user(id).await {
            Ok(user) => Some(user),
            Err(e) => {
                self.fail(e.action_message("loading user"), &e);
                None
            }
        }
    }

    /// Rebuild the owner selector from the loaded users; no request is made
    pub fn populate_owner_choices(&mut self) {
        self.state.owner_choices = self
            .state
            .users
            .iter()
            .map(|user| OwnerChoice {
                value: user.id,
                label: user.owner_label(),
            })
            .collect();
    }

    // ------------------------------------------------------------------------
    // Releases
    // ------------------------------------------------------------------------

    pub async fn list_releases(&mut self) -> Outcome {
        match self.client.list_releases().await {
            Ok(releases) => {
                debug!(count = releases.len(), "Loaded releases");
                self.state.releases = releases;
                self.render_releases();
                Outcome::Done
            }
            Err(e) => self.fail(e.load_message("releases"), &e),
        }
    }

    fn render_releases(&mut self) {
        self.state.releases_table =
            render::render_releases(&self.state.releases, &self.catalog);
    }

    /// Resolve the selected owner against the loaded users and embed the
    /// whole user in the request
    fn release_body(&self, form: &ReleaseForm) -> NewRelease {
        let owner = form
            .owner_id
            .and_then(|id| self.state.find_user(id))
            .cloned();
        if owner.is_none() {
            debug!(owner_id = ?form.owner_id, "No loaded user matches the selected owner");
        }

        NewRelease {
            version_number: form.version_number.clone(),
            description: form.description.clone(),
            owner,
        }
    }

    pub async fn create_release(&mut self, form: ReleaseForm) -> Outcome {
        let release = self.release_body(&form);
        self.state.release_form = form;

        match self.client.create_release(&release).await {
            Ok(created) => {
                info!(
                    release_id = created.id,
                    version = %created.version_number,
                    "Release created"
                );
                self.succeed("Release created successfully");
                self.state.release_form.reset();
                self.list_releases().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("creating release"), &e),
        }
    }

    pub async fn update_release(&mut self, id: i64, form: ReleaseForm) -> Outcome {
        let release = self.release_body(&form);

        match self.client.update_release(id, &release).await {
            Ok(_) => {
                info!(release_id = id, "Release updated");
                self.succeed("Release updated successfully");
                self.list_releases().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("updating release"), &e),
        }
    }

    /// Actor for a promote/rollback: the session user, else asked for.
    /// An empty answer cancels.
    fn resolve_actor(&mut self, prompt: &str) -> Option<String> {
        if let Some(id) = self.actor {
            return Some(id.to_string());
        }
        self.interaction
            .ask(prompt)
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty())
    }

    /// Reload after a promote or rollback; the server appends a log entry,
    /// so the logs are refreshed too when they are on screen
    async fn reload_after_transition(&mut self) {
        self.list_releases().await;
        if self.state.is_active(Section::Logs) {
            self.list_deployment_logs().await;
        }
    }

    pub async fn promote_release(&mut self, id: i64) -> Outcome {
        let prompt = "Enter your User ID to promote this release:";
        let Some(actor) = self.resolve_actor(prompt) else {
            return Outcome::Cancelled;
        };

        match self.client.promote_release(id, &actor).await {
            Ok(release) => {
                info!(
                    release_id = id,
                    actor = %actor,
                    environment = %release.current_environment,
                    "Release promoted"
                );
                self.succeed("Release promoted successfully");
                self.reload_after_transition().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("promoting release"), &e),
        }
    }

    pub async fn rollback_release(&mut self, id: i64) -> Outcome {
        let prompt = "Enter your User ID to rollback this release:";
        let Some(actor) = self.resolve_actor(prompt) else {
            return Outcome::Cancelled;
        };
        if !self
            .interaction
            .confirm("Are you sure you want to rollback this release?")
        {
            return Outcome::Cancelled;
        }

        match self.client.rollback_release(id, &actor).await {
            Ok(release) => {
                info!(
                    release_id = id,
                    actor = %actor,
                    environment = %release.current_environment,
                    "Release rolled back"
                );
                self.succeed("Release rolled back successfully");
                self.reload_after_transition().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("rolling back release"), &e),
        }
    }

    pub async fn delete_release(&mut self, id: i64) -> Outcome {
        if !self
            .interaction
            .confirm("Are you sure you want to delete this release?")
        {
            return Outcome::Cancelled;
        }

        match self.client.delete_release(id).await {
            Ok(()) => {
                info!(release_id = id, "Release deleted");
                self.succeed("Release deleted successfully");
                self.list_releases().await;
                Outcome::Done
            }
            Err(e) => self.fail(e.action_message("deleting release"), &e),
        }
    }

    pub async fn find_release(&mut self, id: i64) -> Option<Release> {
        match self.client.get_release(id).await {
            Ok(release) => Some(release),
            Err(e) => {
                self.fail(e.action_message("loading release"), &e);
                None
            }
        }
    }

    pub async fn find_release_by_version(&mut self, version: &str) -> Option<Release> {
        match self.client.get_release_by_version(version).await {
            Ok(release) => Some(release),
            Err(e) => {
                self.fail(e.action_message("loading release"), &e);
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Deployment logs
    // ------------------------------------------------------------------------

    /// Reload the logs and show all of them; the filter selection is cleared
    pub async fn list_deployment_logs(&mut self) -> Outcome {
        match self.client.list_deployment_logs().await {
            Ok(logs) => {
                debug!(count = logs.len(), "Loaded deployment logs");
                self.state.logs = logs;
                self.state.log_filter = LogFilter::default();
                self.render_logs(None);
                Outcome::Done
            }
            Err(e) => self.fail(e.load_message("deployment logs"), &e),
        }
    }

    /// Render `logs`, or the whole loaded collection when `None`
    pub fn render_logs(&mut self, logs: Option<&[DeploymentLog]>) {
        let logs = logs.unwrap_or(&self.state.logs);
        self.state.logs_table = render::render_logs(logs, &self.catalog);
    }

    /// Filter the loaded logs; no request is made
    pub fn apply_filters(&mut self, filter: LogFilter) {
        let table = render::render_logs(filter.apply(&self.state.logs), &self.catalog);
        debug!(
            environment = filter.environment_value(),
            status = filter.status_value(),
            rows = table.len(),
            "Applied log filters"
        );
        self.state.log_filter = filter;
        self.state.logs_table = table;
    }

    /// Show the deployment history of one release. The loaded collection is
    /// left as it is.
    pub async fn show_release_logs(&mut self, release_id: i64) -> Outcome {
        match self.client.list_deployment_logs_for_release(release_id).await {
            Ok(logs) => {
                self.render_logs(Some(logs.as_slice()));
                Outcome::Done
            }
            Err(e) => self.fail(e.load_message("deployment logs"), &e),
        }
    }
}

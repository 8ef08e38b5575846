//! Dashboard page
//!
//! Renders the complete HTML document for the current state: navigation,
//! the three sections with their forms, filter controls and tables, and any
//! pending notices. Element ids are a stable contract with scripts and
//! stylesheets built against the page. A read-only page leaves out the
//! creation forms and row actions; only the log filters, which are plain
//! GET requests, remain.

use crate::config::Catalog;
use crate::interaction::Notice;
use crate::render::{escape_html, Table};
use crate::state::{AppState, Section};

pub const USER_FORM: &str = "userForm";
pub const RELEASE_FORM: &str = "releaseForm";
pub const OWNER_SELECT: &str = "ownerId";
pub const ENVIRONMENT_FILTER: &str = "environmentFilter";
pub const STATUS_FILTER: &str = "statusFilter";
pub const REFRESH_LOGS: &str = "refreshLogs";

/// What the page offers besides the tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageMode {
    /// Creation forms and row action buttons, for a front end that binds them
    #[default]
    Interactive,
    /// Tables, navigation and log filters only
    ReadOnly,
}

/// Render the whole page
pub fn render(
    state: &AppState,
    catalog: &Catalog,
    notices: &[Notice],
    mode: PageMode,
) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(PAGE_HEAD);

    html.push_str("<nav class=\"navbar\">\n<div class=\"nav-brand\"><h1>Release Tracker</h1></div>\n<div class=\"nav-links\">\n");
    for section in Section::ALL {
        html.push_str(&format!(
            "<a href=\"/{}\" id=\"{}\" class=\"nav-btn{}\">{}</a>\n",
            section.as_str(),
            section.tab_id(),
            active_class(state, section),
            section.title()
        ));
    }
    html.push_str("</div>\n</nav>\n");

    html.push_str("<main class=\"container\">\n");
    for notice in notices {
        let class = if notice.is_error() { "notice error" } else { "notice success" };
        html.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            class,
            escape_html(notice.message())
        ));
    }

    users_section(&mut html, state, catalog, mode);
    releases_section(&mut html, state, mode);
    logs_section(&mut html, state, catalog);

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn active_class(state: &AppState, section: Section) -> &'static str {
    if state.is_active(section) {
        " active"
    } else {
        ""
    }
}

fn open_section(html: &mut String, state: &AppState, section: Section) {
    html.push_str(&format!(
        "<section id=\"{}\" class=\"section{}\">\n<div class=\"view-header\"><h2>{}</h2></div>\n",
        section.section_id(),
        active_class(state, section),
        section.title()
    ));
}

fn text_input(html: &mut String, id: &str, label: &str, value: &str) {
    html.push_str(&format!(
        "<div class=\"form-group\"><label for=\"{id}\">{label}</label><input type=\"text\" id=\"{id}\" name=\"{id}\" value=\"{}\" required></div>\n",
        escape_html(value),
    ));
}

fn option(html: &mut String, value: &str, label: &str, selected: bool) {
    html.push_str(&format!(
        "<option value=\"{}\"{}>{}</option>",
        escape_html(value),
        if selected { " selected" } else { "" },
        escape_html(label)
    ));
}

fn table_html(table: &Table, mode: PageMode) -> String {
    match mode {
        PageMode::Interactive => table.to_html(),
        PageMode::ReadOnly => table.to_read_only_html(),
    }
}

fn users_section(html: &mut String, state: &AppState, catalog: &Catalog, mode: PageMode) {
    open_section(html, state, Section::Users);
    if mode == PageMode::Interactive {
        user_form(html, state, catalog);
    }
    html.push_str(&table_html(&state.users_table, mode));
    html.push_str("</section>\n");
}

fn user_form(html: &mut String, state: &AppState, catalog: &Catalog) {
    let form = &state.user_form;
    html.push_str(&format!("<form id=\"{}\" class=\"card\">\n", USER_FORM));
    text_input(html, "username", "Username", &form.username);
    text_input(html, "email", "Email", &form.email);
    text_input(html, "fullName", "Full Name", &form.full_name);
    html.push_str("<div class=\"form-group\"><label for=\"role\">Role</label><select id=\"role\" name=\"role\" required>");
    option(html, "", "Select Role", form.role.is_empty());
    for role in &catalog.roles {
        option(html, role.as_str(), role.as_str(), form.role == role.as_str());
    }
    html.push_str("</select></div>\n<button type=\"submit\" class=\"btn btn-primary\">Create User</button>\n</form>\n");
}

fn releases_section(html: &mut String, state: &AppState, mode: PageMode) {
    open_section(html, state, Section::Releases);
    if mode == PageMode::Interactive {
        release_form(html, state);
    }
    html.push_str(&table_html(&state.releases_table, mode));
    html.push_str("</section>\n");
}

fn release_form(html: &mut String, state: &AppState) {
    let form = &state.release_form;
    html.push_str(&format!("<form id=\"{}\" class=\"card\">\n", RELEASE_FORM));
    text_input(html, "versionNumber", "Version", &form.version_number);
    text_input(html, "description", "Description", &form.description);
    html.push_str(&format!(
        "<div class=\"form-group\"><label for=\"{0}\">Owner</label><select id=\"{0}\" name=\"{0}\" required>",
        OWNER_SELECT
    ));
    option(html, "", "Select Owner", form.owner_id.is_none());
    for choice in &state.owner_choices {
        option(
            html,
            &choice.value.to_string(),
            &choice.label,
            form.owner_id == Some(choice.value),
        );
    }
    html.push_str("</select></div>\n<button type=\"submit\" class=\"btn btn-primary\">Create Release</button>\n</form>\n");
}

fn logs_section(html: &mut String, state: &AppState, catalog: &Catalog) {
    let filter = &state.log_filter;
    open_section(html, state, Section::Logs);

    html.push_str("<form class=\"filters\" method=\"get\" action=\"/logs\">\n");
    html.push_str(&format!(
        "<select id=\"{0}\" name=\"environment\">",
        ENVIRONMENT_FILTER
    ));
    option(html, "", "All Environments", filter.environment.is_none());
    for env in &catalog.environments {
        option(
            html,
            env.as_str(),
            env.as_str(),
            filter.environment_value() == env.as_str(),
        );
    }
    html.push_str("</select>\n");

    html.push_str(&format!("<select id=\"{0}\" name=\"status\">", STATUS_FILTER));
    option(html, "", "All Statuses", filter.success.is_none());
    option(html, "true", "Success", filter.success == Some(true));
    option(html, "false", "Failed", filter.success == Some(false));
    html.push_str("</select>\n");
    html.push_str(&format!(
        "<button type=\"submit\" class=\"btn btn-secondary\">Filter</button>\n<a id=\"{}\" class=\"btn btn-secondary\" href=\"/logs\">Refresh</a>\n</form>\n",
        REFRESH_LOGS
    ));

    html.push_str(&state.logs_table.to_html());
    html.push_str("</section>\n");
}

const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Release Tracker</title>
    <style>
:root {
    --primary: #6366f1;
    --primary-dark: #4f46e5;
    --success: #10b981;
    --warning: #f59e0b;
    --danger: #ef4444;
    --info: #3b82f6;
    --gray-100: #f3f4f6;
    --gray-300: #d1d5db;
    --gray-700: #374151;
    --gray-800: #1f2937;
    --gray-900: #111827;
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: var(--gray-100);
    color: var(--gray-800);
    line-height: 1.5;
}

.navbar {
    background: var(--gray-900);
    color: white;
    padding: 0 1.5rem;
    height: 60px;
    display: flex;
    align-items: center;
    justify-content: space-between;
}

.nav-links { display: flex; gap: 0.5rem; }

.nav-btn {
    color: var(--gray-300);
    text-decoration: none;
    padding: 0.5rem 1rem;
    border-radius: 0.375rem;
}

.nav-btn.active { color: white; background: var(--primary); }

.container { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }

.section { display: none; }
.section.active { display: block; }

.view-header { margin-bottom: 1rem; }

.card, .filters {
    background: white;
    border-radius: 0.5rem;
    padding: 1rem;
    margin-bottom: 1rem;
    display: flex;
    flex-wrap: wrap;
    gap: 0.75rem;
    align-items: flex-end;
}

.form-group { display: flex; flex-direction: column; }

input, select {
    padding: 0.4rem 0.6rem;
    border: 1px solid var(--gray-300);
    border-radius: 0.375rem;
}

.btn, button {
    padding: 0.45rem 0.9rem;
    border: none;
    border-radius: 0.375rem;
    cursor: pointer;
    text-decoration: none;
    font-size: 0.875rem;
}

.btn-primary { background: var(--primary); color: white; }
.btn-secondary { background: white; color: var(--gray-700); border: 1px solid var(--gray-300); }
button.info { background: var(--info); color: white; }
button.warning { background: var(--warning); color: white; }
button.danger { background: var(--danger); color: white; }

table { width: 100%; border-collapse: collapse; background: white; border-radius: 0.5rem; }
th, td { text-align: left; padding: 0.6rem 0.8rem; border-bottom: 1px solid var(--gray-100); }
.action-buttons { display: flex; gap: 0.4rem; }

.environment-badge {
    display: inline-block;
    padding: 0.15rem 0.5rem;
    border-radius: 9999px;
    font-size: 0.75rem;
    font-weight: 600;
    background: var(--gray-300);
}
.env-dev { background: #dbeafe; color: #1e40af; }
.env-qa { background: #fef3c7; color: #92400e; }
.env-uat { background: #ede9fe; color: #5b21b6; }
.env-prod { background: #d1fae5; color: #065f46; }

.status-success { color: var(--success); font-weight: 600; }
.status-failed { color: var(--danger); font-weight: 600; }

.notice { padding: 0.75rem 1rem; border-radius: 0.375rem; margin-bottom: 1rem; }
.notice.success { background: #d1fae5; }
.notice.error { background: #fee2e2; }
    </style>
</head>
<body>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::LogFilter;
    use crate::state::OwnerChoice;

    #[test]
    fn test_one_active_section() {
        let mut state = AppState::new();
        state.activate(Section::Releases);
        let html = render(&state, &Catalog::default(), &[], PageMode::Interactive);

        assert!(html.contains("id=\"releasesSection\" class=\"section active\""));
        assert!(html.contains("id=\"usersSection\" class=\"section\""));
        assert!(html.contains("id=\"logsSection\" class=\"section\""));
        assert_eq!(html.matches("class=\"nav-btn active\"").count(), 1);
        assert!(html.contains("id=\"releasesTab\" class=\"nav-btn active\""));
    }

    #[test]
    fn test_contract_ids_present() {
        let html = render(&AppState::new(), &Catalog::default(), &[], PageMode::Interactive);
        for id in [
            USER_FORM,
            RELEASE_FORM,
            OWNER_SELECT,
            ENVIRONMENT_FILTER,
            STATUS_FILTER,
            REFRESH_LOGS,
            "usersTable",
            "releasesTable",
            "logsTable",
        ] {
            assert!(html.contains(&format!("id=\"{}\"", id)), "missing {}", id);
        }
    }

    #[test]
    fn test_owner_choices_and_filters_rendered() {
        let mut state = AppState::new();
        state.owner_choices = vec![OwnerChoice {
            value: 3,
            label: "Carol C (carol)".into(),
        }];
        state.release_form.owner_id = Some(3);
        state.log_filter = LogFilter::from_controls("UAT", "false");

        let html = render(&state, &Catalog::default(), &[], PageMode::Interactive);
        assert!(html.contains("<option value=\"3\" selected>Carol C (carol)</option>"));
        assert!(html.contains("<option value=\"UAT\" selected>UAT</option>"));
        assert!(html.contains("<option value=\"false\" selected>Failed</option>"));
    }

    #[test]
    fn test_read_only_page_has_no_forms_or_buttons() {
        let mut state = AppState::new();
        state.users_table = crate::render::render_users(&[crate::model::User {
            id: 4,
            username: "dave".into(),
            email: "d@x.com".into(),
            full_name: "Dave D".into(),
            role: "QA".into(),
        }]);
        let html = render(&state, &Catalog::default(), &[], PageMode::ReadOnly);

        assert!(!html.contains(&format!("id=\"{}\"", USER_FORM)));
        assert!(!html.contains(&format!("id=\"{}\"", RELEASE_FORM)));
        assert!(!html.contains("<button class="));
        assert!(!html.contains("data-command"));
        assert!(html.contains("<td>dave</td>"));
        // The log filter form submits a GET the server handles
        assert!(html.contains(&format!("id=\"{}\"", ENVIRONMENT_FILTER)));
        assert!(html.contains("action=\"/logs\""));
    }

    #[test]
    fn test_notices_are_escaped() {
        let notices = vec![Notice::Error("Username already exists: <b>".into())];
        let html = render(
            &AppState::new(),
            &Catalog::default(),
            &notices,
            PageMode::Interactive,
        );
        assert!(html
            .contains("<div class=\"notice error\">Username already exists: &lt;b&gt;</div>"));
    }
}

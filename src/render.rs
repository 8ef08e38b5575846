//! Table rendering for users, releases and deployment logs
//!
//! A render function rebuilds a whole [`Table`] from a collection. Tables
//! are emitted as HTML for the dashboard page or as aligned text for the
//! terminal.

use crate::config::Catalog;
use crate::model::{DeploymentLog, Environment, Release, User};
use chrono::{DateTime, Local, NaiveDateTime};

/// Descriptions and notes longer than this are cut and suffixed with `...`
pub const TRUNCATE_AT: usize = 50;

pub const USERS_TABLE: &str = "usersTable";
pub const RELEASES_TABLE: &str = "releasesTable";
pub const LOGS_TABLE: &str = "logsTable";

const USER_HEADERS: &[&str] = &["ID", "Username", "Email", "Full Name", "Role", "Actions"];
const RELEASE_HEADERS: &[&str] = &[
    "Version",
    "Description",
    "Owner",
    "Environment",
    "Created",
    "Actions",
];
const LOG_HEADERS: &[&str] = &[
    "Release",
    "Environment",
    "Deployed By",
    "Timestamp",
    "Status",
    "Notes",
];

/// Row action offered next to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DeleteUser(i64),
    Promote(i64),
    Rollback(i64),
    DeleteRelease(i64),
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::DeleteUser(_) | Action::DeleteRelease(_) => "Delete",
            Action::Promote(_) => "Promote",
            Action::Rollback(_) => "Rollback",
        }
    }

    /// Button style class
    pub fn class(&self) -> &'static str {
        match self {
            Action::DeleteUser(_) | Action::DeleteRelease(_) => "danger",
            Action::Promote(_) => "info",
            Action::Rollback(_) => "warning",
        }
    }

    /// Identifier of the command bound to the button
    pub fn command(&self) -> &'static str {
        match self {
            Action::DeleteUser(_) => "delete-user",
            Action::Promote(_) => "promote-release",
            Action::Rollback(_) => "rollback-release",
            Action::DeleteRelease(_) => "delete-release",
        }
    }

    pub fn target(&self) -> i64 {
        match self {
            Action::DeleteUser(id)
            | Action::Promote(id)
            | Action::Rollback(id)
            | Action::DeleteRelease(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// Tooltip holding the untruncated text
    pub title: Option<String>,
    /// Wraps the text in a span with this class (badges, status)
    pub class: Option<String>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Truncated cell whose title keeps the full text
    pub fn truncated(full: &str) -> Self {
        Self {
            text: truncate(full),
            title: Some(full.to_string()),
            class: None,
        }
    }

    pub fn styled(text: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            class: Some(class.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub actions: Vec<Action>,
}

impl Row {
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.actions.iter().map(Action::label).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: &'static str,
    pub headers: &'static [&'static str],
    /// Whether the last header is an action column
    pub has_actions: bool,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn users() -> Self {
        Self::new(USERS_TABLE, USER_HEADERS, true)
    }

    pub fn releases() -> Self {
        Self::new(RELEASES_TABLE, RELEASE_HEADERS, true)
    }

    pub fn logs() -> Self {
        Self::new(LOGS_TABLE, LOG_HEADERS, false)
    }

    fn new(id: &'static str, headers: &'static [&'static str], has_actions: bool) -> Self {
        Self {
            id,
            headers,
            has_actions,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Complete `<table>` element
    pub fn to_html(&self) -> String {
        self.html(true)
    }

    /// `<table>` element without the action column
    pub fn to_read_only_html(&self) -> String {
        self.html(false)
    }

    fn html(&self, with_actions: bool) -> String {
        let headers = if self.has_actions && !with_actions {
            &self.headers[..self.headers.len() - 1]
        } else {
            self.headers
        };

        let mut out = format!("<table id=\"{}\">\n<thead><tr>", self.id);
        for header in headers {
            out.push_str(&format!("<th>{}</th>", escape_html(header)));
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        out.push_str(&self.body_html(with_actions));
        out.push_str("</tbody>\n</table>\n");
        out
    }

    /// The `<tr>` rows of the table body
    pub fn rows_html(&self) -> String {
        self.body_html(true)
    }

    fn body_html(&self, with_actions: bool) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in &row.cells {
                match &cell.title {
                    Some(title) => {
                        out.push_str(&format!("<td title=\"{}\">", escape_html(title)))
                    }
                    None => out.push_str("<td>"),
                }
                match &cell.class {
                    Some(class) => out.push_str(&format!(
                        "<span class=\"{}\">{}</span>",
                        escape_html(class),
                        escape_html(&cell.text)
                    )),
                    None => out.push_str(&escape_html(&cell.text)),
                }
                out.push_str("</td>");
            }
            if self.has_actions && with_actions {
                out.push_str("<td><div class=\"action-buttons\">");
                for action in &row.actions {
                    out.push_str(&format!(
                        "<button class=\"{}\" data-command=\"{}\" data-id=\"{}\">{}</button>",
                        action.class(),
                        action.command(),
                        action.target(),
                        action.label()
                    ));
                }
                out.push_str("</div></td>");
            }
            out.push_str("</tr>\n");
        }
        out
    }

    /// Aligned plain-text columns
    pub fn to_text(&self) -> String {
        let lines: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut line: Vec<String> = row.cells.iter().map(|c| c.text.clone()).collect();
                if self.has_actions {
                    line.push(row.labels().join(" "));
                }
                line
            })
            .collect();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for line in &lines {
            for (i, text) in line.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(text.chars().count());
                }
            }
        }

        let headers: Vec<String> = self.headers.iter().map(|h| h.to_uppercase()).collect();
        let mut out = format_line(&headers, &widths);
        if lines.is_empty() {
            out.push_str("  (none)\n");
        }
        for line in &lines {
            out.push_str(&format_line(line, &widths));
        }
        out
    }
}

fn format_line(cols: &[String], widths: &[usize]) -> String {
    let mut line = String::from(" ");
    for (i, col) in cols.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(0);
        let pad = width.saturating_sub(col.chars().count());
        line.push(' ');
        line.push_str(col);
        if i + 1 < cols.len() {
            line.push_str(&" ".repeat(pad + 2));
        }
    }
    line.push('\n');
    line
}

/// Cut a string to [`TRUNCATE_AT`] characters plus `...`
pub fn truncate(s: &str) -> String {
    match s.char_indices().nth(TRUNCATE_AT) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

/// CSS classes of an environment badge; unknown stages get no stage class
pub fn badge_class(env: &Environment, catalog: &Catalog) -> String {
    if catalog.is_known_stage(env) {
        format!("environment-badge env-{}", env.as_str().to_lowercase())
    } else {
        "environment-badge".to_string()
    }
}

fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// `2024-03-01T09:15:00` -> `2024-03-01`; unparseable input is returned as is
pub fn format_date(ts: &str) -> String {
    parse_timestamp(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// `2024-03-01T09:15:00.123` -> `2024-03-01 09:15:00`
pub fn format_timestamp(ts: &str) -> String {
    parse_timestamp(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_users(users: &[User]) -> Table {
    let mut table = Table::users();
    table.rows = users
        .iter()
        .map(|user| Row {
            cells: vec![
                Cell::text(user.id.to_string()),
                Cell::text(&user.username),
                Cell::text(&user.email),
                Cell::text(&user.full_name),
                Cell::text(user.role.as_str()),
            ],
            actions: vec![Action::DeleteUser(user.id)],
        })
        .collect();
    table
}

pub fn render_releases(releases: &[Release], catalog: &Catalog) -> Table {
    let mut table = Table::releases();
    table.rows = releases
        .iter()
        .map(|release| {
            let env = &release.current_environment;
            let mut actions = Vec::with_capacity(3);
            if catalog.can_promote(env) {
                actions.push(Action::Promote(release.id));
            }
            if catalog.can_rollback(env) {
                actions.push(Action::Rollback(release.id));
            }
            actions.push(Action::DeleteRelease(release.id));

            Row {
                cells: vec![
                    Cell::text(&release.version_number),
                    Cell::truncated(&release.description),
                    Cell::text(&release.owner.full_name),
                    Cell::styled(env.as_str(), badge_class(env, catalog)),
                    Cell::text(release.created_at.as_deref().map(format_date).unwrap_or_default()),
                ],
                actions,
            }
        })
        .collect();
    table
}

pub fn render_logs<'a>(
    logs: impl IntoIterator<Item = &'a DeploymentLog>,
    catalog: &Catalog,
) -> Table {
    let mut table = Table::logs();
    table.rows = logs
        .into_iter()
        .map(|log| {
            let (status, class) = if log.success {
                ("Success", "status-success")
            } else {
                ("Failed", "status-failed")
            };

            Row {
                cells: vec![
                    Cell::text(&log.release.version_number),
                    Cell::styled(log.environment.as_str(), badge_class(&log.environment, catalog)),
                    Cell::text(&log.deployed_by.full_name),
                    Cell::text(
                        log.deployment_timestamp
                            .as_deref()
                            .map(format_timestamp)
                            .unwrap_or_default(),
                    ),
                    Cell::styled(status, class),
                    Cell::truncated(log.notes.as_deref().unwrap_or("")),
                ],
                actions: Vec::new(),
            }
        })
        .collect();
    table
}

//! Interactive console
//!
//! A line-oriented front end over [`Dashboard`]: each line is one command,
//! form fields are asked through the dashboard's interaction and the table
//! of the affected section is printed after every command.

use crate::controller::{Dashboard, Outcome};
use crate::filter::LogFilter;
use crate::interaction::{Interaction, Notice};
use crate::state::{ReleaseForm, Section, UserForm};
use std::io::Write;
use std::str::FromStr;

pub const PROMPT: &str = "releasedeck>";

pub const HELP: &str = "\
Commands:
  users                        Show users
  releases                     Show releases
  logs                         Show deployment logs
  user add                     Create a user
  user rm <id>                 Delete a user
  release add                  Create a release
  promote <id>                 Promote a release to the next environment
  rollback <id>                Roll a release back to the previous environment
  release rm <id>              Delete a release
  filter [ENV|-] [true|false|-]
                               Filter the loaded deployment logs
  history <release-id>         Show the deployment history of a release
  help                         Show this help
  quit                         Leave the console
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show(Section),
    AddUser,
    RemoveUser(i64),
    AddRelease,
    Promote(i64),
    Rollback(i64),
    RemoveRelease(i64),
    Filter { environment: String, status: String },
    History(i64),
    Help,
    Quit,
}

fn parse_id(arg: Option<&String>, usage: &str) -> Result<i64, String> {
    let arg = arg.ok_or_else(|| format!("usage: {}", usage))?;
    arg.parse()
        .map_err(|_| format!("'{}' is not a valid id (usage: {})", arg, usage))
}

/// `-` stands for an unselected control
fn control_value(arg: Option<&String>) -> String {
    match arg.map(String::as_str) {
        None | Some("-") => String::new(),
        Some(value) => value.to_string(),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words = shell_words::split(line).map_err(|e| format!("invalid input: {}", e))?;
        let mut args = words.iter();
        let Some(head) = args.next() else {
            return Err("empty command".to_string());
        };

        let rest: Vec<&String> = args.collect();
        let first = rest.first().copied();
        let second = rest.get(1).copied();

        let command = match (head.as_str(), first.map(String::as_str)) {
            ("users", None) => Command::Show(Section::Users),
            ("releases", None) => Command::Show(Section::Releases),
            ("logs", None) => Command::Show(Section::Logs),
            ("user", Some("add")) => Command::AddUser,
            ("user", Some("rm")) => Command::RemoveUser(parse_id(second, "user rm <id>")?),
            ("release", Some("add")) => Command::AddRelease,
            ("release", Some("rm")) => {
                Command::RemoveRelease(parse_id(second, "release rm <id>")?)
            }
            ("promote", _) => Command::Promote(parse_id(first, "promote <id>")?),
            ("rollback", _) => Command::Rollback(parse_id(first, "rollback <id>")?),
            ("history", _) => Command::History(parse_id(first, "history <release-id>")?),
            ("filter", _) => {
                let status = control_value(second);
                if !matches!(status.as_str(), "" | "true" | "false") {
                    return Err(format!("status must be true, false or -, got '{}'", status));
                }
                Command::Filter {
                    environment: control_value(first),
                    status,
                }
            }
            ("help", _) | ("?", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            _ => return Err(format!("unknown command '{}', try 'help'", line.trim())),
        };

        Ok(command)
    }
}

/// Ask every field of a form; `None` as soon as one is cancelled
fn ask_fields<I: Interaction>(
    dashboard: &mut Dashboard<I>,
    prompts: &[&str],
) -> Option<Vec<String>> {
    prompts
        .iter()
        .map(|prompt| dashboard.interaction_mut().ask(prompt))
        .collect()
}

async fn add_user<I: Interaction>(dashboard: &mut Dashboard<I>) -> Outcome {
    let roles = dashboard
        .catalog()
        .roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join("/");
    let role_prompt = format!("Role ({}):", roles);

    let Some(fields) = ask_fields(
        dashboard,
        &["Username:", "Email:", "Full name:", role_prompt.as_str()],
    ) else {
        return Outcome::Cancelled;
    };

    let [username, email, full_name, role]: [String; 4] = match fields.try_into() {
        Ok(fields) => fields,
        Err(_) => return Outcome::Cancelled,
    };
    let form = UserForm {
        username,
        email,
        full_name,
        role: role.trim().to_uppercase(),
    };

    dashboard.create_user(form).await
}

async fn add_release<I: Interaction>(dashboard: &mut Dashboard<I>) -> Outcome {
    // Owners are chosen among the loaded users
    if dashboard.state().users.is_empty() {
        dashboard.list_users().await;
    }
    dashboard.populate_owner_choices();

    let owners = dashboard
        .state()
        .owner_choices
        .iter()
        .map(|c| format!("{}={}", c.value, c.label))
        .collect::<Vec<_>>()
        .join(", ");
    let owner_prompt = format!("Owner id [{}]:", owners);

    let Some(fields) = ask_fields(
        dashboard,
        &["Version:", "Description:", owner_prompt.as_str()],
    ) else {
        return Outcome::Cancelled;
    };

    let [version_number, description, owner]: [String; 3] = match fields.try_into() {
        Ok(fields) => fields,
        Err(_) => return Outcome::Cancelled,
    };
    let owner = owner.trim();
    let owner_id = if owner.is_empty() {
        None
    } else {
        match owner.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                dashboard
                    .interaction_mut()
                    .notify(Notice::Error(format!("'{}' is not a valid owner id", owner)));
                return Outcome::Cancelled;
            }
        }
    };

    dashboard
        .create_release(ReleaseForm {
            version_number,
            description,
            owner_id,
        })
        .await
}

/// Run one command; returns the section whose table should be shown
pub async fn execute<I: Interaction>(
    dashboard: &mut Dashboard<I>,
    command: Command,
) -> Option<Section> {
    match command {
        Command::Show(Section::Users) => {
            dashboard.navigate(Section::Users).await;
            dashboard.list_users().await;
            Some(Section::Users)
        }
        Command::Show(section) => {
            dashboard.navigate(section).await;
            Some(section)
        }
        Command::AddUser => {
            add_user(dashboard).await;
            Some(Section::Users)
        }
        Command::RemoveUser(id) => {
            dashboard.delete_user(id).await;
            Some(Section::Users)
        }
        Command::AddRelease => {
            add_release(dashboard).await;
            Some(Section::Releases)
        }
        Command::Promote(id) => {
            dashboard.promote_release(id).await;
            Some(Section::Releases)
        }
        Command::Rollback(id) => {
            dashboard.rollback_release(id).await;
            Some(Section::Releases)
        }
        Command::RemoveRelease(id) => {
            dashboard.delete_release(id).await;
            Some(Section::Releases)
        }
        Command::Filter {
            environment,
            status,
        } => {
            if !dashboard.state().is_active(Section::Logs)
                && !dashboard.navigate(Section::Logs).await.is_done()
            {
                return Some(Section::Logs);
            }
            dashboard.apply_filters(LogFilter::from_controls(&environment, &status));
            Some(Section::Logs)
        }
        Command::History(release_id) => {
            dashboard.show_release_logs(release_id).await;
            Some(Section::Logs)
        }
        Command::Help | Command::Quit => None,
    }
}

/// Read commands through the interaction until `quit` or end of input
pub async fn run<I: Interaction, W: Write>(
    dashboard: &mut Dashboard<I>,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "Type 'help' for the list of commands.")?;

    while let Some(line) = dashboard.interaction_mut().ask(PROMPT) {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => write!(out, "{}", HELP)?,
            command => {
                if let Some(section) = execute(dashboard, command).await {
                    write!(out, "{}", dashboard.state().table(section).to_text())?;
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

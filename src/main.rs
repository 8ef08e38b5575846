use clap::{Args, Parser, Subcommand};
use releasedeck::client::ApiClient;
use releasedeck::config::{Config, ENV_ACTOR, ENV_API_URL};
use releasedeck::console;
use releasedeck::controller::{Dashboard, Outcome};
use releasedeck::filter::LogFilter;
use releasedeck::interaction::{Interaction, Scripted, Terminal};
use releasedeck::model::{Environment, Release, User};
use releasedeck::page;
use releasedeck::render;
use releasedeck::server::DashboardServer;
use releasedeck::state::{ReleaseForm, Section, UserForm};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "releasedeck", version, about = "Release tracker dashboard client")]
struct Cli {
    /// Configuration file (default: ~/.releasedeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the release tracker API
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,

    /// User id attributed to promotions and rollbacks
    #[arg(long, global = true, env = ENV_ACTOR)]
    actor: Option<i64>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Print tables as HTML instead of text
    #[arg(long, global = true)]
    html: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage users
    #[command(subcommand)]
    Users(UsersCommand),
    /// Manage releases
    #[command(subcommand)]
    Releases(ReleasesCommand),
    /// Inspect deployment logs
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Render the dashboard page
    Page {
        #[arg(long, default_value = "users")]
        section: Section,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Interactive console
    Console,
}

#[derive(Args, Debug)]
struct UserFields {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    role: String,
}

impl From<UserFields> for UserForm {
    fn from(fields: UserFields) -> Self {
        UserForm {
            username: fields.username,
            email: fields.email,
            full_name: fields.full_name,
            role: fields.role.to_uppercase(),
        }
    }
}

#[derive(Args, Debug)]
struct ReleaseFields {
    #[arg(long = "version")]
    version_number: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Owner user id
    #[arg(long)]
    owner: Option<i64>,
}

impl From<ReleaseFields> for ReleaseForm {
    fn from(fields: ReleaseFields) -> Self {
        ReleaseForm {
            version_number: fields.version_number,
            description: fields.description,
            owner_id: fields.owner,
        }
    }
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    Show { id: i64 },
    Create(UserFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ReleasesCommand {
    List,
    /// Show a release by id, or by version with --by-version
    Show {
        key: String,
        #[arg(long)]
        by_version: bool,
    },
    Create(ReleaseFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ReleaseFields,
    },
    Promote { id: i64 },
    Rollback { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    List {
        #[arg(long)]
        environment: Option<String>,
        /// true for successful deployments, false for failed ones
        #[arg(long)]
        status: Option<bool>,
        /// Deployment history of one release
        #[arg(long, conflicts_with_all = ["environment", "status"])]
        release: Option<i64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("releasedeck=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::resolve(cli.config.as_deref()).map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    if let Some(url) = cli.api_url.clone() {
        config.api.base_url = url;
    }
    if cli.actor.is_some() {
        config.session.actor_id = cli.actor;
    }
    config.validate()?;

    let client = ApiClient::new(&config.api)?;
    info!(api = client.base_url(), "Using release tracker API");

    match cli.command {
        Command::Serve { bind } => {
            let bind = match bind {
                Some(bind) => bind,
                None => config.server.bind.parse()?,
            };
            let mut dashboard =
                Dashboard::new(client, config.catalog.clone(), Scripted::new())
                    .with_actor(config.session.actor_id);
            dashboard.start().await;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let server = DashboardServer::bind(bind, dashboard, shutdown_rx).await?;
            println!("Dashboard available at http://{}", server.local_addr()?);

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down");
                    let _ = shutdown_tx.send(true);
                }
            });

            server.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let mut dashboard =
                Dashboard::new(client, config.catalog.clone(), Terminal::new(cli.yes))
                    .with_actor(config.session.actor_id);
            run_command(&mut dashboard, command, cli.html).await
        }
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Failed => ExitCode::FAILURE,
        Outcome::Done | Outcome::Cancelled => ExitCode::SUCCESS,
    }
}

fn print_section<I: Interaction>(dashboard: &Dashboard<I>, section: Section, html: bool) {
    let table = dashboard.state().table(section);
    if html {
        println!("{}", table.to_html());
    } else {
        print!("{}", table.to_text());
    }
}

fn print_user(user: &User) {
    println!("ID:        {}", user.id);
    println!("Username:  {}", user.username);
    println!("Email:     {}", user.email);
    println!("Full name: {}", user.full_name);
    println!("Role:      {}", user.role);
}

fn print_release(release: &Release) {
    println!("ID:          {}", release.id);
    println!("Version:     {}", release.version_number);
    println!("Description: {}", release.description);
    println!("Owner:       {}", release.owner.owner_label());
    println!("Environment: {}", release.current_environment);
    if let Some(created) = &release.created_at {
        println!("Created:     {}", render::format_date(created));
    }
    if let Some(updated) = &release.updated_at {
        println!("Updated:     {}", render::format_timestamp(updated));
    }
}

/// Run a one-shot command and print the resulting table
async fn run_command(
    dashboard: &mut Dashboard<Terminal>,
    command: Command,
    html: bool,
) -> anyhow::Result<ExitCode> {
    let outcome = match command {
        Command::Users(cmd) => {
            let outcome = match cmd {
                UsersCommand::List => dashboard.list_users().await,
                UsersCommand::Show { id } => {
                    return Ok(match dashboard.find_user(id).await {
                        Some(user) => {
                            print_user(&user);
                            ExitCode::SUCCESS
                        }
                        None => ExitCode::FAILURE,
                    });
                }
                UsersCommand::Create(fields) => dashboard.create_user(fields.into()).await,
                UsersCommand::Update { id, fields } => {
                    dashboard.update_user(id, fields.into()).await
                }
                UsersCommand::Delete { id } => dashboard.delete_user(id).await,
            };
            if outcome.is_done() {
                print_section(dashboard, Section::Users, html);
            }
            outcome
        }
        Command::Releases(cmd) => {
            let outcome = match cmd {
                ReleasesCommand::List => dashboard.navigate(Section::Releases).await,
                ReleasesCommand::Show { key, by_version } => {
                    let release = if by_version {
                        dashboard.find_release_by_version(&key).await
                    } else {
                        let id = key.parse::<i64>().map_err(|_| {
                            anyhow::anyhow!("'{}' is not a release id; use --by-version", key)
                        })?;
                        dashboard.find_release(id).await
                    };
                    return Ok(match release {
                        Some(release) => {
                            print_release(&release);
                            ExitCode::SUCCESS
                        }
                        None => ExitCode::FAILURE,
                    });
                }
                ReleasesCommand::Create(fields) => {
                    // The owner is resolved against the loaded users
                    dashboard.list_users().await;
                    dashboard.create_release(fields.into()).await
                }
                ReleasesCommand::Update { id, fields } => {
                    dashboard.list_users().await;
                    dashboard.update_release(id, fields.into()).await
                }
                ReleasesCommand::Promote { id } => dashboard.promote_release(id).await,
                ReleasesCommand::Rollback { id } => dashboard.rollback_release(id).await,
                ReleasesCommand::Delete { id } => dashboard.delete_release(id).await,
            };
            if outcome.is_done() {
                print_section(dashboard, Section::Releases, html);
            }
            outcome
        }
        Command::Logs(LogsCommand::List {
            environment,
            status,
            release,
        }) => {
            let outcome = match release {
                Some(release_id) => dashboard.show_release_logs(release_id).await,
                None => {
                    let outcome = dashboard.navigate(Section::Logs).await;
                    let filter = LogFilter {
                        environment: environment.map(Environment::new),
                        success: status,
                    };
                    if outcome.is_done() && !filter.is_empty() {
                        dashboard.apply_filters(filter);
                    }
                    outcome
                }
            };
            if outcome.is_done() {
                print_section(dashboard, Section::Logs, html);
            }
            outcome
        }
        Command::Page { section, out } => {
            let mut outcome = dashboard.start().await;
            if section != Section::Users {
                outcome = dashboard.navigate(section).await;
            }
            let document = page::render(
                dashboard.state(),
                dashboard.catalog(),
                &[],
                page::PageMode::Interactive,
            );
            match out {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    info!(path = %path.display(), section = %section, "Page written");
                }
                None => print!("{}", document),
            }
            outcome
        }
        Command::Console => {
            dashboard.start().await;
            print_section(dashboard, Section::Users, false);
            console::run(dashboard, &mut std::io::stdout()).await?;
            Outcome::Done
        }
        Command::Serve { .. } => anyhow::bail!("serve runs its own dashboard"),
    };

    Ok(exit_code(outcome))
}

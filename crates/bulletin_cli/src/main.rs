//! Command-line front for `bulletin_core`.
//!
//! Inspects route tables, runs the navigation pipeline against a path, and
//! manages announcements in a local SQLite mirror.

use bulletin_core::config::parse_revision;
use bulletin_core::db::open_db;
use bulletin_core::{
    core_version, init_logging, AnnouncementDraft, AnnouncementStore, AuthContext, CoreConfig,
    NavigationOutcome, NavigationPipeline, Role, RouteRevision, RouteTable, SqliteStorage,
};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "bulletin", version, about = "Community bulletin core tools")]
struct Cli {
    /// SQLite file holding the announcement mirror (overrides BULLETIN_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rotating log files (overrides BULLETIN_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flattened route table
    Routes {
        /// Route revision (1-5, default latest)
        #[arg(short, long)]
        revision: Option<String>,
    },
    /// Resolve a path through the standard navigation guards
    Resolve {
        path: String,
        #[arg(short, long)]
        revision: Option<String>,
        /// Signed-in username; anonymous when omitted
        #[arg(long)]
        user: Option<String>,
        /// Role of the signed-in user
        #[arg(long, default_value = "member", requires = "user")]
        role: String,
    },
    /// Manage stored announcements
    #[command(subcommand)]
    Announce(AnnounceCommand),
    /// Print the core version
    Version,
}

#[derive(Subcommand, Debug)]
enum AnnounceCommand {
    /// List announcements, newest first
    List,
    /// Add an announcement at the top of the list
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        body: String,
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Replace the announcement at INDEX
    Update {
        index: usize,
        title: String,
        #[arg(short, long, default_value = "")]
        body: String,
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Delete the announcement at INDEX
    Delete { index: usize },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, dir)?;
    }
    log::info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    match cli.command {
        Command::Routes { revision } => {
            let revision = pick_revision(revision.as_deref(), &config)?;
            print_routes(revision, &revision.table()?);
        }
        Command::Resolve {
            path,
            revision,
            user,
            role,
        } => {
            let revision = pick_revision(revision.as_deref(), &config)?;
            let auth = match user {
                Some(username) => {
                    let role =
                        Role::parse(&role).ok_or_else(|| format!("unknown role `{role}`"))?;
                    AuthContext::signed_in(username, role)
                }
                None => AuthContext::anonymous(),
            };
            let table = revision.table()?;
            print_outcome(NavigationPipeline::standard().navigate(&table, &path, &auth));
        }
        Command::Announce(command) => run_announce(command, &config)?,
        Command::Version => println!("bulletin_core {}", core_version()),
    }
    Ok(())
}

fn pick_revision(
    flag: Option<&str>,
    config: &CoreConfig,
) -> Result<RouteRevision, Box<dyn Error>> {
    match flag {
        Some(value) => Ok(parse_revision(value)?),
        None => Ok(config.route_revision),
    }
}

fn run_announce(command: AnnounceCommand, config: &CoreConfig) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&config.db_path)?;
    let mut store = AnnouncementStore::open(SqliteStorage::new(&conn));
    if let Some(issue) = store.startup_issue() {
        eprintln!("warning: {issue}");
    }

    match command {
        AnnounceCommand::List => {
            if store.is_empty() {
                println!("(no announcements)");
            }
            for (index, announcement) in store.announcements().iter().enumerate() {
                let author = announcement.author.as_deref().unwrap_or("-");
                println!(
                    "{index:>3}  {}  {}  [{author}]",
                    announcement.id, announcement.title
                );
            }
        }
        AnnounceCommand::Add {
            title,
            body,
            author,
        } => {
            let added = store.add(build_draft(title, body, author))?;
            println!("added {}", added.id);
        }
        AnnounceCommand::Update {
            index,
            title,
            body,
            author,
        } => {
            let updated = store.update_at(index, build_draft(title, body, author))?;
            println!("updated {}", updated.id);
        }
        AnnounceCommand::Delete { index } => {
            let removed = store.delete_at(index)?;
            println!("deleted {}", removed.id);
        }
    }
    Ok(())
}

fn build_draft(title: String, body: String, author: Option<String>) -> AnnouncementDraft {
    let draft = AnnouncementDraft::new(title, body);
    match author {
        Some(author) => draft.with_author(author),
        None => draft,
    }
}

fn print_routes(revision: RouteRevision, table: &RouteTable) {
    println!("route table {revision} ({} routes)", table.len());
    for record in table.records() {
        let target = match (&record.redirect, &record.view) {
            (Some(redirect), _) => format!("-> {redirect}"),
            (None, Some(view)) => view.to_string(),
            (None, None) => "(container)".to_string(),
        };
        let mut flags = Vec::new();
        if record.meta.requires_auth {
            flags.push("auth".to_string());
        }
        if let Some(role) = record.meta.role {
            flags.push(format!("role={role}"));
        }
        println!(
            "  {:<28} {:<24} {:<26} {}",
            record.pattern.as_str(),
            record.name.as_deref().unwrap_or("-"),
            target,
            flags.join(",")
        );
    }
}

fn print_outcome(outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::Arrived(route) => {
            println!("view     {}", route.view);
            println!("path     {}", route.full_path());
            if let Some(from) = &route.redirected_from {
                println!("from     {from}");
            }
            for (name, value) in &route.params {
                println!("param    {name}={value}");
            }
            println!("matched  {}", route.matched.join(" > "));
        }
        NavigationOutcome::Denied {
            path,
            guard,
            reason,
        } => println!("denied   {path} by {guard}: {reason}"),
        NavigationOutcome::NotFound(path) => println!("not found {path}"),
    }
}

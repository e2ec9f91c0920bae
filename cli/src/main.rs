use crit_cli::commands;
use crit_cli::logging;
use crit_cli::readline;
use crit_cli::{CliConfig, CliContext};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), String> {
    let (config, load_error) = CliConfig::load();
    logging::init(config.debug);
    if let Some(error) = load_error {
        tracing::warn!(%error, "Unreadable CLI config, using defaults");
    }
    let mut ctx = CliContext::new(config)?;

    // One-shot mode: `crit list`, `crit fire pc action --actor u1`, ...
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        run(args, &mut ctx).await?;
        return Ok(());
    }

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "critical roll notifications")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configurations in priority order
    List,
    Add {
        name: String,
        /// pc or adversary
        #[arg(short = 't', long = "type", default_value = "pc")]
        entity_type: String,
        #[arg(long, default_value = "Action and Reaction")]
        target: String,
        /// User id, or "all"
        #[arg(short, long)]
        user: Option<String>,
        /// Actor reference; omit for any adversary
        #[arg(short, long)]
        adversary: Option<String>,
    },
    /// Merge a JSON patch into an entry
    Update { id: String, patch: String },
    Delete { id: String },
    EnsureDefaults,
    /// Replace all configurations from a JSON array of form drafts
    Import { path: PathBuf },
    Show { id: String },
    Assign { id: String, actor: String },
    Unassign { id: String },
    /// Store one category (text, fx, sound, art) for an entry
    Set {
        id: String,
        category: String,
        json: String,
    },
    Clear { id: String, category: String },
    SetGlobal {
        entity_type: String,
        category: String,
        json: String,
    },
    Resolve {
        entity_type: String,
        tag: String,
        #[arg(short, long)]
        actor: Option<String>,
    },
    Fire {
        entity_type: String,
        tag: String,
        #[arg(short, long)]
        actor: Option<String>,
    },
    Preview { id: String },
    Stop,
    /// Feed a host event as JSON
    Event { json: String },
    DeleteMessage { id: String },
    Animations { state: Toggle },
    Debug { state: Toggle },
    Wait { ms: u64 },
    Config,
    SetConfig { key: String, value: String },
    Exit,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

async fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let args = shlex::split(line).ok_or("error: Invalid quoting")?;
    run(args, ctx).await
}

async fn run(mut args: Vec<String>, ctx: &mut CliContext) -> Result<bool, String> {
    args.insert(0, "crit".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::List) => commands::list_entries(ctx),
        Some(Commands::Add {
            name,
            entity_type,
            target,
            user,
            adversary,
        }) => commands::add_entry(
            ctx,
            name,
            entity_type,
            target,
            user.as_deref(),
            adversary.as_deref(),
        )?,
        Some(Commands::Update { id, patch }) => commands::update_entry(ctx, id, patch)?,
        Some(Commands::Delete { id }) => commands::delete_entry(ctx, id)?,
        Some(Commands::EnsureDefaults) => commands::ensure_defaults(ctx)?,
        Some(Commands::Import { path }) => commands::import_entries(ctx, path)?,
        Some(Commands::Show { id }) => commands::show_entry(ctx, id)?,
        Some(Commands::Assign { id, actor }) => commands::assign_adversary(ctx, id, actor)?,
        Some(Commands::Unassign { id }) => commands::clear_adversary(ctx, id)?,
        Some(Commands::Set { id, category, json }) => {
            commands::set_category(ctx, id, category, json)?
        }
        Some(Commands::Clear { id, category }) => commands::clear_category(ctx, id, category)?,
        Some(Commands::SetGlobal {
            entity_type,
            category,
            json,
        }) => commands::set_global(ctx, entity_type, category, json)?,
        Some(Commands::Resolve {
            entity_type,
            tag,
            actor,
        }) => {
            let trigger = commands::build_trigger(entity_type, actor.as_deref(), tag)?;
            commands::resolve(ctx, &trigger)?
        }
        Some(Commands::Fire {
            entity_type,
            tag,
            actor,
        }) => {
            let trigger = commands::build_trigger(entity_type, actor.as_deref(), tag)?;
            commands::fire(ctx, &trigger)
        }
        Some(Commands::Preview { id }) => commands::preview(ctx, id),
        Some(Commands::Stop) => commands::stop_effects(ctx),
        Some(Commands::Event { json }) => commands::host_event(ctx, json)?,
        Some(Commands::DeleteMessage { id }) => commands::delete_message(ctx, id),
        Some(Commands::Animations { state }) => commands::set_animations(ctx, state.is_on()),
        Some(Commands::Debug { state }) => commands::set_debug(ctx, state.is_on())?,
        Some(Commands::Wait { ms }) => commands::wait(*ms).await,
        Some(Commands::Config) => commands::show_config(ctx),
        Some(Commands::SetConfig { key, value }) => commands::set_config(ctx, key, value)?,
        Some(Commands::Exit) => {
            commands::exit()?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}

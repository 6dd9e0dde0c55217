//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use leadscout_core::{DiscoverRequest, DiscoveryService};
use leadscout_extract::{ExtractionEngine, OpenRouterClient};
use leadscout_search::{GoogleSearchProvider, SearchGateway, SerperProvider};
use leadscout_shared::{AppConfig, config_dir, init_config, load_config, validate_api_keys};
use leadscout_storage::Store;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LeadScout — find decision-maker contacts for any company.
#[derive(Parser)]
#[command(
    name = "leadscout",
    version,
    about = "Discover company profiles and key procurement/sales contacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover contacts for a company.
    Discover {
        /// Canonical (English) company name.
        #[arg(long)]
        name: String,

        /// Local-language company name.
        #[arg(long)]
        local_name: Option<String>,

        /// Country the company operates from.
        #[arg(long)]
        country: Option<String>,
    },

    /// List companies in the local database.
    List,

    /// Show a company's stored profile and contacts.
    Show {
        /// Company name.
        #[arg(long)]
        company: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadscout=info",
        1 => "leadscout=debug",
        _ => "leadscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Discover {
            name,
            local_name,
            country,
        } => cmd_discover(name, local_name, country).await,
        Command::List => cmd_list().await,
        Command::Show { company } => cmd_show(&company).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Resolve the database path from config (defaults under the config dir).
fn database_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.database_path {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir().map_err(|e| eyre!(e))?.join("leadscout.db")),
    }
}

/// Read an env var named by the config, defaulting to empty.
fn env_value(var_name: &str) -> String {
    std::env::var(var_name).unwrap_or_default()
}

/// Build the discovery service from config.
async fn build_service(config: &AppConfig) -> Result<(DiscoveryService, Arc<Store>)> {
    let store = Arc::new(
        Store::open(&database_path(config)?)
            .await
            .map_err(|e| eyre!(e))?,
    );

    let serper = SerperProvider::new(
        env_value(&config.search.serper_api_key_env),
        config.search.timeout_secs,
    )
    .map_err(|e| eyre!(e))?;

    let google = GoogleSearchProvider::new(
        env_value(&config.search.google_api_key_env),
        env_value(&config.search.google_cx_env),
        config.search.timeout_secs,
    )
    .map_err(|e| eyre!(e))?;

    let gateway = SearchGateway::new(Box::new(serper), Box::new(google));

    let model = OpenRouterClient::new(
        env_value(&config.model.api_key_env),
        config.model.default_model.clone(),
        config.model.timeout_secs,
    )
    .map_err(|e| eyre!(e))?;

    let engine = ExtractionEngine::new(Box::new(model));

    Ok((
        DiscoveryService::new(gateway, engine, store.clone()),
        store,
    ))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_discover(
    name: String,
    local_name: Option<String>,
    country: Option<String>,
) -> Result<()> {
    let config = load_config().map_err(|e| eyre!(e))?;
    validate_api_keys(&config).map_err(|e| eyre!(e))?;

    let (service, _store) = build_service(&config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Discovering contacts for {name}..."));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let request = DiscoverRequest {
        name,
        local_name,
        country,
    };
    let outcome = service.discover(&request).await.map_err(|e| eyre!(e))?;

    spinner.finish_and_clear();

    info!(company_id = %outcome.company_id, "discovery finished");

    println!("Company id: {}", outcome.company_id);
    println!(
        "Domain:     {}",
        outcome.domain.as_deref().unwrap_or("(not found)")
    );
    if outcome.served_from_cache {
        println!("Served from cache.");
    }
    println!("Contacts:   {}", outcome.contacts.len());
    println!();

    for (i, contact) in outcome.contacts.iter().enumerate() {
        println!("{}. {}", i + 1, contact.full_name.as_deref().unwrap_or("(unknown)"));
        if let Some(email) = &contact.email {
            println!("   email:      {email}");
        }
        if let Some(role) = &contact.role {
            println!("   role:       {role}");
        }
        println!("   department: {}", contact.department);
        println!("   confidence: {:.2}", contact.confidence);
        if let Some(linkedin) = &contact.linkedin_url {
            println!("   linkedin:   {linkedin}");
        }
        println!("   source:     {}", contact.source);
        println!();
    }

    Ok(())
}

async fn cmd_list() -> Result<()> {
    let config = load_config().map_err(|e| eyre!(e))?;
    let store = Store::open(&database_path(&config)?)
        .await
        .map_err(|e| eyre!(e))?;

    let companies = store.list_companies().await.map_err(|e| eyre!(e))?;
    if companies.is_empty() {
        println!("No companies discovered yet. Run `leadscout discover --name <company>`.");
        return Ok(());
    }

    for company in companies {
        println!(
            "{:<40} {:<12} {}",
            company.name,
            company.status,
            company.domain.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_show(name: &str) -> Result<()> {
    let config = load_config().map_err(|e| eyre!(e))?;
    let store = Store::open(&database_path(&config)?)
        .await
        .map_err(|e| eyre!(e))?;

    let company = store
        .get_company_by_name(name)
        .await
        .map_err(|e| eyre!(e))?
        .ok_or_else(|| eyre!("company not found: {name}"))?;

    println!("Name:       {}", company.name);
    if let Some(local) = &company.local_name {
        println!("Local name: {local}");
    }
    if let Some(country) = &company.country {
        println!("Country:    {country}");
    }
    println!("Status:     {}", company.status);
    println!("Domain:     {}", company.domain.as_deref().unwrap_or("-"));
    println!("Industry:   {}", company.industry.as_deref().unwrap_or("-"));
    if let Some(positioning) = &company.positioning {
        println!("Positioning:\n  {positioning}");
    }
    if let Some(brief) = &company.brief {
        println!("Brief:\n  {brief}");
    }
    if !company.public_emails.is_empty() {
        println!("Public emails: {}", company.public_emails.join(", "));
    }

    let contacts = store
        .contacts_for_company(&company.id)
        .await
        .map_err(|e| eyre!(e))?;
    println!("\nContacts ({}):", contacts.len());
    for contact in contacts {
        println!(
            "  {:<28} {:<32} {:<12} {:.2}",
            contact.full_name.as_deref().unwrap_or("(unknown)"),
            contact.email.as_deref().unwrap_or("-"),
            contact.department,
            contact.confidence
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config().map_err(|e| eyre!(e))?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config().map_err(|e| eyre!(e))?;
    let rendered = toml::to_string_pretty(&config).map_err(|e| eyre!(e))?;
    println!("{rendered}");
    Ok(())
}

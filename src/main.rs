use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use tenant_loader::cli::{check_auth, count_keys, load_tenant, recent_executions};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Tenant Loader: incremental, deduplicated bulk loads of per-tenant tables into a REST store
#[derive(Parser)]
#[command(name = "tload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Load manifest describing tenants and destination tables
    #[arg(short, long, global = true, default_value = "manifest/loader.yml")]
    manifest: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload new records from a table file for a tenant
    Load {
        /// Tenant slug from the manifest, or a tenant UUID
        tenant: String,

        /// JSON file mapping table names to arrays of records
        #[arg(default_value = "tables.json")]
        input: String,
    },

    /// Test that the configured principal may load data for a tenant
    Auth {
        /// Tenant slug from the manifest, or a tenant UUID
        tenant: String,
    },

    /// Count the keys already stored in a destination table
    Keys {
        /// Destination table name
        table: String,
    },

    /// Show recent executions for a tenant
    Logs {
        /// Tenant slug
        tenant: String,

        /// Number of executions to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if let Err(e) = dotenv {
        log::debug!("Not sourcing {}: {}", cli.env.bright_black(), e);
    }

    match cli.command {
        Commands::Load { tenant, input } => {
            log::info!(
                "Loading {} for tenant {}",
                input.bright_black(),
                tenant.cyan()
            );
            let report = load_tenant(&tenant, &input, &cli.manifest).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(error) = &report.error {
                log::error!("Load failed: {}", error);
                std::process::exit(1);
            }
            if !report.is_success() {
                log::warn!(
                    "Load finished with {} failed record(s) and {} failed table(s)",
                    report.failed_records.len().yellow(),
                    report.table_errors.len().yellow()
                );
            } else {
                log::info!(
                    "✓ Inserted {} record(s) for {}",
                    report.inserted_count.green(),
                    tenant.cyan()
                );
            }
        }
        Commands::Auth { tenant } => {
            log::info!("Testing authorization for {}", tenant.cyan());
            let tenant_key = check_auth(&tenant, &cli.manifest).await?;
            log::info!("✓ Authorized for tenant {}", tenant_key.green());
        }
        Commands::Keys { table } => {
            let count = count_keys(&table, &cli.manifest).await?;
            log::info!("✓ {} holds {} key(s)", table.cyan(), count.green());
        }
        Commands::Logs { tenant, limit } => {
            let entries = recent_executions(&tenant, limit)?;
            if entries.is_empty() {
                log::info!("No executions logged for {}", tenant.cyan());
            }
            for entry in entries {
                let status = match entry.success {
                    true => "ok".green().to_string(),
                    false => "failed".red().to_string(),
                };
                let inserted = entry
                    .report
                    .as_ref()
                    .map(|r| r.inserted_count)
                    .unwrap_or_default();
                println!(
                    "{} {} {} inserted{}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    status,
                    inserted,
                    entry
                        .error
                        .map(|e| format!(" ({})", e))
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

mod config;
mod show;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args as ClapArgs, CommandFactory as _, Parser, Subcommand};
use pnl_forecast::model::VersionId;
use pnl_forecast::{
    AggregateRequest, CopyRequest, FillRequest, MemoryStore, Month, StatementScope,
    StatementStore as _, versions,
};

use config::Config;

const DEFAULT_STORE: &str = "pnl-forecast.json";

#[derive(Parser)]
#[command(
    name = "pnl-forecast",
    about = "Fill and reconcile P&L forecasts between statement versions"
)]
#[command(disable_help_subcommand = true)]
struct Args {
    /// JSON data file. Defaults to the `store` of pnl-forecast.toml.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs)]
struct ScopeArgs {
    #[arg(short, long)]
    branch: String,
    #[arg(short, long)]
    department: String,
    #[arg(short, long)]
    year: i32,
}

impl ScopeArgs {
    fn scope(&self) -> StatementScope {
        StatementScope::new(&self.branch, &self.department, self.year)
    }
}

#[derive(ClapArgs)]
struct TransferArgs {
    #[command(flatten)]
    scope: ScopeArgs,
    /// Version to read from
    #[arg(short, long)]
    source: VersionId,
    /// Version to write to. Defaults to the draft.
    #[arg(short, long)]
    target: Option<VersionId>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Copy the forecast months of a version into the draft or another version
    Fill(TransferArgs),
    /// Copy the row layout of a version without its values
    CopyStructure(TransferArgs),
    /// Sum one section across departments
    Aggregate {
        #[arg(short, long)]
        branch: String,
        #[arg(short, long)]
        year: i32,
        #[arg(short, long = "department", required = true)]
        departments: Vec<String>,
        #[arg(long, default_value = "Income")]
        section: String,
        /// Sum a saved version instead of the drafts
        #[arg(long)]
        version: Option<VersionId>,
    },
    /// List the saved versions of a statement
    Versions(ScopeArgs),
    /// Save the draft as a new version
    SaveVersion {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(short, long)]
        name: String,
        /// Number of leading months holding actuals
        #[arg(short, long, default_value_t = 0)]
        actual_months: u8,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Lock a version against changes
    Lock(VersionArgs),
    Unlock(VersionArgs),
    /// Replace the notes of a version
    Notes {
        #[command(flatten)]
        version: VersionArgs,
        /// New notes; omit to clear them
        notes: Option<String>,
    },
    /// Delete an unlocked version and its rows
    DeleteVersion(VersionArgs),
    /// Record which months of the draft were imported as actuals
    RecordImport {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(short, long)]
        file: String,
        #[arg(short, long, value_delimiter = ',', value_parser = parse_month)]
        months: Vec<Month>,
    },
}

#[derive(ClapArgs)]
struct VersionArgs {
    #[command(flatten)]
    scope: ScopeArgs,
    #[arg(short, long)]
    version: VersionId,
}

fn parse_month(value: &str) -> Result<Month, String> {
    let value = value.trim().to_lowercase();
    Month::ALL
        .into_iter()
        .find(|month| month.key() == value)
        .ok_or_else(|| format!("unknown month '{value}', expected jan..dec"))
}

pub async fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pnl_forecast=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);
    let config = Config::find_and_load()?;
    let store_path = args
        .store
        .or_else(|| config.as_ref().map(|config| config.store.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));

    match args.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let port = port
                .or_else(|| config.as_ref().and_then(|config| config.server.port))
                .unwrap_or(pnl_forecast_web::DEFAULT_PORT);
            pnl_forecast_web::run(store_path, port).await
        }
        command => {
            let store = MemoryStore::open(&store_path)?;
            if execute(&store, command).await? {
                store.save(&store_path)?;
            }
            Ok(())
        }
    }
}

/// Run one command against the loaded store. Returns whether the store changed.
async fn execute(store: &MemoryStore, command: Commands) -> Result<bool> {
    let changed = match command {
        Commands::Serve { .. } => bail!("the server loads the data file itself"),
        Commands::Fill(transfer) => {
            let request = FillRequest {
                branch_id: transfer.scope.branch,
                department: transfer.scope.department,
                year: transfer.scope.year,
                source_version_id: transfer.source,
                target_version_id: transfer.target,
            };
            let report = pnl_forecast::fill_forecast(store, &request).await?;
            show::show_fill(&report);
            report.updated_count > 0 || report.inserted_count > 0
        }
        Commands::CopyStructure(transfer) => {
            let request = CopyRequest {
                branch_id: transfer.scope.branch,
                department: transfer.scope.department,
                year: transfer.scope.year,
                source_version_id: transfer.source,
                target_version_id: transfer.target,
            };
            let report = pnl_forecast::copy_structure(store, &request).await?;
            show::show_copy(&report);
            report.inserted_count > 0 || report.reordered_count > 0
        }
        Commands::Aggregate {
            branch,
            year,
            departments,
            section,
            version,
        } => {
            let request = AggregateRequest {
                branch_id: branch,
                year,
                departments,
                section,
                version_id: version,
            };
            let aggregate = pnl_forecast::aggregate_section(store, &request).await?;
            show::show_aggregate(&aggregate);
            false
        }
        Commands::Versions(scope) => {
            let saved = store.list_versions(&scope.scope()).await?;
            show::show_versions(&saved);
            false
        }
        Commands::SaveVersion {
            scope,
            name,
            actual_months,
            notes,
        } => {
            let version =
                versions::save_version(store, &scope.scope(), &name, actual_months, notes).await?;
            println!("Saved version {} ({})", version.id, version.version_name);
            true
        }
        Commands::Lock(args) => {
            versions::set_locked(store, &args.scope.scope(), args.version, true).await?;
            true
        }
        Commands::Unlock(args) => {
            versions::set_locked(store, &args.scope.scope(), args.version, false).await?;
            true
        }
        Commands::Notes { version, notes } => {
            versions::set_notes(store, &version.scope.scope(), version.version, notes).await?;
            true
        }
        Commands::DeleteVersion(args) => {
            versions::delete_version(store, &args.scope.scope(), args.version).await?;
            true
        }
        Commands::RecordImport {
            scope,
            file,
            months,
        } => {
            versions::record_import(store, &scope.scope(), &file, months).await?;
            true
        }
    };

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_month_lists() {
        let args = Args::parse_from([
            "pnl-forecast",
            "record-import",
            "-b",
            "north",
            "-d",
            "maintenance",
            "-y",
            "2025",
            "--file",
            "q1.csv",
            "--months",
            "jan,Feb, mar",
        ]);
        let Some(Commands::RecordImport { months, .. }) = args.command else {
            panic!("expected record-import");
        };
        assert_eq!(months, [Month::Jan, Month::Feb, Month::Mar]);
    }

    #[test]
    fn store_flag_is_global() {
        let args = Args::parse_from([
            "pnl-forecast",
            "fill",
            "-b",
            "north",
            "-d",
            "maintenance",
            "-y",
            "2025",
            "--source",
            "3",
            "--store",
            "other.json",
        ]);
        assert_eq!(args.store, Some(PathBuf::from("other.json")));
        assert!(matches!(
            args.command,
            Some(Commands::Fill(TransferArgs { source: 3, target: None, .. }))
        ));
    }

    #[test]
    fn command_line_is_consistent() {
        Args::command().debug_assert();
    }
}

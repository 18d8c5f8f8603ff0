//! Command line interface.
//!
//! Every command opens the store, does its work and saves only if something
//! changed. Output goes to the writer handed to [`run`].

use crate::allocator::expand_subnet;
use crate::config::Settings;
use crate::models::{AddressKind, LookupKind, ServerInput};
use crate::output::{export_csv, format_field, print_pools, print_servers};
use crate::store::{ImportDocument, OrderBy, ServerQuery, ServerStore, SortOrder, StoreError};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Data-center server registry and address allocator")]
pub struct Cli {
    /// Store file (overrides DC_SERVERS_STORE)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List usable host addresses of a subnet
    Expand {
        cidr: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Check whether an address may be used
    Allowed {
        kind: AddressKind,
        address: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// Suggest the next unused address
    NextFree {
        kind: AddressKind,
        #[arg(long)]
        host: Option<String>,
    },
    /// Validate server fields without saving
    Validate(ServerArgs),
    /// List servers
    List(ListArgs),
    /// Add a server
    Add(ServerArgs),
    /// Update a server
    Update {
        id: u64,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Move servers to the trash
    Delete { ids: Vec<u64> },
    /// Bring a server back from the trash
    Restore { id: u64 },
    /// Delete servers permanently
    Purge(PurgeArgs),
    /// Copy a server with freshly allocated addresses
    Duplicate { id: u64 },
    /// Export all servers, trash included, as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import servers from JSON: an array of keyed rows, or {"headers": [..], "rows": [[..]]}
    Import { file: PathBuf },
    /// Manage host and farm lookup tables
    #[command(subcommand)]
    Lookup(LookupCommand),
    /// Manage internal and WAN pools
    #[command(subcommand)]
    Pool(PoolCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long)]
    pub customer: u64,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub internal: String,
    #[arg(long)]
    pub wan: String,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub farm: Option<String>,
}

impl From<ServerArgs> for ServerInput {
    fn from(args: ServerArgs) -> Self {
        ServerInput {
            customer_id: args.customer,
            server_name: args.name,
            ip_internal: args.internal,
            ip_wan: args.wan,
            host: args.host,
            farm: args.farm,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Include servers in the trash
    #[arg(long)]
    pub deleted: bool,
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, default_value = "server_name")]
    pub order_by: String,
    #[arg(long)]
    pub desc: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PurgeArgs {
    /// Delete this server only
    #[arg(long, conflicts_with = "expired")]
    pub id: Option<u64>,
    /// Only trash older than the retention period
    #[arg(long)]
    pub expired: bool,
}

#[derive(Subcommand, Debug)]
pub enum LookupCommand {
    Add { kind: LookupKind, name: String },
    Remove { kind: LookupKind, id: u64 },
    List { kind: LookupKind },
}

#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    AddInternal {
        address: String,
        #[arg(long)]
        host: Option<String>,
    },
    RemoveInternal { address: String },
    AddWan { cidr: String },
    RemoveWan { cidr: String },
    List,
}

/// Run one command against the store named by `settings` (or `--store`).
pub fn run<W: Write>(cli: Cli, mut settings: Settings, out: &mut W) -> Result<(), Box<dyn Error>> {
    if let Some(path) = cli.store {
        settings.store_file = path;
    }
    log::debug!("run({:?})", cli.command);

    // Pure subnet math needs no store.
    if let Commands::Expand { cidr, limit } = &cli.command {
        for ip in expand_subnet(cidr, limit.unwrap_or(settings.expand_limit)) {
            writeln!(out, "{ip}")?;
        }
        return Ok(());
    }

    let mut store = ServerStore::open(&settings)?;
    let changed = dispatch(cli.command, &mut store, &settings, out)?;
    if changed {
        store.save()?;
    }
    Ok(())
}

fn report_store_error<W: Write>(out: &mut W, err: StoreError) -> Result<bool, Box<dyn Error>> {
    match err {
        StoreError::Invalid(errors) => {
            for message in errors.messages() {
                writeln!(out, "{} {message}", "error:".red())?;
            }
            Err(format!("{} validation errors", errors.len()).into())
        }
        other => Err(other.into()),
    }
}

/// Returns whether the store was modified.
fn dispatch<W: Write>(
    command: Commands,
    store: &mut ServerStore,
    settings: &Settings,
    out: &mut W,
) -> Result<bool, Box<dyn Error>> {
    match command {
        Commands::Expand { .. } => Ok(false),
        Commands::Allowed { kind, address, host } => {
            let allowed = store
                .allocator()
                .is_address_allowed(kind, &address, host.as_deref());
            writeln!(out, "{}", if allowed { "allowed".green() } else { "not allowed".red() })?;
            Ok(false)
        }
        Commands::NextFree { kind, host } => {
            match store.allocator().next_free_address(kind, host.as_deref()) {
                Some(address) => writeln!(out, "{address}")?,
                None => writeln!(out, "{}", "no free address".red())?,
            }
            Ok(false)
        }
        Commands::Validate(args) => match store.validate(&args.into(), None) {
            Ok(()) => {
                writeln!(out, "{}", "valid".green())?;
                Ok(false)
            }
            Err(errors) => report_store_error(out, errors.into()),
        },
        Commands::List(args) => {
            let rows = store.list(&ServerQuery {
                include_deleted: args.deleted,
                search: args.search,
                order_by: OrderBy::from(args.order_by.as_str()),
                order: if args.desc { SortOrder::Desc } else { SortOrder::Asc },
            });
            print_servers(&rows, settings.timezone, out)?;
            Ok(false)
        }
        Commands::Add(args) => match store.add_or_update(&args.into(), None) {
            Ok(id) => {
                writeln!(out, "added server {id}")?;
                Ok(true)
            }
            Err(e) => report_store_error(out, e),
        },
        Commands::Update { id, server } => match store.add_or_update(&server.into(), Some(id)) {
            Ok(id) => {
                writeln!(out, "updated server {id}")?;
                Ok(true)
            }
            Err(e) => report_store_error(out, e),
        },
        Commands::Delete { ids } => {
            let count = store.soft_delete_bulk(&ids);
            writeln!(out, "moved {count} servers to trash")?;
            Ok(count > 0)
        }
        Commands::Restore { id } => match store.restore(id) {
            Ok(()) => {
                writeln!(out, "restored server {id}")?;
                Ok(true)
            }
            Err(e) => report_store_error(out, e),
        },
        Commands::Purge(args) => {
            let removed = match (args.id, args.expired) {
                (Some(id), _) => usize::from(store.delete_permanent(id)),
                (None, true) => store.purge_expired(Utc::now(), settings.trash_retention_days),
                (None, false) => store.purge_trash(),
            };
            writeln!(out, "deleted {removed} servers permanently")?;
            Ok(removed > 0)
        }
        Commands::Duplicate { id } => match store.duplicate(id) {
            Ok(copy) => {
                writeln!(out, "duplicated server {id} as {copy}")?;
                Ok(true)
            }
            Err(e) => report_store_error(out, e),
        },
        Commands::Export { output } => {
            let rows = store.list(&ServerQuery {
                include_deleted: true,
                ..Default::default()
            });
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(&path)
                        .map_err(|e| format!("Error creating {}: {e}", path.display()))?;
                    export_csv(&rows, settings.timezone, &mut file)?;
                    writeln!(out, "exported {} servers to {}", rows.len(), path.display())?;
                }
                None => export_csv(&rows, settings.timezone, out)?,
            }
            Ok(false)
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .map_err(|e| format!("Error reading {}: {e}", file.display()))?;
            let mut deserializer = serde_json::Deserializer::from_str(&json);
            let document: ImportDocument = serde_path_to_error::deserialize(&mut deserializer)
                .map_err(|e| format!("Error parsing {}: path={} error={}", file.display(), e.path(), e))?;
            let rows = document.into_rows();
            let report = store.import_rows(&rows);
            for message in &report.errors {
                writeln!(out, "{} {message}", "error:".red())?;
            }
            writeln!(out, "imported {} of {} rows", report.inserted, rows.len())?;
            Ok(report.inserted > 0)
        }
        Commands::Lookup(command) => lookup(command, store, out),
        Commands::Pool(command) => pool(command, store, out),
    }
}

fn lookup<W: Write>(command: LookupCommand, store: &mut ServerStore, out: &mut W) -> Result<bool, Box<dyn Error>> {
    match command {
        LookupCommand::Add { kind, name } => {
            let id = store.save_lookup(kind, &name)?;
            writeln!(out, "saved {kind} {id}")?;
            Ok(true)
        }
        LookupCommand::Remove { kind, id } => {
            let removed = store.delete_lookup(kind, id)?;
            writeln!(out, "removed {kind} '{}'", removed.name)?;
            Ok(true)
        }
        LookupCommand::List { kind } => {
            for entry in store.lookups(kind) {
                writeln!(out, "{},{}", format_field(entry.id, 6), format_field(&entry.name, 20))?;
            }
            Ok(false)
        }
    }
}

fn pool<W: Write>(command: PoolCommand, store: &mut ServerStore, out: &mut W) -> Result<bool, Box<dyn Error>> {
    match command {
        PoolCommand::AddInternal { address, host } => {
            store.add_internal_pool(&address, host.as_deref())?;
            Ok(true)
        }
        PoolCommand::RemoveInternal { address } => {
            let removed = store.remove_internal_pool(&address);
            if !removed {
                writeln!(out, "{} {address} is not in the internal pool", "warning:".yellow())?;
            }
            Ok(removed)
        }
        PoolCommand::AddWan { cidr } => {
            store.add_wan_subnet(&cidr)?;
            Ok(true)
        }
        PoolCommand::RemoveWan { cidr } => {
            let removed = store.remove_wan_subnet(&cidr);
            if !removed {
                writeln!(out, "{} {cidr} is not in the WAN pool", "warning:".yellow())?;
            }
            Ok(removed)
        }
        PoolCommand::List => {
            print_pools(&store.allocator(), out)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dc-servers").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_parse_allowed() {
        let cli = parse(&["allowed", "internal", "172.16.5.1", "--host", "HostA"]);
        match cli.command {
            Commands::Allowed { kind, address, host } => {
                assert_eq!(kind, AddressKind::Internal);
                assert_eq!(address, "172.16.5.1");
                assert_eq!(host.as_deref(), Some("HostA"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["dc-servers", "next-free", "lan"]).is_err());
    }

    #[test]
    fn test_parse_purge_conflict() {
        assert!(Cli::try_parse_from(["dc-servers", "purge", "--id", "3", "--expired"]).is_err());
    }

    #[test]
    fn test_expand_needs_no_store() {
        let cli = parse(&["--store", "/nonexistent/dir/store.json", "expand", "10.0.0.0/30"]);
        let mut out = Vec::new();
        run(cli, Settings::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10.0.0.1\n10.0.0.2\n");
    }
}

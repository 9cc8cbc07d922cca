use anyhow::{bail, Context, Result};
use cartola_core::{format_amount, Directive, StatementMetadata, StatementTransaction};
use cartola_importer::BancoChileImporter;
use cartola_ingest::extract_file_with;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

mod config;
mod state;

use config::{load_config, Config};

#[derive(Parser, Debug)]
#[command(
    name = "cartola",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARTOLA_BUILD_SHA"), ")"),
    about = "Banco de Chile cartolas to plain-text ledger entries"
)]
struct Cli {
    /// Config file (default: ~/.cartola/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print which configured account each file belongs to
    Identify {
        /// Files or directories (one level deep)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print ledger entries for every identified file
    Extract {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Move identified files to <dest>/<account path>/<canonical name>
    Archive {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long)]
        dest: PathBuf,

        /// Only print the moves
        #[arg(long)]
        dry_run: bool,
    },

    /// Dump the raw statement (header + rows) without ledger mapping
    Dump {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },

    /// Manage ~/.cartola/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    Json,
    Csv,
}

#[derive(Serialize)]
struct Dump<'a> {
    metadata: &'a StatementMetadata,
    transactions: &'a [StatementTransaction],
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Identify { paths } => {
            let cfg = load_config(config_path)?;
            let importers = cfg.importers();
            for file in collect_files(&paths)? {
                if let Some(imp) = find_importer(&importers, &file) {
                    println!("{}: {}", file.display(), imp.account(&file));
                }
            }
        }

        Command::Extract { paths } => {
            let cfg = load_config(config_path)?;
            extract_all(&cfg.importers(), &collect_files(&paths)?, &mut io::stdout().lock())?;
        }

        Command::Archive {
            paths,
            dest,
            dry_run,
        } => {
            let cfg = load_config(config_path)?;
            let importers = cfg.importers();
            for file in collect_files(&paths)? {
                let Some(imp) = find_importer(&importers, &file) else {
                    continue;
                };
                let Some(target) = archive_target(imp, &file, &dest) else {
                    warn!(path = %file.display(), "no statement date, not archiving");
                    continue;
                };
                println!("{} -> {}", file.display(), target.display());
                if !dry_run {
                    move_file(&file, &target)?;
                }
            }
        }

        Command::Dump { path, format } => {
            let cfg = load_config(config_path)?;
            let (metadata, transactions) = extract_file_with(&path, &cfg.extract_options())
                .with_context(|| format!("extracting {}", path.display()))?;
            let dump = Dump {
                metadata: &metadata,
                transactions: &transactions,
            };
            write_dump(&dump, format, &mut io::stdout().lock())?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_path)?,
            ConfigCommand::Show => {
                let cfg: Config = load_config(config_path)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean ledger text.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Files as given; directories expand to their direct children, sorted.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for p in paths {
        if p.is_dir() {
            let mut children: Vec<PathBuf> = fs::read_dir(p)
                .with_context(|| format!("read dir {}", p.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|child| child.is_file())
                .collect();
            children.sort();
            out.extend(children);
        } else if p.exists() {
            out.push(p.clone());
        } else {
            bail!("not found: {}", p.display());
        }
    }
    Ok(out)
}

fn find_importer<'a>(importers: &'a [BancoChileImporter], file: &Path) -> Option<&'a BancoChileImporter> {
    let found = importers.iter().find(|imp| imp.identify(file));
    if found.is_none() {
        debug!(path = %file.display(), "no importer matched");
    }
    found
}

/// Extract every identified file; a file that fails is logged and skipped.
fn extract_all(importers: &[BancoChileImporter], files: &[PathBuf], out: &mut impl Write) -> Result<()> {
    for file in files {
        let Some(imp) = find_importer(importers, file) else {
            continue;
        };
        match imp.extract(file) {
            Ok(entries) => {
                let closing = closing_balance(&entries).unwrap_or_default();
                info!(path = %file.display(), entries = entries.len(), %closing, "extracted");
                writeln!(out, ";; {}\n", file.display())?;
                for entry in &entries {
                    writeln!(out, "{entry}")?;
                }
            }
            Err(e) => warn!(path = %file.display(), error = %format!("{e:#}"), "skipping file"),
        }
    }
    Ok(())
}

/// The balance assertion's amount, e.g. `"300000.00 CLP"`.
fn closing_balance(entries: &[Directive]) -> Option<String> {
    entries.iter().find_map(|entry| match entry {
        Directive::Balance(b) => Some(format_amount(Some(b.amount), &b.currency)),
        Directive::Transaction(_) => None,
    })
}

/// `<dest>/Assets/BancoChile/Checking/2024-03-15_banco_chile_001234567890.xls`
fn archive_target(imp: &BancoChileImporter, file: &Path, dest: &Path) -> Option<PathBuf> {
    let name = imp.filename(file)?;
    let mut target = dest.to_path_buf();
    target.extend(imp.account(file).split(':'));
    target.push(name);
    Some(target)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        bail!("refusing to overwrite {}", to.display());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::rename(from, to)
        .or_else(|_| fs::copy(from, to).and_then(|_| fs::remove_file(from)))
        .with_context(|| format!("move {} -> {}", from.display(), to.display()))
}

fn write_dump(dump: &Dump<'_>, format: DumpFormat, out: &mut impl Write) -> Result<()> {
    match format {
        DumpFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, dump)?;
            writeln!(out)?;
        }
        DumpFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for txn in dump.transactions {
                wtr.serialize(txn)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

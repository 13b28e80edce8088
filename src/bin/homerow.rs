// Homerow CLI
// Loads a TOML config, compiles it and prints the resulting rules

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use homerow_core::{compile, CompiledKeymap, Config};

/// Home-row modifier and layer rule compiler
#[derive(Parser, Debug)]
#[command(name = "homerow")]
#[command(author = "homerow contributors")]
#[command(version)]
#[command(about = "Compile home-row modifier and layer configs into remapping rules", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to <config dir>/homerow/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Validate and compile the config, then exit
    #[arg(long)]
    check_config: bool,

    /// Only print the rules for this key
    #[arg(short, long, value_name = "KEY")]
    key: Option<String>,

    /// Print rule counts per key and per kind instead of the rules
    #[arg(short, long)]
    summary: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::default_path()
                .context("no --config given and no user config directory is available"),
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn print_summary(keymap: &CompiledKeymap) {
    println!("{} keys, {} rules", keymap.key_count(), keymap.rule_count());
    println!();
    for set in keymap {
        println!("  {:<16} {:>4}", set.key(), set.len());
    }
    println!();
    for (kind, count) in keymap.kind_counts() {
        println!("  {:<24} {:>5}", kind.to_string(), count);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config_path = args.config_path()?;
    log::debug!("Loading config from {}", config_path.display());

    let config = Config::from_toml_path(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let keymap = compile(&config)
        .with_context(|| format!("failed to compile config {}", config_path.display()))?;

    if args.check_config {
        println!(
            "Configuration is valid: {} keys, {} rules, {} warnings",
            keymap.key_count(),
            keymap.rule_count(),
            keymap.diagnostics().len()
        );
        return Ok(());
    }

    if args.summary {
        print_summary(&keymap);
        return Ok(());
    }

    match &args.key {
        Some(key) => match keymap.rules_for(key) {
            Some(set) => print!("{}", set),
            None => bail!("key '{}' is not in the layout or a layer trigger", key),
        },
        None => print!("{}", keymap),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}

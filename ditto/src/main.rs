//! Ditto CLI Application
//!
//! Generates look-alike domains for a target, checks which ones are
//! registered and shows where the registered ones point. This binary is a
//! thin front end over ditto-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use ditto_lib::{load_env_config, ConfigManager, EnvConfig, FileConfig};
use ditto_lib::{parse_target, parse_timeout_string, Dictionary, DittoError, Filter, ScanConfig};
use ditto_lib::{ProgressFn, ScanReport, Scanner, Target, MAX_CONCURRENCY};
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for ditto
#[derive(Parser, Debug)]
#[command(name = "ditto")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find registered look-alike domains of a target")]
#[command(
    long_about = "Generate homoglyph and typo variations of a domain, check which ones are registered over WHOIS or RDAP, and resolve the registered ones.\n\nThe target can be a bare domain or a URL; only the registrable label is permuted."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Target domain or URL (e.g. example.com, https://www.example.com/login)
    #[arg(value_name = "DOMAIN")]
    pub domain: String,

    /// Maximum number of variations to check (0 = all)
    #[arg(short = 'l', long = "limit", value_name = "N", help_heading = "Generation")]
    pub limit: Option<usize>,

    /// Print the generated variations and exit without any lookups
    #[arg(long = "dry-run", help_heading = "Generation")]
    pub dry_run: bool,

    /// Only show available variations
    #[arg(long = "available", help_heading = "Filtering")]
    pub available: bool,

    /// Only show registered variations
    #[arg(long = "registered", help_heading = "Filtering")]
    pub registered: bool,

    /// Only show registered variations that resolve to an address
    #[arg(long = "live", help_heading = "Filtering")]
    pub live: bool,

    /// Show registration details (also adds registration columns to the CSV)
    #[arg(short = 'w', long = "whois", help_heading = "Output")]
    pub whois: bool,

    /// Save every result to this CSV file
    #[arg(long = "csv", value_name = "FILE", help_heading = "Output")]
    pub csv: Option<String>,

    /// Print the report as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long = "no-progress", help_heading = "Output")]
    pub no_progress: bool,

    /// Concurrent lookups (0 = one per CPU core, max 512)
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Lookup")]
    pub concurrency: Option<usize>,

    /// Registration lookup protocol
    #[arg(long = "protocol", value_name = "whois|rdap", help_heading = "Lookup")]
    pub protocol: Option<String>,

    /// Per-lookup timeout (e.g. 5s, 1m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Lookup")]
    pub timeout: Option<String>,

    /// DNS query timeout (e.g. 3s)
    #[arg(long = "dns-timeout", value_name = "DURATION", help_heading = "Lookup")]
    pub dns_timeout: Option<String>,

    /// Do not follow registrar WHOIS referrals
    #[arg(long = "no-referral", help_heading = "Lookup")]
    pub no_referral: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything a run needs after config files, environment and flags are merged.
#[derive(Debug)]
struct RunSettings {
    scan: ScanConfig,
    dictionary: Dictionary,
    filter: Filter,
    whois_info: bool,
    csv_file: Option<String>,
    json_pretty: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,ditto=debug,ditto_lib=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<(), DittoError> {
    // Everything fatal is checked before generation starts.
    let target = parse_target(&args.domain)?;
    let settings = build_settings(&args)?;

    if args.dry_run {
        return print_dry_run(&args, &target, &settings);
    }

    let scanner = Scanner::new(settings.scan.clone())?;
    let candidates = scanner.generate(&target, &settings.dictionary);
    let total = candidates.len();

    if args.json {
        eprintln!("{}", ui::header_line(total, &target));
    } else {
        ui::print_header(total, &target);
    }

    let progress_bar = ui::create_progress_bar(total, args.no_progress);
    let bar = progress_bar.clone();
    let progress: ProgressFn = Arc::new(move |done: usize, _total: usize| {
        bar.set_position(done as u64);
    });

    let started = Instant::now();
    let resolved = scanner.resolve_all(candidates, Some(progress)).await?;
    progress_bar.finish_and_clear();

    let report = ScanReport::new(target, resolved);

    if args.json {
        print_json(&report, &settings)?;
    } else {
        print_text(&report, &settings, started.elapsed());
    }

    if let Some(path) = &settings.csv_file {
        save_csv(&report, path, settings.whois_info)?;
        if args.json {
            eprintln!("saved to {}", path);
        } else {
            println!("\nsaved to {}", path);
        }
    }

    Ok(())
}

/// Merge built-in defaults, config file, environment and CLI flags, in that order.
fn build_settings(args: &Args) -> Result<RunSettings, DittoError> {
    let filter = Filter::from_flags(args.available, args.registered, args.live)?;
    validate_args(args)?;

    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;

    let mut dictionary = Dictionary::homoglyphs();
    if let Some(extra) = &file_config.dictionary {
        dictionary.merge_strings(extra)?;
    }

    let defaults = file_config.defaults.unwrap_or_default();
    let output = file_config.output.unwrap_or_default();

    let scan = env_config.apply_to(defaults.apply_to(ScanConfig::default()));
    let scan = apply_cli_args_to_config(scan, args)?;

    Ok(RunSettings {
        scan,
        dictionary,
        filter,
        whois_info: args.whois || defaults.whois_info.unwrap_or(false),
        csv_file: args.csv.clone().or(env_config.csv).or(output.csv_file),
        json_pretty: output.json_pretty.unwrap_or(true),
    })
}

/// Reject flag values the library would otherwise silently clamp.
fn validate_args(args: &Args) -> Result<(), DittoError> {
    if let Some(concurrency) = args.concurrency {
        if concurrency > MAX_CONCURRENCY {
            return Err(DittoError::config(format!(
                "Concurrency must be between 0 and {}",
                MAX_CONCURRENCY
            )));
        }
    }

    for timeout in [&args.timeout, &args.dns_timeout].into_iter().flatten() {
        if parse_timeout_string(timeout).is_none() {
            return Err(DittoError::config(format!(
                "Invalid timeout '{}'. Use a positive duration like '5s', '30s', '2m'",
                timeout
            )));
        }
    }

    if let Some(path) = &args.csv {
        if path.trim().is_empty() {
            return Err(DittoError::config("CSV file name cannot be empty"));
        }
    }

    Ok(())
}

/// `--config`, then `DITTO_CONFIG`, then discovery.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, DittoError> {
    let config_manager = ConfigManager::new(args.verbose);

    if let Some(path) = &args.config {
        tracing::debug!("Using config file from --config: {}", path);
        return config_manager.load_file(path);
    }

    if let Some(path) = &env_config.config {
        tracing::debug!("Using config file from DITTO_CONFIG: {}", path);
        return config_manager.load_file(path);
    }

    Ok(config_manager.discover_and_load())
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(
    mut config: ScanConfig,
    args: &Args,
) -> Result<ScanConfig, DittoError> {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(limit) = args.limit {
        config = config.with_limit(limit);
    }
    if let Some(protocol) = &args.protocol {
        config = config.with_protocol(protocol.parse()?);
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_lookup_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = args.dns_timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_dns_timeout(Duration::from_secs(secs));
    }
    if args.no_referral {
        config = config.with_follow_referral(false);
    }
    Ok(config)
}

fn print_dry_run(args: &Args, target: &Target, settings: &RunSettings) -> Result<(), DittoError> {
    let candidates =
        ditto_lib::generate_candidates(target, &settings.dictionary, settings.scan.limit);

    if args.json {
        let domains: Vec<&str> = candidates.iter().map(|c| c.domain.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&domains)?);
    } else {
        for candidate in &candidates {
            println!("{}", candidate.domain);
        }
    }

    eprintln!(
        "{} variations of '{}' would be checked",
        candidates.len(),
        target
    );
    Ok(())
}

fn print_text(report: &ScanReport, settings: &RunSettings, duration: Duration) {
    for candidate in report.filtered(settings.filter) {
        ui::print_candidate(candidate, settings.whois_info);
    }
    ui::print_summary(&report.summary(), duration);
}

fn print_json(report: &ScanReport, settings: &RunSettings) -> Result<(), DittoError> {
    let candidates: Vec<_> = report.filtered(settings.filter).collect();
    let value = serde_json::json!({
        "target": report.target,
        "summary": report.summary(),
        "candidates": candidates,
    });

    let json = if settings.json_pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", json);
    Ok(())
}

fn save_csv(report: &ScanReport, path: &str, include_registration: bool) -> Result<(), DittoError> {
    let file = File::create(path)
        .map_err(|e| DittoError::file_error(path, format!("Cannot create CSV file: {}", e)))?;
    report.write_csv(BufWriter::new(file), include_registration)
}

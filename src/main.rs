use argus_scan::config;
use argus_scan::probe::HttpProber;
use argus_scan::report;
use argus_scan::scanners::{self, CancelToken, Classification};
use argus_scan::target::normalize_url;
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a target URL for open endpoints and fuzzable parameters
    Scan {
        /// Target URL (API-style URLs with query parameters get fuzzed,
        /// anything else gets wordlist path discovery)
        #[arg(short, long)]
        target: String,

        /// Query parameter to fuzz instead of the first one
        #[arg(short, long)]
        parameter: Option<String>,

        /// Concurrent probe limit
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Output file for the scan record
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

fn print_banner() {
    println!(
        "{}",
        r#"
 █████╗ ██████╗  ██████╗ ██╗   ██╗███████╗
██╔══██╗██╔══██╗██╔════╝ ██║   ██║██╔════╝
███████║██████╔╝██║  ███╗██║   ██║███████╗
██╔══██║██╔══██╗██║   ██║██║   ██║╚════██║
██║  ██║██║  ██║╚██████╔╝╚██████╔╝███████║
╚═╝  ╚═╝╚═╝  ╚═╝ ╚═════╝  ╚═════╝ ╚══════╝
    "#
        .bright_blue()
    );
    println!("{}", "Endpoint Discovery & Fuzzing Engine".bright_yellow());
    println!();
}

fn create_default_output_path(scans_dir: &PathBuf, target: &str) -> Option<PathBuf> {
    if try_create_dir(scans_dir) {
        return Some(create_scan_file(scans_dir, target));
    }

    // Fall back to the user's home directory if the local directory fails
    if let Some(home_dir) = dirs::home_dir() {
        let user_scans_dir = home_dir.join(".argus").join("scans");
        if try_create_dir(&user_scans_dir) {
            return Some(create_scan_file(&user_scans_dir, target));
        }
    }

    None
}

fn try_create_dir(dir: &PathBuf) -> bool {
    fs::create_dir_all(dir).is_ok()
}

fn create_scan_file(dir: &PathBuf, target: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let slug: String = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!("{}_{}.json", slug, timestamp))
}

#[tokio::main]
async fn main() {
    env_logger::init();
    print_banner();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Scan {
            target,
            parameter,
            concurrency,
            output,
        }) => {
            if let Err(e) = run_scan_command(target, parameter, concurrency, output, cli.verbose).await {
                eprintln!("{} {}", "Error during scan:".bright_red(), e);
                process::exit(1);
            }
        }
        Some(Commands::Config) => {
            if let Err(e) = config::show_config(cli.verbose) {
                eprintln!("{} {}", "Error reading config:".bright_red(), e);
                process::exit(1);
            }
        }
        None => {
            println!(
                "{}",
                "No command specified. Use --help for usage information.".bright_yellow()
            );
        }
    }
}

async fn run_scan_command(
    target: &str,
    parameter: &Option<String>,
    concurrency: &Option<usize>,
    output: &Option<PathBuf>,
    verbose: bool,
) -> argus_scan::ArgusResult<()> {
    let cfg = config::load_config()?;

    let mut options = cfg.scan_options();
    options.parameter = parameter.clone();
    if let Some(limit) = concurrency {
        options.concurrency = (*limit).max(1);
    }

    let url = normalize_url(target);
    println!(
        "{} {}",
        "Scanning target:".bright_yellow(),
        url.bright_white()
    );

    let prober = HttpProber::with_user_agent(&cfg.user_agent)?;
    let resources = cfg.resource_loader();
    let cancel = CancelToken::new();

    let run = scanners::run_scan(&prober, &url, &resources, &options, &cancel).await?;

    if verbose {
        for finding in &run.findings {
            println!(
                "- {}: {}",
                report::classification_label(&finding.candidate, finding.classification),
                finding.url
            );
        }
    }

    println!(
        "{} {} candidates tried, {} open endpoints, {} candidate vulnerabilities",
        "Scan completed:".bright_green(),
        run.summary.candidates_tried,
        run.summary.endpoints_open,
        run.summary.vulnerability_count()
    );

    for finding in &run.findings {
        if finding.classification != Classification::Open
            && finding.classification != Classification::Clean
        {
            println!(
                "  {} {}",
                "!".bright_red(),
                report::classification_label(&finding.candidate, finding.classification)
            );
        }
    }

    let record = report::build_record(&run, None);

    let output_path = output
        .clone()
        .or_else(|| create_default_output_path(&cfg.scans_dir, target));
    match output_path {
        Some(path) => match report::save_record(&record, &path) {
            Ok(()) => println!(
                "{} {}",
                "Scan record saved to:".bright_green(),
                path.display().to_string().bright_white()
            ),
            Err(e) => {
                // Findings are already computed; a failed save should not
                // discard them.
                eprintln!("{} {}", "Failed to save scan record:".bright_red(), e);
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        },
        None => {
            println!(
                "{}",
                "No writable output location; printing record".bright_yellow()
            );
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

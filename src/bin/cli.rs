use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use sgaudit::aws::{AwsCliInventory, AwsCliProvider};
use sgaudit::collector::{Collector, PagedCollector, StaticCollector};
use sgaudit::config::Config;
use sgaudit::error::Result;
use sgaudit::model::raw::DescribeSecurityGroupsPage;
use sgaudit::output::OutputFormat;
use sgaudit::policy::Evaluator;
use sgaudit::provision::{provision, FixtureSpec};

#[derive(Parser)]
#[command(
    name = "sgaudit",
    about = "Policy-driven network-exposure auditor for cloud security groups",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit security groups for rules open to the internet
    Audit {
        /// Read inventory from a DescribeSecurityGroups JSON dump
        /// ("-" for stdin) instead of calling the aws CLI
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Policy file path (default: .sgaudit.toml if present)
        #[arg(long)]
        policy_file: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(long, short = 'f', default_value = "text")]
        format: String,

        /// AWS region to audit
        #[arg(long)]
        region: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Create the standard test security groups against the provider
    ProvisionFixtures {
        /// Fixture spec file (TOML, [[fixture]] tables); defaults to the
        /// built-in set
        #[arg(long)]
        spec_file: Option<PathBuf>,

        /// AWS region to provision in
        #[arg(long)]
        region: Option<String>,
    },

    /// List the registered exposure checks
    ListChecks {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .sgaudit.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Audit {
            input,
            policy_file,
            format,
            region,
            output,
        } => cmd_audit(input, policy_file, format, region, output),
        Commands::ProvisionFixtures { spec_file, region } => cmd_provision(spec_file, region),
        Commands::ListChecks { format } => cmd_list_checks(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_audit(
    input: Option<PathBuf>,
    policy_file: Option<PathBuf>,
    format_str: String,
    region: Option<String>,
    output_path: Option<PathBuf>,
) -> Result<i32> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using text", format_str);
        OutputFormat::Text
    });

    let config = match policy_file {
        Some(path) => sgaudit::load_policy_file(&path)?,
        None => Config::load(std::path::Path::new(".sgaudit.toml"))?,
    };

    let collector: Box<dyn Collector> = match input {
        Some(path) => Box::new(collector_from_dump(&path)?),
        None => Box::new(PagedCollector::new(AwsCliInventory {
            region,
            page_size: None,
        })),
    };

    let report = sgaudit::audit::run(collector.as_ref(), &config.policy)?;
    let rendered = sgaudit::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = clean, 1 = fail findings present
    Ok(if report.has_failures() { 1 } else { 0 })
}

fn collector_from_dump(path: &PathBuf) -> Result<StaticCollector> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    let page: DescribeSecurityGroupsPage = serde_json::from_str(&content)?;
    Ok(StaticCollector::new(page.security_groups))
}

fn cmd_provision(spec_file: Option<PathBuf>, region: Option<String>) -> Result<i32> {
    let specs = match spec_file {
        Some(path) => FixtureSpec::load_specs(&path)?,
        None => FixtureSpec::defaults(),
    };

    let client = AwsCliProvider { region };
    let outcome = match provision(&client, &specs) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(1);
        }
    };

    for (name, fixture) in &outcome.fixtures {
        let verb = if fixture.reused { "Reused" } else { "Created" };
        println!(
            "{}: {} ({}) — {} rule(s) added, {} skipped",
            verb, name, fixture.group_id, fixture.rules_added, fixture.rules_skipped
        );
    }
    for error in &outcome.errors {
        eprintln!("Error: {}", error);
    }

    Ok(if outcome.success() { 0 } else { 1 })
}

fn cmd_list_checks(format_str: String) -> Result<i32> {
    let checks = Evaluator::default().list_checks();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&checks)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<12} {:<30} {:<8} DESCRIPTION", "ID", "NAME", "SEVERITY");
            println!("{}", "-".repeat(80));
            for check in &checks {
                println!(
                    "{:<12} {:<30} {:<8} {}",
                    check.id, check.name, check.severity, check.description,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32> {
    let path = PathBuf::from(".sgaudit.toml");

    if path.exists() && !force {
        eprintln!(".sgaudit.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .sgaudit.toml");

    Ok(0)
}

use camino::Utf8PathBuf;
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use pgtree::{DirConfig, PgConnector, PullReport, Puller};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Keep a directory tree of CREATE TABLE files in sync with Postgres.
#[derive(Facet, Debug)]
struct Cli {
    /// Show version information
    #[facet(args::named, args::short = 'V')]
    version: bool,

    /// Command to run
    #[facet(default, args::subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Facet, Debug)]
#[repr(u8)]
enum Commands {
    /// Update the files to reflect changes made directly in the database
    Pull {
        /// Root of the tree (defaults to the current directory)
        #[facet(default, args::positional)]
        dir: Option<String>,
    },
    /// Create a tree from an existing database
    Init {
        /// Database server host name
        #[facet(args::named)]
        host: String,

        /// Database server port
        #[facet(default, args::named)]
        port: Option<u16>,

        /// Role to connect as
        #[facet(default, args::named)]
        user: Option<String>,

        /// Database to connect to
        #[facet(default, args::named)]
        database: Option<String>,

        /// Only populate this schema, directly into the directory
        #[facet(default, args::named)]
        schema: Option<String>,

        /// Directory to create (defaults to the host name)
        #[facet(default, args::positional)]
        dir: Option<String>,
    },
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args_ref: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let result: Result<Cli, _> = args::from_slice(&args_ref);

    match result {
        Ok(cli) => run(cli),
        Err(err) if err.is_help_request() => {
            print!("{}", err.help_text().unwrap_or(""));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ExitCode {
    if cli.version {
        println!("pgtree {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let Some(command) = cli.command else {
        let help = args::generate_help::<Cli>(&args::HelpConfig {
            program_name: Some("pgtree".to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            ..Default::default()
        });
        print!("{}", help);
        return ExitCode::SUCCESS;
    };

    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pgtree=info")),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} unable to start runtime: {}", "ERROR:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let connector = PgConnector::new();
    let result = runtime.block_on(async {
        match command {
            Commands::Pull { dir } => {
                let root = Utf8PathBuf::from(dir.unwrap_or_else(|| ".".to_string()));
                Puller::new(connector).run(&root).await
            }
            Commands::Init {
                host,
                port,
                user,
                database,
                schema,
                dir,
            } => {
                let root = Utf8PathBuf::from(dir.unwrap_or_else(|| host.clone()));
                let config = DirConfig {
                    host: Some(host),
                    port,
                    user,
                    database,
                    schema,
                    ..Default::default()
                };
                pgtree::init(&connector, &root, &config).await
            }
        }
    });

    match result {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_error(&err);
            ExitCode::from(exit_status(&err))
        }
    }
}

/// 2 for conditions that stop the whole run (renames, unsupported tables),
/// 1 for everything else.
fn exit_status(err: &pgtree::Error) -> u8 {
    if err.is_fatal() { 2 } else { 1 }
}

fn print_summary(report: &PullReport) {
    if report.is_empty() {
        println!("{} everything is up to date", "OK:".green().bold());
        return;
    }
    println!(
        "{} {} file(s) written, {} deletion(s)",
        "OK:".green().bold(),
        report.files_written(),
        report.deletions()
    );
}

fn print_error(err: &pgtree::Error) {
    eprintln!("{} {}", "ERROR:".red().bold(), err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
        source = cause.source();
    }
}

//! Binary entry point for the rbstore reservation CLI.
#![forbid(unsafe_code)]

#[path = "rbstore/config.rs"]
mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rbstore::{
    admin::{self, AdminError, StatsReport, VerifyReport},
    model::NO_SEAT,
    Customer, Database, Flight, StoreError, StoreOptions,
};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, ConfigError};

const FALLBACK_DB_PATH: &str = "data/data.dat";

#[derive(Parser, Debug)]
#[command(
    name = "rbstore",
    version,
    about = "Manage flights and customers in an rbstore database file",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    #[arg(long, global = true, env = "RBSTORE_DB", help = "Database file")]
    db: Option<PathBuf>,

    #[arg(long, global = true, env = "RBSTORE_CONFIG", help = "CLI config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(short, long, global = true, help = "Log store activity to stderr")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage flights.
    #[command(subcommand)]
    Flight(FlightCmd),
    /// Manage customers.
    #[command(subcommand)]
    Customer(CustomerCmd),
    /// Show per-store statistics.
    Stats,
    /// Check both stores against the red-black invariants.
    Verify,
    /// Print the effective configuration.
    Config,
}

#[derive(Subcommand, Debug)]
enum FlightCmd {
    /// Add a flight.
    Add { id: String, seats: i32 },
    /// Remove a flight.
    Remove { id: String },
    /// Show one flight.
    Show { id: String },
    /// List all flights in id order.
    List,
}

#[derive(Subcommand, Debug)]
enum CustomerCmd {
    /// Add a customer.
    Add {
        name: String,
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        flight: String,
        #[arg(long, default_value_t = NO_SEAT, allow_negative_numbers = true)]
        seat: i32,
    },
    /// Remove a customer.
    Remove { name: String, phone: String },
    /// Show one customer.
    Show { name: String, phone: String },
    /// List customers in name order.
    List {
        #[arg(long, help = "Only customers booked on this flight")]
        flight: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(String),
}

struct Session {
    path: PathBuf,
    options: StoreOptions,
    format: OutputFormat,
}

impl Session {
    fn open(&self) -> Result<Database, CliError> {
        Ok(Database::open(&self.path, self.options)?)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "rbstore=debug" } else { "rbstore=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let config = CliConfig::load(cli.global.config.clone())?;
    let path = cli
        .global
        .db
        .clone()
        .or_else(|| config.default_db_path().cloned())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DB_PATH));
    let session = Session {
        path,
        options: config.store_options(),
        format: cli.global.format,
    };

    match cli.command {
        Command::Flight(cmd) => run_flight(&session, cmd)?,
        Command::Customer(cmd) => run_customer(&session, cmd)?,
        Command::Stats => {
            let report = admin::stats(&session.path, &session.options)?;
            emit(session.format, &report, || print_stats_text(&report))?;
        }
        Command::Verify => {
            let report = admin::verify(&session.path, &session.options)?;
            emit(session.format, &report, || print_verify_text(&report))?;
            if !report.success {
                return Ok(2);
            }
        }
        Command::Config => {
            match config.path() {
                Some(p) => println!("# {}", p.display()),
                None => println!("# no config directory"),
            }
            println!("# database: {}", session.path.display());
            print!("{}", config.render()?);
        }
    }
    Ok(0)
}

fn run_flight(session: &Session, cmd: FlightCmd) -> Result<(), CliError> {
    let mut db = session.open()?;
    match cmd {
        FlightCmd::Add { id, seats } => {
            let flight = Flight::new(id, seats)?;
            if let Some(rejected) = db.flights_mut().insert(flight) {
                return Err(CliError::Duplicate(format!("flight {}", rejected.id)));
            }
            db.save(&session.path)?;
        }
        FlightCmd::Remove { id } => {
            if db.flights_mut().erase(&Flight::key(id.as_str())).is_none() {
                return Err(CliError::NotFound(format!("flight {id}")));
            }
            db.save(&session.path)?;
        }
        FlightCmd::Show { id } => {
            let flight = db
                .flights()
                .get(&Flight::key(id.as_str()))
                .ok_or_else(|| CliError::NotFound(format!("flight {id}")))?;
            emit(session.format, flight, || print_flight(flight))?;
        }
        FlightCmd::List => {
            let mut flights = Vec::with_capacity(db.flights().len());
            db.flights().for_each(|f| flights.push(f));
            emit(session.format, &flights, || {
                for f in &flights {
                    print_flight(f);
                }
            })?;
        }
    }
    Ok(())
}

fn run_customer(session: &Session, cmd: CustomerCmd) -> Result<(), CliError> {
    let mut db = session.open()?;
    match cmd {
        CustomerCmd::Add {
            name,
            phone,
            address,
            flight,
            seat,
        } => {
            let customer = Customer {
                name,
                address,
                phone,
                flight_id: flight,
                seat,
            };
            if let Some(rejected) = db.customers_mut().insert(customer) {
                return Err(CliError::Duplicate(format!(
                    "customer {} ({})",
                    rejected.name, rejected.phone
                )));
            }
            db.save(&session.path)?;
        }
        CustomerCmd::Remove { name, phone } => {
            let probe = Customer::key(name.as_str(), phone.as_str());
            if db.customers_mut().erase(&probe).is_none() {
                return Err(CliError::NotFound(format!("customer {name} ({phone})")));
            }
            db.save(&session.path)?;
        }
        CustomerCmd::Show { name, phone } => {
            let customer = db
                .customers()
                .get(&Customer::key(name.as_str(), phone.as_str()))
                .ok_or_else(|| CliError::NotFound(format!("customer {name} ({phone})")))?;
            emit(session.format, customer, || print_customer(customer))?;
        }
        CustomerCmd::List { flight } => {
            let customers = match flight.as_deref() {
                Some(id) => db.customers_on(id),
                None => {
                    let mut all = Vec::with_capacity(db.customers().len());
                    db.customers().for_each(|c| all.push(c));
                    all
                }
            };
            emit(session.format, &customers, || {
                for c in &customers {
                    print_customer(c);
                }
            })?;
        }
    }
    Ok(())
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_flight(flight: &Flight) {
    println!("{}\t{} seats", flight.id, flight.seats);
}

fn print_customer(customer: &Customer) {
    if customer.has_seat() {
        println!(
            "{}\tflight={} seat={}",
            customer, customer.flight_id, customer.seat
        );
    } else if customer.flight_id.is_empty() {
        println!("{customer}");
    } else {
        println!("{}\tflight={}", customer, customer.flight_id);
    }
}

fn print_stats_text(report: &StatsReport) {
    println!(
        "File: {} ({} bytes)",
        report.filesystem.db_path, report.filesystem.db_size_bytes
    );
    for (name, store) in [("flights", &report.flights), ("customers", &report.customers)] {
        let black_height = store
            .black_height
            .map(|h| h.to_string())
            .unwrap_or_else(|| "invalid".to_string());
        println!(
            "  {name}: records={} height={} black_height={black_height}",
            store.records, store.height
        );
    }
}

fn print_verify_text(report: &VerifyReport) {
    println!(
        "Verify: success={} flights={} customers={}",
        report.success, report.counts.flights, report.counts.customers
    );
    for finding in &report.findings {
        println!("  [{:?}] {}", finding.severity, finding.message);
    }
}

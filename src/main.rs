mod advisor;
mod auth;
mod cards;
mod cli;
mod db;
mod documents;
mod error;
mod fmt;
mod importer;
mod insights;
mod models;
mod notify;
mod profile;
mod settings;
mod store;
mod summary;
mod tabular;
#[cfg(test)]
mod testutil;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::{AdviseCommands, CardsCommands, Cli, Commands, ProfileCommands, VerifyCommands};

/// Log to stderr. `RUST_LOG` wins over the configured level.
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&settings::load_settings().log_level);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Login { email } => cli::auth::login(&email),
        Commands::Logout => cli::auth::logout(),
        Commands::Whoami => cli::auth::whoami(),
        Commands::Cards { command } => match command {
            CardsCommands::Add {
                name,
                network,
                last_four,
                balance,
                limit,
                apr,
                annual_fee,
                cashback,
                pending_dues,
                due_date,
                rewards,
            } => cli::cards::add(cards::CardForm {
                name,
                network,
                last_four,
                balance,
                credit_limit: limit,
                apr,
                annual_fee,
                cashback,
                pending_dues,
                due_date,
                rewards_type: rewards,
            }),
            CardsCommands::List => cli::cards::list(),
            CardsCommands::Primary { id } => cli::cards::primary(&id),
            CardsCommands::Update { id, balance, limit } => cli::cards::update(&id, balance, limit),
            CardsCommands::Delete { id } => cli::cards::delete(&id),
        },
        Commands::Import {
            demo,
            cards,
            transactions,
            batch_size,
        } => cli::import::run(demo, cards.as_deref(), transactions.as_deref(), batch_size),
        Commands::Insights => cli::insights::run(),
        Commands::Summary => cli::summary::run(),
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                full_name,
                dob,
                phone,
                address,
                address2,
                city,
                state,
                zip,
            } => cli::profile::set(profile::ProfileForm {
                full_name,
                date_of_birth: dob,
                phone_number: phone,
                address_line1: address,
                address_line2: address2,
                city,
                state,
                zip_code: zip,
            }),
            ProfileCommands::Show => cli::profile::show(),
        },
        Commands::Verify { command } => match command {
            VerifyCommands::Ssn { ssn } => cli::verify::ssn(&ssn),
            VerifyCommands::Id { file, content_type } => cli::verify::id(&file, content_type.as_deref()),
        },
        Commands::Advise { command } => match command {
            AdviseCommands::Recommend { category, merchant } => {
                cli::advise::recommend(&category, merchant.as_deref())
            }
            AdviseCommands::Assess {
                amount,
                category,
                description,
            } => cli::advise::assess(amount, &category, description.as_deref()),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

use clap::Parser;
use dotenvy::dotenv;
use rust_file_store::config::ServiceConfig;
use rust_file_store::models::OwnerScope;
use rust_file_store::utils::auth::create_jwt;

/// Mints a session token for local testing against the file API.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Owner scope id the token resolves to
    #[arg(short, long)]
    owner: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 24)]
    hours: i64,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let config = ServiceConfig::from_env();

    let owner = OwnerScope::new(args.owner, args.first_name, args.last_name);
    let token = create_jwt(
        &owner,
        &config.jwt_secret,
        chrono::Duration::hours(args.hours),
    )?;

    println!("{}", token);
    Ok(())
}

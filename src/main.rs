mod args;
mod canvass;

use clap::Parser;
use log::{debug, LevelFilter};
use std::path::PathBuf;

use canvass_core::{Edit, Resident};

use crate::args::{Args, Command};
use crate::canvass::auth;
use crate::canvass::cache::LocalCache;
use crate::canvass::config_reader::{read_config, CanvassConfig};
use crate::canvass::export::DEFAULT_EXPORT_PREFIX;
use crate::canvass::session::Session;
use crate::canvass::{server, CanvassResult};

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn print_resident(r: &Resident) {
    let serial = r
        .serial_no
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_default();
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        r.id, serial, r.name, r.house_name, r.phone_number, r.category, r.visit_count
    );
}

async fn run_edit(
    config: &CanvassConfig,
    offline: bool,
    id: &str,
    edit: Edit,
) -> CanvassResult<()> {
    let mut session = Session::open(config, offline).await?;
    let outcome = session.edit(id, edit).await?;
    print_resident(&outcome.resident);
    match outcome.write_through {
        Ok(mode) => debug!("run_edit: saved with mode {:?}", mode),
        Err(e) => eprintln!("Saved locally only: {}", e),
    }
    Ok(())
}

async fn run(args: Args) -> CanvassResult<()> {
    let config = read_config(args.config.as_deref())?;
    let offline = args.offline;
    match args.command {
        Command::Serve => server::serve(&config).await,
        Command::Login { username, password } => {
            let verifier = config.credentials()?;
            let cache = LocalCache::new(config.cache_dir());
            auth::login(&verifier, &cache, &username, &password)?;
            println!("Logged in");
            Ok(())
        }
        Command::Logout => {
            auth::logout(&LocalCache::new(config.cache_dir()));
            println!("Logged out");
            Ok(())
        }
        Command::Import { file } => {
            let mut session = Session::open(&config, true).await?;
            let count = session.import(&file).await?;
            println!("Imported and synced {} residents", count);
            Ok(())
        }
        Command::List {
            query,
            visited_only,
        } => {
            let session = Session::open(&config, offline).await?;
            let view = session
                .roster()
                .view(query.as_deref().unwrap_or_default(), visited_only);
            for r in view {
                print_resident(r);
            }
            Ok(())
        }
        Command::Stats => {
            let session = Session::open(&config, offline).await?;
            let stats = session.roster().stats();
            println!("total\t{}", stats.total);
            println!("visited\t{}", stats.visited);
            println!("unvisited\t{}", stats.unvisited);
            println!("visits\t{}", stats.total_visits);
            Ok(())
        }
        Command::Visit { id } => run_edit(&config, offline, &id, Edit::Visit).await,
        Command::Unvisit { id } => run_edit(&config, offline, &id, Edit::Unvisit).await,
        Command::Phone { id, number } => run_edit(&config, offline, &id, Edit::Phone(number)).await,
        Command::Category { id, label } => {
            run_edit(&config, offline, &id, Edit::Category(label)).await
        }
        Command::Remark { id, text } => run_edit(&config, offline, &id, Edit::Remark(text)).await,
        Command::Export { prefix, out_dir } => {
            let session = Session::open(&config, offline).await?;
            let dir = PathBuf::from(out_dir.unwrap_or_else(|| ".".to_string()));
            let prefix = prefix.unwrap_or_else(|| DEFAULT_EXPORT_PREFIX.to_string());
            let path = session.export(&dir, &prefix)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Clear => {
            let mut session = Session::open(&config, true).await?;
            session.clear();
            println!("Local list cleared");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!("args: {:?}", args.redacted());

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

use std::sync::Arc;

use clap::Parser;

use taskboard::config::TaskboardConfig;
use taskboard::store::TaskStore;

/// HTTP task server.
#[derive(Parser, Debug)]
#[command(version, about = "taskboard: in-memory task server", long_about = None)]
struct Args {
    /// Start without the demo tasks.
    #[arg(long)]
    empty: bool,

    /// Log debug output from this crate.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = TaskboardConfig::load()?;
    if args.empty {
        config.seed = false;
    }
    if args.debug {
        config.debug_logging = true;
    }

    taskboard::logging::init("taskboard", config.debug_logging);

    let store = if config.seed {
        TaskStore::seeded()
    } else {
        TaskStore::new()
    };
    log::info!("Starting with {} tasks", store.len().await);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running on http://{}", addr);

    taskboard::server::serve(listener, Arc::new(store)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_off() {
        let args = Args::try_parse_from(["taskboard"]).unwrap();
        assert!(!args.empty);
        assert!(!args.debug);
        let args = Args::try_parse_from(["taskboard", "--empty", "--debug"]).unwrap();
        assert!(args.empty && args.debug);
    }
}

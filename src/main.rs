mod cli;

use anyhow::{Context, Result};

use ledgerly::profiles::ProfileStore;

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    let data_dir = data_dir()?;
    let store = ProfileStore::open(data_dir)?;
    cli::run(&args, &store)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn data_dir() -> Result<std::path::PathBuf> {
    if let Ok(dir) = std::env::var("LEDGERLY_DATA_DIR") {
        return Ok(dir.into());
    }
    let proj_dirs = directories::ProjectDirs::from("com", "ledgerly", "Ledgerly")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.to_path_buf())
}

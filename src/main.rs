use seiri::SeiriConfig;
use seiri::error::Result;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Directory that holds the manga folders to normalize.
const ROOT_DIRECTORY: &str = "/srv/manga/Processing";

/// Whether loose archives in the root are moved into folders of their own.
const PROMOTE_ROOT_ARCHIVES: bool = true;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .with_target(false)
        .init();

    let config = SeiriConfig::builder()
        .root_path(PathBuf::from(ROOT_DIRECTORY))
        .promote_root_archives(PROMOTE_ROOT_ARCHIVES)
        .build()?;

    let report = config.normalize().await?;
    for failure in report.failures() {
        log::warn!("{} failed for {}", failure.kind, failure.path.display());
    }
    Ok(())
}

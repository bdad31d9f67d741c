pub mod coordinator;
pub mod core;
pub mod platforms;
pub mod storage;

pub use domestika_core::models;

pub async fn run() -> anyhow::Result<()> {
    core::logging::init();

    let path = storage::config::config_path();
    let settings = storage::config::load_settings(&path)?;
    settings.validate()?;

    tracing::info!("Downloading course {}", settings.course_url.trim());
    let summary = coordinator::run(settings).await?;

    if !summary.is_success() {
        for failure in &summary.failures {
            tracing::error!("  {}: {}", failure.label, failure.error);
        }
        anyhow::bail!(
            "{} of {} downloads failed",
            summary.failures.len(),
            summary.total
        );
    }

    Ok(())
}

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use guidebook_core::{
    CoreConfig, data_dir_from_env_value, export_highlight_from_env_value,
    max_upload_bytes_from_env_value, rest_addr_from_env_value,
};

/// Main entry point for the Guidebook server
///
/// Resolves configuration once, makes sure the data directory exists and serves the REST API
/// (including uploaded images and Swagger UI).
///
/// # Environment Variables
/// - `GUIDEBOOK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `GUIDEBOOK_DATA_DIR`: Directory for guide, tag and upload storage (default: "guide_data")
/// - `GUIDEBOOK_MAX_UPLOAD_BYTES`: Largest accepted image upload (default: 5 MiB)
/// - `GUIDEBOOK_EXPORT_HIGHLIGHT`: Link Prism in HTML exports (default: true)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guidebook_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("guidebook_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = rest_addr_from_env_value(std::env::var("GUIDEBOOK_REST_ADDR").ok());
    let data_dir = data_dir_from_env_value(std::env::var("GUIDEBOOK_DATA_DIR").ok());
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var("GUIDEBOOK_MAX_UPLOAD_BYTES").ok())?;
    let export_highlight =
        export_highlight_from_env_value(std::env::var("GUIDEBOOK_EXPORT_HIGHLIGHT").ok())?;

    let cfg = CoreConfig::new(data_dir, max_upload_bytes, export_highlight)?;
    cfg.ensure_dirs()?;
    tracing::info!("Using data directory {}", cfg.data_dir().display());

    let app = router(AppState::new(Arc::new(cfg))?);

    tracing::info!("++ Starting Guidebook REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod app;
mod churn;
mod config;
mod state;
mod users;

use anyhow::Context;

use crate::churn::model::ChurnArtifact;
use crate::users::error::UserError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "churnwatch=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    seed_admin(&app_state).await?;

    // Load the persisted artifact if one exists. Training only happens via
    // the admin route, never implicitly at boot.
    let artifact_path = &app_state.config.model.artifact_path;
    if artifact_path.exists() {
        let artifact = ChurnArtifact::load(artifact_path)
            .with_context(|| format!("load artifact from {}", artifact_path.display()))?;
        app_state.model.replace(artifact);
    } else {
        tracing::warn!(
            path = %artifact_path.display(),
            "no model artifact found; starting untrained"
        );
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}

/// Create the configured admin account when it does not exist yet.
async fn seed_admin(state: &state::AppState) -> anyhow::Result<()> {
    let Some(seed) = &state.config.admin else {
        return Ok(());
    };
    match state.users.get_user(&seed.username).await {
        Ok(_) => Ok(()),
        Err(UserError::NotFound) => {
            let user = state
                .users
                .create_user(&seed.username, &seed.password, true)
                .await
                .context("seed admin account")?;
            tracing::info!(user_id = user.id, username = %user.username, "admin account seeded");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

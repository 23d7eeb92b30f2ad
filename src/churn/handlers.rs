use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    churn::{
        dataset,
        dto::{PredictionResponse, TrainResponse},
        error::ChurnError,
        model::ChurnArtifact,
        row::CustomerRow,
    },
    state::AppState,
    users::jwt::{AdminUser, AuthUser},
};

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict/upload", post(predict_upload))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024)) // 5MB CSV uploads
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/train", post(train))
}

fn map_churn_error(e: ChurnError) -> (StatusCode, String) {
    match e {
        ChurnError::UnknownCategory { .. }
        | ChurnError::UnknownLabel(_)
        | ChurnError::Csv(_)
        | ChurnError::Training(_) => {
            warn!(error = %e, "rejected churn input");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        ChurnError::NotTrained => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        ChurnError::Io(_) | ChurnError::Serde(_) => {
            error!(error = %e, "churn pipeline failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Pipeline error".into())
        }
    }
}

/// POST /predict — one feature row as JSON.
#[instrument(skip(state, payload))]
pub async fn predict(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CustomerRow>,
) -> Result<Json<PredictionResponse>, (StatusCode, String)> {
    let artifact = state.model.require().map_err(map_churn_error)?;
    let labels = artifact.predict(&[payload]).map_err(map_churn_error)?;
    debug!(user_id, "row scored");
    Ok(Json(PredictionResponse::from_labels(labels)))
}

/// POST /predict/upload — multipart CSV in the `csv_file` field.
#[instrument(skip(state, mp))]
pub async fn predict_upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<PredictionResponse>, (StatusCode, String)> {
    let mut upload = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("csv_file") {
            let data = field.bytes().await.map_err(|e| {
                warn!(error = %e, "multipart read failed");
                (StatusCode::BAD_REQUEST, "Unreadable upload".to_string())
            })?;
            upload = Some(data);
        }
    }
    let Some(bytes) = upload else {
        return Err((StatusCode::BAD_REQUEST, "csv_file is required".into()));
    };

    let rows = dataset::parse_upload(&bytes).map_err(map_churn_error)?;
    if rows.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "no rows in upload".into()));
    }

    let artifact = state.model.require().map_err(map_churn_error)?;
    let labels = artifact.predict(&rows).map_err(map_churn_error)?;
    info!(user_id, rows = labels.len(), "batch scored");
    Ok(Json(PredictionResponse::from_labels(labels)))
}

/// POST /admin/train — refit from the configured training CSV, persist the
/// new artifact, then swap it into the shared handle.
#[instrument(skip(state))]
pub async fn train(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
) -> Result<Json<TrainResponse>, (StatusCode, String)> {
    let training_path = state.config.model.training_data_path.clone();
    let artifact_path = state.config.model.artifact_path.clone();

    // Fitting is CPU-bound; keep it off the runtime workers.
    let result = tokio::task::spawn_blocking(move || {
        let rows = dataset::load_training_csv(&training_path)?;
        let artifact = ChurnArtifact::train(&rows)?;
        artifact.save(&artifact_path)?;
        Ok::<_, ChurnError>((rows.len(), artifact))
    })
    .await
    .map_err(|e| {
        error!(error = %e, "training task panicked");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Training task failed".to_string(),
        )
    })?;

    let (trained_rows, artifact) = result.map_err(map_churn_error)?;
    state.model.replace(artifact);
    info!(admin_id, trained_rows, "model retrained");
    Ok(Json(TrainResponse { trained_rows }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrained_model_maps_to_service_unavailable() {
        let (status, _) = map_churn_error(ChurnError::NotTrained);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn data_quality_errors_map_to_unprocessable_entity() {
        let (status, body) = map_churn_error(ChurnError::UnknownCategory {
            column: "InternetService",
            value: "Satellite".into(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("InternetService"));

        let (status, _) = map_churn_error(ChurnError::UnknownLabel("Maybe".into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn io_failures_stay_generic() {
        let (status, body) = map_churn_error(ChurnError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        )));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("disk"));
    }
}

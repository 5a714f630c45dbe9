//! Semestre CRUD endpoints
//!
//! - POST   /semestres      create
//! - GET    /semestres      list (summary view)
//! - GET    /semestres/:id  get by id (detail view)
//! - PUT    /semestres/:id  field-level update + relink
//! - DELETE /semestres/:id  transactional delete + back-reference cleanup

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use scolaris_common::config::RelinkScope;
use scolaris_common::db::Semestre;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use crate::db::{references, semestres, SemestrePatch};
use crate::populate::{self, SemestreDetail, SemestreSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSemestreRequest {
    #[serde(rename = "nomSemestre")]
    pub nom_semestre: String,
    /// Filiere id; kept as a string so a malformed id reads as a dangling reference
    #[serde(default)]
    pub filiere: Option<String>,
    #[serde(default)]
    pub elements: Vec<Uuid>,
    #[serde(default)]
    pub seances: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateSemestreResponse {
    pub success: bool,
    pub semestre: Semestre,
}

#[derive(Debug, Serialize)]
pub struct UpdateSemestreResponse {
    pub success: bool,
    pub message: String,
    pub semestre: Semestre,
}

#[derive(Debug, Serialize)]
pub struct DeleteSemestreResponse {
    pub success: bool,
    pub message: String,
}

/// Path ids that are not UUIDs cannot name a stored semestre
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

/// POST /semestres
pub async fn create_semestre(
    State(state): State<AppState>,
    payload: Result<Json<CreateSemestreRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateSemestreResponse>)> {
    let Json(req) = payload?;

    if semestres::find_by_name(&state.db, &req.nom_semestre)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateName);
    }

    let filiere = match req.filiere.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => {
            let id = Uuid::parse_str(raw).map_err(|_| ApiError::InvalidReference)?;
            if !references::filiere_exists(&state.db, id).await? {
                return Err(ApiError::InvalidReference);
            }
            Some(id)
        }
        None => None,
    };

    let mut semestre = Semestre::new(req.nom_semestre);
    semestre.filiere = filiere;
    semestre.elements = req.elements;
    semestre.seances = req.seances;

    // A concurrent create of the same name surfaces as a UNIQUE violation -> DuplicateName
    semestres::insert(&state.db, &semestre).await?;

    info!("Created semestre {} ({})", semestre.nom_semestre, semestre.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateSemestreResponse {
            success: true,
            semestre,
        }),
    ))
}

/// GET /semestres
pub async fn list_semestres(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SemestreSummary>>> {
    let all = semestres::find_all(&state.db).await?;

    let mut summaries = Vec::with_capacity(all.len());
    for semestre in &all {
        summaries.push(populate::summarize(&state.db, semestre).await?);
    }

    Ok(Json(summaries))
}

/// GET /semestres/:id
pub async fn get_semestre_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SemestreDetail>> {
    let id = parse_id(&id)?;

    let semestre = semestres::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let detail = populate::detail(&state.db, &semestre).await?;
    debug!("Populated semestre: {:?}", detail);

    Ok(Json(detail))
}

/// PUT /semestres/:id
///
/// Relinking runs after the field update and is not transactional: a relink
/// failure reports an error while the field update stays applied.
pub async fn update_semestre(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SemestrePatch>, JsonRejection>,
) -> ApiResult<Json<UpdateSemestreResponse>> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;

    let semestre = semestres::apply_patch(&state.db, id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    match state.relink_scope {
        RelinkScope::All => references::relink_all(&state.db, semestre.id).await?,
        RelinkScope::Referenced => {
            references::relink_referenced(
                &state.db,
                semestre.id,
                patch.filiere.flatten(),
                patch.professeurs.as_deref().unwrap_or_default(),
                patch.elements.as_deref().unwrap_or_default(),
            )
            .await?
        }
    }

    info!("Updated semestre {} (relink scope: {})", semestre.id, state.relink_scope);

    Ok(Json(UpdateSemestreResponse {
        success: true,
        message: "Semestre updated successfully".to_string(),
        semestre,
    }))
}

/// DELETE /semestres/:id
pub async fn delete_semestre(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteSemestreResponse>> {
    let id = parse_id(&id)?;

    if !semestres::delete_with_cleanup(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted semestre {} and its back-references", id);

    Ok(Json(DeleteSemestreResponse {
        success: true,
        message: "Semestre deleted successfully".to_string(),
    }))
}

//! Axum route handlers for the paid features.
//!
//! Caller and entitlement come from request extensions set by the gate middleware.
//! Each handler checks its access rule before reading the body, so a rejected
//! caller gets the upgrade message whatever the body holds.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::actions::pipeline::{run_action, ActionResponse, ActionSpec};
use crate::actions::uploads::UploadForm;
use crate::errors::AppError;
use crate::gate::AccessRule;
use crate::llm_client::prompts::resume_review_prompt;
use crate::llm_client::CompletionOptions;
use crate::media::ImageEdit;
use crate::models::creation::CreationType;
use crate::models::user::{Caller, Entitlement};
use crate::state::AppState;

/// Token budget for blog-title suggestions.
pub const BLOG_TITLE_MAX_TOKENS: u32 = 100;
/// Token budget for resume feedback.
pub const RESUME_REVIEW_MAX_TOKENS: u32 = 1000;
/// Largest resume accepted for review (5 MiB).
pub const RESUME_SIZE_LIMIT: usize = 5 * 1024 * 1024;

const GENERATED_IMAGE_FILE_NAME: &str = "generated.png";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    pub prompt: String,
    pub length: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBlogTitleRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub publish: Option<bool>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

async fn multipart_body(
    payload: Result<Multipart, MultipartRejection>,
    max_file_size: Option<usize>,
) -> Result<UploadForm, AppError> {
    let multipart = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    UploadForm::read(multipart, max_file_size).await
}

fn require_prompt(prompt: &str) -> Result<(), AppError> {
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-article
pub async fn handle_generate_article(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Json<GenerateArticleRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::FreeQuota.check(&entitlement)?;
    let request = json_body(payload)?;
    let spec = ActionSpec::new(
        AccessRule::FreeQuota,
        CreationType::Article,
        request.prompt.clone(),
    );

    let llm = Arc::clone(&state.llm);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        require_prompt(&request.prompt)?;
        if request.length == 0 {
            return Err(AppError::Validation(
                "length must be a positive number of tokens".to_string(),
            ));
        }
        llm.complete(
            &request.prompt,
            CompletionOptions::with_max_tokens(request.length),
        )
        .await
        .map_err(AppError::provider)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/ai/generate-blog-title
pub async fn handle_generate_blog_title(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Json<GenerateBlogTitleRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::FreeQuota.check(&entitlement)?;
    let request = json_body(payload)?;
    let spec = ActionSpec::new(
        AccessRule::FreeQuota,
        CreationType::BlogTitle,
        request.prompt.clone(),
    );

    let llm = Arc::clone(&state.llm);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        require_prompt(&request.prompt)?;
        llm.complete(
            &request.prompt,
            CompletionOptions::with_max_tokens(BLOG_TITLE_MAX_TOKENS),
        )
        .await
        .map_err(AppError::provider)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/ai/generate-image
///
/// Text-to-image, then the PNG is re-hosted so the creation stores a stable URL.
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::PremiumOnly.check(&entitlement)?;
    let request = json_body(payload)?;
    let spec = ActionSpec::new(
        AccessRule::PremiumOnly,
        CreationType::Image,
        request.prompt.clone(),
    )
    .published(request.publish.unwrap_or(false));

    let generator = Arc::clone(&state.image_generator);
    let host = Arc::clone(&state.image_host);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        require_prompt(&request.prompt)?;
        let png = generator
            .generate(&request.prompt)
            .await
            .map_err(AppError::provider)?;
        let hosted = host
            .upload(png, GENERATED_IMAGE_FILE_NAME, None)
            .await
            .map_err(AppError::provider)?;
        Ok(hosted.secure_url)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/ai/remove-image-background (multipart: `image`)
pub async fn handle_remove_image_background(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::PremiumOnly.check(&entitlement)?;
    let mut form = multipart_body(payload, None).await?;
    let image = form.take_file("image")?;
    let spec = ActionSpec::new(
        AccessRule::PremiumOnly,
        CreationType::Image,
        "Remove background from image",
    );

    let host = Arc::clone(&state.image_host);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        let hosted = host
            .upload(image.bytes, &image.file_name, Some(&ImageEdit::RemoveBackground))
            .await
            .map_err(AppError::provider)?;
        Ok(hosted.secure_url)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/ai/remove-image-object (multipart: `image`, `object`)
pub async fn handle_remove_image_object(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::PremiumOnly.check(&entitlement)?;
    let mut form = multipart_body(payload, None).await?;
    let image = form.take_file("image")?;
    let object = form
        .text("object")
        .ok_or_else(|| AppError::Validation("object to remove is required".to_string()))?
        .to_string();
    let edit =
        ImageEdit::remove_object(&object).map_err(|e| AppError::Validation(e.to_string()))?;
    let spec = ActionSpec::new(
        AccessRule::PremiumOnly,
        CreationType::Image,
        format!("Remove {object} from image"),
    );

    let host = Arc::clone(&state.image_host);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        let hosted = host
            .upload(image.bytes, &image.file_name, None)
            .await
            .map_err(AppError::provider)?;
        host.edited_url(&hosted.public_id, &edit)
            .map_err(AppError::provider)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/ai/resume-review (multipart: `resume`, PDF)
pub async fn handle_resume_review(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(entitlement): Extension<Entitlement>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    AccessRule::PremiumOnly.check(&entitlement)?;
    let mut form = multipart_body(payload, Some(RESUME_SIZE_LIMIT)).await?;
    let resume = form.take_file("resume")?;
    let spec = ActionSpec::new(
        AccessRule::PremiumOnly,
        CreationType::ResumeReview,
        "Review the uploaded resume",
    );

    let documents = Arc::clone(&state.documents);
    let llm = Arc::clone(&state.llm);

    let response = run_action(&state, &caller, &entitlement, spec, move || async move {
        let text = documents
            .extract_text(resume.bytes)
            .await
            .map_err(AppError::provider)?;
        llm.complete(
            &resume_review_prompt(&text),
            CompletionOptions::with_max_tokens(RESUME_REVIEW_MAX_TOKENS),
        )
        .await
        .map_err(AppError::provider)
    })
    .await?;

    Ok(Json(response))
}

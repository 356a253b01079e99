use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validators::{check_body_length, clean_body};

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub body: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub cleaned_body: String,
}

/// POST /api/validate
///
/// Dry run of the gobit body rules: 400 if too long, otherwise the masked text.
pub async fn validate(form: web::Json<ValidateRequest>) -> Result<HttpResponse, AppError> {
    check_body_length(&form.body)?;

    Ok(HttpResponse::Ok().json(ValidateResponse {
        valid: true,
        cleaned_body: clean_body(&form.body),
    }))
}

//! # Question API Handlers
//!
//! HTTP surface of the question pipeline: paper generation (with caching),
//! syllabus lookup, and test evaluation.

use crate::error::{AppError, AppResult};
use crate::questions::cache::PaperCache;
use crate::questions::evaluation::{evaluate, performance_insights};
use crate::questions::generator::generate_paper;
use crate::questions::models::{ExamType, GenerationRequest, Question};
use crate::questions::syllabus;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// `POST /api/v1/questions/generate`
///
/// Identical requests within the cache TTL are served from the cache without
/// touching Gemini.
pub async fn generate_questions(
    state: web::Data<AppState>,
    body: web::Json<GenerationRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let key = PaperCache::key(&request);

    let cached = state.question_cache.write().unwrap().get(&key);
    if let Some(paper) = cached {
        info!("Serving generated paper from cache");
        return Ok(HttpResponse::Ok().json(json!({
            "cached": true,
            "paper": paper,
        })));
    }

    let config = state.get_config();
    let paper = generate_paper(state.http.clone(), &config, &request).await?;

    state.record_questions_generated(paper.questions.len() as u64);
    state
        .question_cache
        .write()
        .unwrap()
        .insert(key, paper.clone());

    Ok(HttpResponse::Ok().json(json!({
        "cached": false,
        "paper": paper,
    })))
}

/// `GET /api/v1/syllabus/{exam}`
pub async fn get_syllabus(path: web::Path<String>) -> AppResult<HttpResponse> {
    let exam: ExamType = path
        .into_inner()
        .parse()
        .map_err(AppError::ValidationError)?;

    let mut subjects = BTreeMap::new();
    for &subject in syllabus::subjects(exam) {
        subjects.insert(
            subject.to_string(),
            syllabus::chapters(exam, subject).unwrap_or(&[]),
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "exam": exam,
        "subjects": subjects,
        "marking_scheme": syllabus::marking_scheme(exam),
    })))
}

/// Body of `POST /api/v1/evaluate`.
#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub exam: ExamType,
    pub questions: Vec<Question>,
    /// Question id -> chosen option; missing or null means unattempted
    #[serde(default)]
    pub answers: BTreeMap<u32, Option<String>>,
}

/// `POST /api/v1/evaluate`
pub async fn evaluate_test(body: web::Json<EvaluationRequest>) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let result = evaluate(request.exam, &request.questions, &request.answers)?;
    let insights = performance_insights(&result);

    Ok(HttpResponse::Ok().json(json!({
        "result": result,
        "insights": insights,
    })))
}

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::questions::CreateQuestion;
use crate::schemas::question::{
    QuestionCreate, QuestionImportResponse, QuestionListQuery, QuestionResponse,
};
use crate::services::question_bank::{self, ImportError, QuestionDraft};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        // The upload size is enforced while streaming the file field.
        .route("/upload", post(upload_questions).layer(DefaultBodyLimit::disable()))
        .route("/:question_id", delete(delete_question))
}

async fn list_questions(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<QuestionListQuery>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let quiz_type = validation::quiz_type_filter(params.quiz_type.as_deref())?;
    let questions = repositories::questions::list(state.db(), quiz_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn create_question(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let draft = QuestionDraft {
        quiz_type: payload.quiz_type,
        question: payload.question,
        options: [payload.option1, payload.option2, payload.option3, payload.option4],
        answer: payload.answer,
    };
    let valid = draft.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = repositories::questions::create(
        state.db(),
        CreateQuestion {
            quiz_type: valid.quiz_type,
            question: &valid.question,
            options: valid.option_refs(),
            answer: &valid.answer,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(question_id = question.id, quiz_type = %question.quiz_type, "Question added");
    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn upload_questions(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QuestionImportResponse>, ApiError> {
    let max_mb = state.settings().import().max_upload_size_mb;
    let max_bytes = max_mb * 1024 * 1024;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        validation::xlsx_filename(field.file_name())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::BadRequest(format!("File size exceeds {max_mb}MB limit")));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
        break;
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("No file uploaded!".to_string()))?;

    let parsed = question_bank::parse_workbook(&file_bytes).map_err(|err| match err {
        ImportError::Unreadable(_) | ImportError::MissingColumns(_) => {
            ApiError::BadRequest(err.to_string())
        }
    })?;

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start import"))?;
    for question in &parsed.questions {
        repositories::questions::create(
            &mut *tx,
            CreateQuestion {
                quiz_type: question.quiz_type,
                question: &question.question,
                options: question.option_refs(),
                answer: &question.answer,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to insert uploaded questions"))?;
    }
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit uploaded questions"))?;

    tracing::info!(
        inserted = parsed.questions.len(),
        rejected = parsed.errors.len(),
        "Question bank uploaded"
    );
    Ok(Json(QuestionImportResponse { inserted: parsed.questions.len(), errors: parsed.errors }))
}

async fn delete_question(
    _admin: CurrentAdmin,
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::attachments::multipart::UploadForm;
use crate::attachments::{
    discard, remove_paths, AttachmentStorage, StoredObject, Upload, CATEGORY_FOLDER,
    SUBCATEGORY_FOLDER,
};
use crate::categories::query::{CategoryListParams, CategoryQuery};
use crate::categories::store::{self, CategoryChanges, SubCategoryChanges};
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::jobs::handlers::MessageResponse;
use crate::models::category::{Category, CategoryStatus, SubCategory};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    pub data: Vec<Category>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {what} ID")))
}

fn text(form: &UploadForm, name: &str) -> Option<String> {
    form.field(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn single_image(form: &mut UploadForm, field: &str) -> Result<Option<Upload>, AppError> {
    let mut images = form.take_files(field);
    if images.len() > 1 {
        return Err(AppError::Validation(format!("Only one {field} may be uploaded")));
    }
    if let Some(extra) = form.remaining_files().first() {
        return Err(AppError::Validation(format!(
            "Unexpected file field '{}'",
            extra.field
        )));
    }
    Ok(images.pop())
}

fn parse_status(form: &UploadForm) -> Result<Option<i16>, AppError> {
    text(form, "categoryStatus")
        .map(|raw| {
            raw.parse::<CategoryStatus>()
                .map(|s| s as i16)
                .map_err(AppError::Validation)
        })
        .transpose()
}

/// Image paths on categories keep a leading slash: `/uploads/...`.
async fn store_image(
    storage: &dyn AttachmentStorage,
    folder: &str,
    image: Option<&Upload>,
) -> Result<Option<(StoredObject, String)>, AppError> {
    match image {
        Some(upload) => {
            let stored = storage.put(folder, upload).await?;
            let path = format!("/{}", stored.public_path);
            Ok(Some((stored, path)))
        }
        None => Ok(None),
    }
}

/// Drops the new image if the row write failed; otherwise drops the image it
/// replaced.
async fn settle_image<T>(
    storage: &dyn AttachmentStorage,
    new_image: Option<(StoredObject, String)>,
    old_image: Option<String>,
    outcome: Result<Option<T>, sqlx::Error>,
    not_found: AppError,
) -> Result<T, AppError> {
    let new_objects: Vec<StoredObject> = new_image.iter().map(|(s, _)| s.clone()).collect();
    match outcome {
        Ok(Some(row)) => {
            if !new_objects.is_empty() {
                let old: Vec<String> = old_image.into_iter().filter(|p| !p.is_empty()).collect();
                remove_paths(storage, &old).await;
            }
            Ok(row)
        }
        Ok(None) => {
            discard(storage, &new_objects).await;
            Err(not_found)
        }
        Err(e) => {
            discard(storage, &new_objects).await;
            Err(e.into())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/categories
pub async fn handle_create_category(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let mut form = UploadForm::read(multipart, state.upload_limits()).await?;
    let name = text(&form, "categoryName")
        .ok_or_else(|| AppError::Validation("Category name is required".to_string()))?;
    let status = parse_status(&form)?;
    let sku = form.field("categorySKU").map(|s| s.trim().to_string());
    let image = single_image(&mut form, "categoryImage")?;

    let stored = store_image(state.storage.as_ref(), CATEGORY_FOLDER, image.as_ref()).await?;
    let changes = CategoryChanges {
        name: None,
        sku,
        status,
        image: stored.as_ref().map(|(_, path)| path.clone()),
    };
    let outcome = store::insert_category(&state.db, &name, &changes).await.map(Some);
    let category = settle_image(
        state.storage.as_ref(),
        stored,
        None,
        outcome,
        AppError::Internal(anyhow::anyhow!("category insert returned no row")),
    )
    .await?;

    info!("Created category {} ({})", category.id, category.category_name);
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CategoryListParams>,
) -> Result<Json<CategoryPage>, AppError> {
    let query = CategoryQuery::parse(params)?;
    let (data, total) = store::list_categories(&state.db, &query).await?;
    Ok(Json(CategoryPage {
        data,
        total,
        page: query.page,
        total_pages: query.total_pages(total),
    }))
}

/// GET /api/categories/:id
pub async fn handle_get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id, "category")?;
    store::get_category(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// PUT /api/categories/:id
pub async fn handle_update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id, "category")?;
    let mut form = UploadForm::read(multipart, state.upload_limits()).await?;
    let status = parse_status(&form)?;
    let image = single_image(&mut form, "categoryImage")?;

    let existing = store::get_category(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let stored = store_image(state.storage.as_ref(), CATEGORY_FOLDER, image.as_ref()).await?;
    let changes = CategoryChanges {
        name: text(&form, "categoryName"),
        sku: form.field("categorySKU").map(|s| s.trim().to_string()),
        status,
        image: stored.as_ref().map(|(_, path)| path.clone()),
    };
    let outcome = store::update_category(&state.db, id, &changes).await;
    let category = settle_image(
        state.storage.as_ref(),
        stored,
        existing.category_image,
        outcome,
        AppError::NotFound("Category not found".to_string()),
    )
    .await?;

    info!("Updated category {id}");
    Ok(Json(category))
}

/// DELETE /api/categories/:id
pub async fn handle_delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "category")?;
    let images = store::delete_category(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    remove_paths(state.storage.as_ref(), &images).await;

    info!("Deleted category {id}");
    Ok(Json(MessageResponse {
        message: "Category deleted successfully",
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-categories
// ────────────────────────────────────────────────────────────────────────────

async fn require_parent(state: &AppState, raw: &str) -> Result<Uuid, AppError> {
    let parent = parse_id(raw, "parent category")?;
    if !store::category_exists(&state.db, parent).await? {
        return Err(AppError::Validation("Parent category not found".to_string()));
    }
    Ok(parent)
}

/// POST /api/subcategories
pub async fn handle_create_subcategory(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubCategory>), AppError> {
    let mut form = UploadForm::read(multipart, state.upload_limits()).await?;
    let (Some(name), Some(parent)) = (text(&form, "subCategoryName"), text(&form, "parentCategory"))
    else {
        return Err(AppError::Validation(
            "Sub-category name and parent category are required".to_string(),
        ));
    };
    let image = single_image(&mut form, "subCategoryImage")?;
    let parent = require_parent(&state, &parent).await?;

    let stored = store_image(state.storage.as_ref(), SUBCATEGORY_FOLDER, image.as_ref()).await?;
    let path = stored.as_ref().map(|(_, path)| path.clone());
    let outcome = store::insert_subcategory(&state.db, &name, parent, path.as_deref())
        .await
        .map(Some);
    let sub = settle_image(
        state.storage.as_ref(),
        stored,
        None,
        outcome,
        AppError::Internal(anyhow::anyhow!("sub-category insert returned no row")),
    )
    .await?;

    info!("Created sub-category {} under {}", sub.id, sub.parent_category);
    Ok((StatusCode::CREATED, Json(sub)))
}

/// GET /api/subcategories
pub async fn handle_list_subcategories(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubCategory>>, AppError> {
    Ok(Json(store::list_subcategories(&state.db).await?))
}

/// GET /api/subcategories/:id
pub async fn handle_get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubCategory>, AppError> {
    let id = parse_id(&id, "sub-category")?;
    store::get_subcategory(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Sub-category not found".to_string()))
}

/// PUT /api/subcategories/:id
pub async fn handle_update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SubCategory>, AppError> {
    let id = parse_id(&id, "sub-category")?;
    let mut form = UploadForm::read(multipart, state.upload_limits()).await?;
    let image = single_image(&mut form, "subCategoryImage")?;

    let existing = store::get_subcategory(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-category not found".to_string()))?;
    let parent = match text(&form, "parentCategory") {
        Some(raw) => Some(require_parent(&state, &raw).await?),
        None => None,
    };

    let stored = store_image(state.storage.as_ref(), SUBCATEGORY_FOLDER, image.as_ref()).await?;
    let changes = SubCategoryChanges {
        name: text(&form, "subCategoryName"),
        parent,
        image: stored.as_ref().map(|(_, path)| path.clone()),
    };
    let outcome = store::update_subcategory(&state.db, id, &changes).await;
    let sub = settle_image(
        state.storage.as_ref(),
        stored,
        existing.sub_category_image,
        outcome,
        AppError::NotFound("Sub-category not found".to_string()),
    )
    .await?;

    info!("Updated sub-category {id}");
    Ok(Json(sub))
}

/// DELETE /api/subcategories/:id
pub async fn handle_delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "sub-category")?;
    let image = store::delete_subcategory(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-category not found".to_string()))?;
    let images: Vec<String> = image.into_iter().filter(|p| !p.is_empty()).collect();
    remove_paths(state.storage.as_ref(), &images).await;

    info!("Deleted sub-category {id}");
    Ok(Json(MessageResponse {
        message: "Sub-category deleted successfully",
    }))
}

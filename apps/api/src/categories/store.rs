use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::categories::query::CategoryQuery;
use crate::models::category::{Category, SubCategory};

/// Fields written by a category create or update. `None` leaves the stored
/// value unchanged on update.
#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub status: Option<i16>,
    pub image: Option<String>,
}

#[derive(Debug, Default)]
pub struct SubCategoryChanges {
    pub name: Option<String>,
    pub parent: Option<Uuid>,
    pub image: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_category(
    pool: &PgPool,
    name: &str,
    changes: &CategoryChanges,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO categories
            (id, category_name, category_image, category_sku, category_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&changes.image)
    .bind(changes.sku.clone().unwrap_or_default())
    .bind(changes.status.unwrap_or(0))
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CategoryQuery) {
    qb.push(" WHERE TRUE");
    if let Some(pattern) = &query.name_pattern {
        qb.push(" AND category_name ILIKE ").push_bind(pattern.clone());
    }
    if let Some(status) = query.status {
        qb.push(" AND category_status = ").push_bind(status as i16);
    }
}

/// One page of categories plus the total number of matches.
pub async fn list_categories(
    pool: &PgPool,
    query: &CategoryQuery,
) -> Result<(Vec<Category>, i64), sqlx::Error> {
    let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM categories");
    push_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM categories");
    push_filters(&mut select, query);
    // sort column and direction come from closed enums, never from input
    select
        .push(" ORDER BY ")
        .push(query.sort.column())
        .push(" ")
        .push(query.order.keyword())
        .push(", id LIMIT ")
        .push_bind(i64::from(query.limit))
        .push(" OFFSET ")
        .push_bind(query.offset());
    let rows = select.build_query_as().fetch_all(pool).await?;

    Ok((rows, total))
}

pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_category(
    pool: &PgPool,
    id: Uuid,
    changes: &CategoryChanges,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE categories SET
            category_name   = COALESCE($2, category_name),
            category_sku    = COALESCE($3, category_sku),
            category_status = COALESCE($4, category_status),
            category_image  = COALESCE($5, category_image),
            updated_at      = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.sku)
    .bind(changes.status)
    .bind(&changes.image)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

/// Deletes the category and, by cascade, its sub-categories. Returns every
/// image path the deleted rows referenced, or `None` if nothing matched.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<Option<Vec<String>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let child_images: Vec<Option<String>> = sqlx::query_scalar(
        "SELECT sub_category_image FROM sub_categories WHERE parent_category = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let deleted: Option<Category> =
        sqlx::query_as("DELETE FROM categories WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(deleted) = deleted else {
        return Ok(None);
    };
    tx.commit().await?;

    Ok(Some(
        deleted
            .category_image
            .into_iter()
            .chain(child_images.into_iter().flatten())
            .filter(|p| !p.is_empty())
            .collect(),
    ))
}

pub async fn category_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-categories
// ────────────────────────────────────────────────────────────────────────────

const SUBCATEGORY_SELECT: &str = r#"
    SELECT s.id, s.sub_category_name, s.parent_category,
           c.category_name AS parent_category_name,
           s.sub_category_image, s.created_at, s.updated_at
    FROM sub_categories s
    LEFT JOIN categories c ON c.id = s.parent_category
"#;

pub async fn insert_subcategory(
    pool: &PgPool,
    name: &str,
    parent: Uuid,
    image: Option<&str>,
) -> Result<SubCategory, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO sub_categories
            (id, sub_category_name, parent_category, sub_category_image, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(parent)
    .bind(image)
    .bind(now)
    .execute(pool)
    .await?;

    get_subcategory(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Newest first, with the parent's name joined in.
pub async fn list_subcategories(pool: &PgPool) -> Result<Vec<SubCategory>, sqlx::Error> {
    sqlx::query_as(&format!("{SUBCATEGORY_SELECT} ORDER BY s.created_at DESC"))
        .fetch_all(pool)
        .await
}

pub async fn get_subcategory(pool: &PgPool, id: Uuid) -> Result<Option<SubCategory>, sqlx::Error> {
    sqlx::query_as(&format!("{SUBCATEGORY_SELECT} WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_subcategory(
    pool: &PgPool,
    id: Uuid,
    changes: &SubCategoryChanges,
) -> Result<Option<SubCategory>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE sub_categories SET
            sub_category_name  = COALESCE($2, sub_category_name),
            parent_category    = COALESCE($3, parent_category),
            sub_category_image = COALESCE($4, sub_category_image),
            updated_at         = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&changes.name)
    .bind(changes.parent)
    .bind(&changes.image)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    get_subcategory(pool, id).await
}

/// Returns the deleted row's image path, `Some(None)` if it had none.
pub async fn delete_subcategory(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Option<String>>, sqlx::Error> {
    sqlx::query_scalar("DELETE FROM sub_categories WHERE id = $1 RETURNING sub_category_image")
        .bind(id)
        .fetch_optional(pool)
        .await
}

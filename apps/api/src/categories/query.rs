use serde::Deserialize;

use crate::errors::AppError;
use crate::models::category::CategoryStatus;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw `GET /api/categories` query string. Everything arrives as text so
/// bad values become validation errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    UpdatedAt,
    CategoryName,
}

impl SortColumn {
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::CategoryName => "category_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryQuery {
    /// ILIKE pattern, already escaped and wrapped in `%`.
    pub name_pattern: Option<String>,
    pub status: Option<CategoryStatus>,
    pub page: u32,
    pub limit: u32,
    pub sort: SortColumn,
    pub order: SortOrder,
}

impl CategoryQuery {
    pub fn parse(params: CategoryListParams) -> Result<Self, AppError> {
        let name_pattern = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(&s)));

        let status = match blank_to_none(params.status) {
            Some(raw) => Some(raw.parse::<CategoryStatus>().map_err(AppError::Validation)?),
            None => None,
        };

        let page = positive("page", params.page, DEFAULT_PAGE)?;
        let limit = positive("limit", params.limit, DEFAULT_LIMIT)?.min(MAX_LIMIT);

        let sort = match blank_to_none(params.sort).as_deref() {
            None | Some("createdAt") => SortColumn::CreatedAt,
            Some("updatedAt") => SortColumn::UpdatedAt,
            Some("categoryName") => SortColumn::CategoryName,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "sort must be createdAt, updatedAt or categoryName, got '{other}'"
                )))
            }
        };
        let order = match blank_to_none(params.order).as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "order must be asc or desc, got '{other}'"
                )))
            }
        };

        Ok(CategoryQuery {
            name_pattern,
            status,
            page,
            limit,
            sort,
            order,
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn positive(name: &str, raw: Option<String>, default: u32) -> Result<u32, AppError> {
    match blank_to_none(raw) {
        None => Ok(default),
        Some(v) => match v.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(AppError::Validation(format!(
                "{name} must be a positive integer, got '{v}'"
            ))),
        },
    }
}

/// Escapes LIKE metacharacters so user input matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub category_name: String,
    pub category_image: Option<String>,
    #[serde(rename = "categorySKU")]
    pub category_sku: String,
    pub category_status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: Uuid,
    pub sub_category_name: String,
    pub parent_category: Uuid,
    pub parent_category_name: Option<String>,
    pub sub_category_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `categoryStatus` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStatus {
    Active = 0,
    Inactive = 1,
    Deleted = 2,
}

impl TryFrom<i16> for CategoryStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CategoryStatus::Active),
            1 => Ok(CategoryStatus::Inactive),
            2 => Ok(CategoryStatus::Deleted),
            other => Err(format!("categoryStatus must be 0, 1 or 2, got {other}")),
        }
    }
}

impl std::str::FromStr for CategoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: i16 = s
            .trim()
            .parse()
            .map_err(|_| format!("categoryStatus must be a number, got '{s}'"))?;
        CategoryStatus::try_from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!("0".parse::<CategoryStatus>(), Ok(CategoryStatus::Active));
        assert_eq!(" 2 ".parse::<CategoryStatus>(), Ok(CategoryStatus::Deleted));
        assert!("3".parse::<CategoryStatus>().is_err());
        assert!("active".parse::<CategoryStatus>().is_err());
        assert_eq!(CategoryStatus::Inactive as i16, 1);
    }
}

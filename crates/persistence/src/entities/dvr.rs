//! DVR entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Dvr;
use sqlx::FromRow;

/// Database row mapping for the dvrs table.
#[derive(Debug, Clone, FromRow)]
pub struct DvrEntity {
    pub id: i64,
    pub default_name: String,
    pub custom_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DvrEntity> for Dvr {
    fn from(entity: DvrEntity) -> Self {
        Self {
            id: entity.id,
            default_name: entity.default_name,
            custom_name: entity.custom_name,
            latitude: entity.latitude,
            longitude: entity.longitude,
        }
    }
}

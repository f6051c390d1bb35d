use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Catalog entry: reaching `points_required` stamps earns the prize
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::prizes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Prize {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::prizes)]
pub struct NewPrize {
    pub business_id: Uuid,
    pub name: String,
    pub points_required: i32,
}

#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::prizes)]
pub struct UpdatePrize {
    pub name: Option<String>,
    pub points_required: Option<i32>,
}

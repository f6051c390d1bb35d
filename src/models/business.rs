use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// A tenant owning a stamp card, a prize catalog and coupons
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::businesses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::businesses)]
pub struct NewBusiness {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::businesses)]
pub struct UpdateBusiness {
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

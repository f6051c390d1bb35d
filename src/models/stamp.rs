use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// One loyalty point issued to a user at a business
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::stamps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Stamp {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::stamps)]
pub struct NewStamp {
    pub business_id: Uuid,
    pub user_id: String,
}

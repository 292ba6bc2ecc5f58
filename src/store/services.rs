/// Service rows owned by a bay
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use crate::store::{bays, StoreError};

const SERVICE_COLUMNS: &str =
    "id, uuid, name, bay_uuid, manifest, status, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: i64,
    pub uuid: String,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub manifest: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewService {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub manifest: Option<String>,
    pub status: Option<String>,
}

/// Insert a service under an existing bay
pub async fn create_service(pool: &SqlitePool, service: NewService) -> Result<Service, StoreError> {
    let uuid = service.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    bays::get_bay_by_uuid(&mut *tx, &service.bay_uuid).await?;

    let result = sqlx::query_as::<_, Service>(&format!(
        r#"
        insert into services (uuid, name, bay_uuid, manifest, status, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning {SERVICE_COLUMNS}
        "#
    ))
    .bind(&uuid)
    .bind(&service.name)
    .bind(&service.bay_uuid)
    .bind(&service.manifest)
    .bind(&service.status)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(service) => {
            tx.commit().await?;
            Ok(service)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::ServiceAlreadyExists { uuid })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_service_by_id<'c, E>(executor: E, id: i64) -> Result<Service, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Service>(&format!(
        "select {SERVICE_COLUMNS} from services where id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ServiceNotFound {
        ident: id.to_string(),
    })
}

pub async fn get_service_by_uuid<'c, E>(executor: E, uuid: &str) -> Result<Service, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Service>(&format!(
        "select {SERVICE_COLUMNS} from services where uuid = ?"
    ))
    .bind(uuid)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ServiceNotFound {
        ident: uuid.to_string(),
    })
}

pub async fn list_services_by_bay(
    pool: &SqlitePool,
    bay_uuid: &str,
) -> Result<Vec<Service>, StoreError> {
    let services = sqlx::query_as::<_, Service>(&format!(
        "select {SERVICE_COLUMNS} from services where bay_uuid = ?"
    ))
    .bind(bay_uuid)
    .fetch_all(pool)
    .await?;
    Ok(services)
}

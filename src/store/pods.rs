/// Pod rows owned by a bay
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use crate::store::{bays, StoreError};

const POD_COLUMNS: &str = "id, uuid, name, bay_uuid, manifest, status, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pod {
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
pub struct NewPod {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub manifest: Option<String>,
    pub status: Option<String>,
}

/// Insert a pod under an existing bay.
///
/// The owning bay is verified inside the same transaction as the insert, so
/// a pod can never be created against a bay that is concurrently destroyed.
pub async fn create_pod(pool: &SqlitePool, pod: NewPod) -> Result<Pod, StoreError> {
    let uuid = pod.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    bays::get_bay_by_uuid(&mut *tx, &pod.bay_uuid).await?;

    let result = sqlx::query_as::<_, Pod>(&format!(
        r#"
        insert into pods (uuid, name, bay_uuid, manifest, status, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning {POD_COLUMNS}
        "#
    ))
    .bind(&uuid)
    .bind(&pod.name)
    .bind(&pod.bay_uuid)
    .bind(&pod.manifest)
    .bind(&pod.status)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(pod) => {
            tx.commit().await?;
            Ok(pod)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::PodAlreadyExists { uuid })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_pod_by_id<'c, E>(executor: E, id: i64) -> Result<Pod, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Pod>(&format!("select {POD_COLUMNS} from pods where id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| StoreError::PodNotFound {
            ident: id.to_string(),
        })
}

pub async fn get_pod_by_uuid<'c, E>(executor: E, uuid: &str) -> Result<Pod, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Pod>(&format!("select {POD_COLUMNS} from pods where uuid = ?"))
        .bind(uuid)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| StoreError::PodNotFound {
            ident: uuid.to_string(),
        })
}

pub async fn list_pods_by_bay(pool: &SqlitePool, bay_uuid: &str) -> Result<Vec<Pod>, StoreError> {
    let pods =
        sqlx::query_as::<_, Pod>(&format!("select {POD_COLUMNS} from pods where bay_uuid = ?"))
            .bind(bay_uuid)
            .fetch_all(pool)
            .await?;
    Ok(pods)
}

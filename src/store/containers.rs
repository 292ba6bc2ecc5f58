/// Container rows owned by a bay
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use crate::store::{bays, StoreError};

const CONTAINER_COLUMNS: &str = "id, uuid, name, bay_uuid, image, status, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Container {
    pub id: i64,
    pub uuid: String,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub image: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewContainer {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub image: Option<String>,
    pub status: Option<String>,
}

/// Insert a container under an existing bay
pub async fn create_container(
    pool: &SqlitePool,
    container: NewContainer,
) -> Result<Container, StoreError> {
    let uuid = container.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    bays::get_bay_by_uuid(&mut *tx, &container.bay_uuid).await?;

    let result = sqlx::query_as::<_, Container>(&format!(
        r#"
        insert into containers (uuid, name, bay_uuid, image, status, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning {CONTAINER_COLUMNS}
        "#
    ))
    .bind(&uuid)
    .bind(&container.name)
    .bind(&container.bay_uuid)
    .bind(&container.image)
    .bind(&container.status)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(container) => {
            tx.commit().await?;
            Ok(container)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::ContainerAlreadyExists { uuid })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_container_by_id<'c, E>(executor: E, id: i64) -> Result<Container, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Container>(&format!(
        "select {CONTAINER_COLUMNS} from containers where id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ContainerNotFound {
        ident: id.to_string(),
    })
}

pub async fn get_container_by_uuid<'c, E>(executor: E, uuid: &str) -> Result<Container, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Container>(&format!(
        "select {CONTAINER_COLUMNS} from containers where uuid = ?"
    ))
    .bind(uuid)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ContainerNotFound {
        ident: uuid.to_string(),
    })
}

pub async fn list_containers_by_bay(
    pool: &SqlitePool,
    bay_uuid: &str,
) -> Result<Vec<Container>, StoreError> {
    let containers = sqlx::query_as::<_, Container>(&format!(
        "select {CONTAINER_COLUMNS} from containers where bay_uuid = ?"
    ))
    .bind(bay_uuid)
    .fetch_all(pool)
    .await?;
    Ok(containers)
}

/// Replication controller rows owned by a bay
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use crate::store::{bays, StoreError};

const RC_COLUMNS: &str = "id, uuid, name, bay_uuid, manifest, status, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReplicationController {
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
pub struct NewReplicationController {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub bay_uuid: String,
    pub manifest: Option<String>,
    pub status: Option<String>,
}

/// Insert a replication controller under an existing bay
pub async fn create_rc(
    pool: &SqlitePool,
    rc: NewReplicationController,
) -> Result<ReplicationController, StoreError> {
    let uuid = rc.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    bays::get_bay_by_uuid(&mut *tx, &rc.bay_uuid).await?;

    let result = sqlx::query_as::<_, ReplicationController>(&format!(
        r#"
        insert into replication_controllers
            (uuid, name, bay_uuid, manifest, status, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning {RC_COLUMNS}
        "#
    ))
    .bind(&uuid)
    .bind(&rc.name)
    .bind(&rc.bay_uuid)
    .bind(&rc.manifest)
    .bind(&rc.status)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(rc) => {
            tx.commit().await?;
            Ok(rc)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::ReplicationControllerAlreadyExists { uuid })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_rc_by_id<'c, E>(executor: E, id: i64) -> Result<ReplicationController, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, ReplicationController>(&format!(
        "select {RC_COLUMNS} from replication_controllers where id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ReplicationControllerNotFound {
        ident: id.to_string(),
    })
}

pub async fn get_rc_by_uuid<'c, E>(
    executor: E,
    uuid: &str,
) -> Result<ReplicationController, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, ReplicationController>(&format!(
        "select {RC_COLUMNS} from replication_controllers where uuid = ?"
    ))
    .bind(uuid)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| StoreError::ReplicationControllerNotFound {
        ident: uuid.to_string(),
    })
}

pub async fn list_rcs_by_bay(
    pool: &SqlitePool,
    bay_uuid: &str,
) -> Result<Vec<ReplicationController>, StoreError> {
    let rcs = sqlx::query_as::<_, ReplicationController>(&format!(
        "select {RC_COLUMNS} from replication_controllers where bay_uuid = ?"
    ))
    .bind(bay_uuid)
    .fetch_all(pool)
    .await?;
    Ok(rcs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{connect_in_memory, NewBay};

    #[tokio::test]
    async fn test_create_rc_requires_existing_bay() {
        let pool = connect_in_memory().await.unwrap();

        let result = create_rc(
            &pool,
            NewReplicationController {
                bay_uuid: "no-such-bay".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(StoreError::BayNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_and_get_rc() {
        let pool = connect_in_memory().await.unwrap();
        let bay = bays::create_bay(
            &pool,
            NewBay {
                node_count: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let rc = create_rc(
            &pool,
            NewReplicationController {
                name: Some("test-rc".to_string()),
                bay_uuid: bay.uuid.clone(),
                manifest: Some("kind: ReplicationController".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let fetched = get_rc_by_id(&pool, rc.id).await.unwrap();
        assert_eq!(fetched.uuid, rc.uuid);

        let by_uuid = get_rc_by_uuid(&pool, &rc.uuid).await.unwrap();
        assert_eq!(by_uuid.id, rc.id);

        let listed = list_rcs_by_bay(&pool, &bay.uuid).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}

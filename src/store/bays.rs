/// Bay aggregate root: create, lookup, list, update, cascading destroy
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::store::{BayIdent, StoreError};

const BAY_COLUMNS: &str = "id, uuid, name, baymodel_id, node_count, status, created_at, updated_at";

/// A managed cluster and its metadata
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bay {
    pub id: i64,
    pub uuid: String,
    pub name: Option<String>,
    pub baymodel_id: Option<String>,
    pub node_count: i64,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for bay creation; a uuid is generated when none is supplied
#[derive(Debug, Clone, Default)]
pub struct NewBay {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub baymodel_id: Option<String>,
    pub node_count: i64,
    pub status: Option<String>,
}

/// Partial update of a bay row.
///
/// `uuid` is present only so an attempted change of the immutable identifier
/// can be rejected explicitly.
#[derive(Debug, Clone, Default)]
pub struct BayPatch {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub baymodel_id: Option<String>,
    pub node_count: Option<i64>,
    pub status: Option<String>,
}

/// Insert a new bay; a duplicate uuid fails with [`StoreError::BayAlreadyExists`]
pub async fn create_bay(pool: &SqlitePool, bay: NewBay) -> Result<Bay, StoreError> {
    let uuid = bay.uuid.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let result = sqlx::query_as::<_, Bay>(&format!(
        r#"
        insert into bays (uuid, name, baymodel_id, node_count, status, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning {BAY_COLUMNS}
        "#
    ))
    .bind(&uuid)
    .bind(&bay.name)
    .bind(&bay.baymodel_id)
    .bind(bay.node_count)
    .bind(&bay.status)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(bay) => {
            info!("Created bay {} (id {})", bay.uuid, bay.id);
            Ok(bay)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::BayAlreadyExists { uuid })
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_bay_by_id<'c, E>(executor: E, id: i64) -> Result<Bay, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Bay>(&format!("select {BAY_COLUMNS} from bays where id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| StoreError::BayNotFound {
            ident: id.to_string(),
        })
}

pub async fn get_bay_by_uuid<'c, E>(executor: E, uuid: &str) -> Result<Bay, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Bay>(&format!("select {BAY_COLUMNS} from bays where uuid = ?"))
        .bind(uuid)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| StoreError::BayNotFound {
            ident: uuid.to_string(),
        })
}

pub async fn get_bay_by_name<'c, E>(executor: E, name: &str) -> Result<Bay, StoreError>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, Bay>(&format!("select {BAY_COLUMNS} from bays where name = ?"))
        .bind(name)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| StoreError::BayNotFound {
            ident: name.to_string(),
        })
}

/// Resolve an id-or-uuid identifier to a concrete row
pub async fn get_bay<'c, E>(executor: E, ident: &BayIdent) -> Result<Bay, StoreError>
where
    E: SqliteExecutor<'c>,
{
    match ident {
        BayIdent::Id(id) => get_bay_by_id(executor, *id).await,
        BayIdent::Uuid(uuid) => get_bay_by_uuid(executor, uuid).await,
    }
}

/// List bays matching every supplied exact-match filter.
///
/// Recognized filter keys are `baymodel_id`, `name` and `node_count`; an
/// unknown key (or a non-numeric `node_count` value) matches nothing and
/// yields an empty result set rather than an error.
pub async fn list_bays(
    pool: &SqlitePool,
    filters: &HashMap<String, String>,
) -> Result<Vec<Bay>, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "select {BAY_COLUMNS} from bays where 1 = 1"
    ));

    for (key, value) in filters {
        match key.as_str() {
            "baymodel_id" => {
                query.push(" and baymodel_id = ").push_bind(value.clone());
            }
            "name" => {
                query.push(" and name = ").push_bind(value.clone());
            }
            "node_count" => match value.parse::<i64>() {
                Ok(count) => {
                    query.push(" and node_count = ").push_bind(count);
                }
                Err(_) => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        }
    }

    let bays = query.build_query_as::<Bay>().fetch_all(pool).await?;
    Ok(bays)
}

/// Apply a partial update to the bay resolved from `ident`.
///
/// Attempting to change the immutable uuid fails with
/// [`StoreError::InvalidParameterValue`] before the row is touched.
pub async fn update_bay(
    pool: &SqlitePool,
    ident: &BayIdent,
    patch: BayPatch,
) -> Result<Bay, StoreError> {
    if patch.uuid.is_some() {
        return Err(StoreError::InvalidParameterValue {
            parameter: "uuid".to_string(),
            reason: "bay uuid is immutable".to_string(),
        });
    }

    let bay = get_bay(pool, ident).await?;

    let mut query = QueryBuilder::<Sqlite>::new("update bays set updated_at = ");
    query.push_bind(Utc::now());
    if let Some(name) = patch.name {
        query.push(", name = ").push_bind(name);
    }
    if let Some(baymodel_id) = patch.baymodel_id {
        query.push(", baymodel_id = ").push_bind(baymodel_id);
    }
    if let Some(node_count) = patch.node_count {
        query.push(", node_count = ").push_bind(node_count);
    }
    if let Some(status) = patch.status {
        query.push(", status = ").push_bind(status);
    }
    query.push(" where id = ").push_bind(bay.id);
    query.push(format!(" returning {BAY_COLUMNS}"));

    let updated = query.build_query_as::<Bay>().fetch_one(pool).await?;
    Ok(updated)
}

/// Destroy the bay resolved from `ident` together with every dependent
/// pod, service, replication controller and container row, as one
/// transaction. Either everything goes or nothing does.
pub async fn destroy_bay(pool: &SqlitePool, ident: &BayIdent) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let bay = get_bay(&mut *tx, ident).await?;

    for table in ["pods", "services", "replication_controllers", "containers"] {
        sqlx::query(&format!("delete from {table} where bay_uuid = ?"))
            .bind(&bay.uuid)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("delete from bays where id = ?")
        .bind(bay.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Destroyed bay {} and its dependents", bay.uuid);
    Ok(())
}

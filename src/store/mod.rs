/// Bay catalog persistence over SQLite
pub mod bays;
pub mod containers;
pub mod pods;
pub mod rcs;
pub mod services;

pub use bays::{Bay, BayPatch, NewBay};
pub use containers::{Container, NewContainer};
pub use pods::{NewPod, Pod};
pub use rcs::{NewReplicationController, ReplicationController};
pub use services::{NewService, Service};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the bay catalog
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a bay with uuid {uuid} already exists")]
    BayAlreadyExists { uuid: String },

    #[error("bay {ident} could not be found")]
    BayNotFound { ident: String },

    #[error("a pod with uuid {uuid} already exists")]
    PodAlreadyExists { uuid: String },

    #[error("pod {ident} could not be found")]
    PodNotFound { ident: String },

    #[error("a service with uuid {uuid} already exists")]
    ServiceAlreadyExists { uuid: String },

    #[error("service {ident} could not be found")]
    ServiceNotFound { ident: String },

    #[error("a replication controller with uuid {uuid} already exists")]
    ReplicationControllerAlreadyExists { uuid: String },

    #[error("replication controller {ident} could not be found")]
    ReplicationControllerNotFound { ident: String },

    #[error("a container with uuid {uuid} already exists")]
    ContainerAlreadyExists { uuid: String },

    #[error("container {ident} could not be found")]
    ContainerNotFound { ident: String },

    #[error("invalid value for parameter {parameter}: {reason}")]
    InvalidParameterValue { parameter: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A bay identifier as accepted at the repository boundary: the internal
/// numeric id or the externally visible uuid. Resolution tries the numeric
/// form first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BayIdent {
    Id(i64),
    Uuid(String),
}

impl BayIdent {
    /// Parse a caller-supplied identifier string
    pub fn parse(ident: &str) -> Self {
        match ident.parse::<i64>() {
            Ok(id) => BayIdent::Id(id),
            Err(_) => BayIdent::Uuid(ident.to_string()),
        }
    }
}

impl fmt::Display for BayIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BayIdent::Id(id) => write!(f, "{}", id),
            BayIdent::Uuid(uuid) => f.write_str(uuid),
        }
    }
}

const SCHEMA: &[&str] = &[
    r#"
    create table if not exists bays (
        id integer primary key autoincrement,
        uuid text not null unique,
        name text,
        baymodel_id text,
        node_count integer not null,
        status text,
        created_at text not null,
        updated_at text not null
    )
    "#,
    r#"
    create table if not exists pods (
        id integer primary key autoincrement,
        uuid text not null unique,
        name text,
        bay_uuid text not null,
        manifest text,
        status text,
        created_at text not null,
        updated_at text not null
    )
    "#,
    r#"
    create table if not exists services (
        id integer primary key autoincrement,
        uuid text not null unique,
        name text,
        bay_uuid text not null,
        manifest text,
        status text,
        created_at text not null,
        updated_at text not null
    )
    "#,
    r#"
    create table if not exists replication_controllers (
        id integer primary key autoincrement,
        uuid text not null unique,
        name text,
        bay_uuid text not null,
        manifest text,
        status text,
        created_at text not null,
        updated_at text not null
    )
    "#,
    r#"
    create table if not exists containers (
        id integer primary key autoincrement,
        uuid text not null unique,
        name text,
        bay_uuid text not null,
        image text,
        status text,
        created_at text not null,
        updated_at text not null
    )
    "#,
];

/// Open (creating if missing) the catalog database and apply the schema
pub async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory catalog, used by tests.
///
/// Limited to one connection: every in-memory SQLite connection is a
/// distinct database.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

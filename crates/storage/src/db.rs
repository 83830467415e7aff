use std::str::FromStr;
use std::time::Duration;

use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Decode, Sqlite, SqlitePool, Transaction, Type};
use tracing::debug;

use crate::schema;


/// Pooled handle to the harvester database.
///
/// Opening runs the schema bootstrap, so a handle is ready to use as soon
/// as it exists.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}


impl Database {
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));
        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect_with(options)
            .await?;
        schema::init(&pool).await?;
        debug!(url, "database ready");
        Ok(Database { pool })
    }

    /// Private in-memory database, used by tests.
    ///
    /// A single never-expiring connection, because every sqlite memory
    /// connection is its own database.
    pub async fn open_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        schema::init(&pool).await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}


/// True when the error is a unique constraint violation, which the engines
/// treat as "someone else already wrote this row".
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.kind() == ErrorKind::UniqueViolation,
        _ => false,
    }
}


/// Adapter for nullable columns whose Rust type needs a conversion the
/// driver cannot do directly, e.g. `Option<u64>` out of a nullable INTEGER.
pub struct SqlxOption<T>(Option<T>);


impl<T> From<SqlxOption<T>> for Option<T> {
    fn from(value: SqlxOption<T>) -> Self {
        value.0
    }
}


impl TryFrom<SqlxOption<i64>> for Option<u64> {
    type Error = std::num::TryFromIntError;

    fn try_from(value: SqlxOption<i64>) -> Result<Self, Self::Error> {
        value.0.map(u64::try_from).transpose()
    }
}


impl<T: Type<Sqlite>> Type<Sqlite> for SqlxOption<T> {
    fn type_info() -> <Sqlite as sqlx::Database>::TypeInfo {
        <Option<T> as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &<Sqlite as sqlx::Database>::TypeInfo) -> bool {
        <Option<T> as Type<Sqlite>>::compatible(ty)
    }
}


impl<'r, T> Decode<'r, Sqlite> for SqlxOption<T>
where
    Option<T>: Decode<'r, Sqlite>,
{
    fn decode(
        value: <Sqlite as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        Option::<T>::decode(value).map(SqlxOption)
    }
}

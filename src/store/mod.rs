// Generic keyed document storage over SQLite. One logical collection per
// entity type, all rows in a single `documents` table. The store performs
// no business logic; cascades live in services::integrity.

use anyhow::Result;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

/// Persistable entity: names its collection and exposes its id.
pub trait Doc: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    fn id(&self) -> Uuid;
}

#[derive(Clone)]
pub struct EntityStore {
    pool: SqlitePool,
}

impl EntityStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        // An in-memory SQLite database exists per connection; it needs a
        // pool of exactly one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 8 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(EntityStore { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT NOT NULL,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL,
                PRIMARY KEY(id, collection)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await?;

        // Invitation tokens are a unique secondary key; expiry is read at
        // validation/use time (no proactive sweeper).
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_invitations_token
             ON documents(json_extract(data, '$.token'))
             WHERE collection = 'invitations'",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_invitations_expiry
             ON documents(json_extract(data, '$.expires_at'))
             WHERE collection = 'invitations'",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email
             ON documents(json_extract(data, '$.email'))
             WHERE collection = 'users'",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert<T: Doc>(&self, doc: &T) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_on(&mut conn, doc).await
    }

    pub async fn find_by_id<T: Doc>(&self, id: Uuid) -> Result<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id_on(&mut conn, id).await
    }

    pub async fn find_many<T, F>(&self, predicate: F) -> Result<Vec<T>>
    where
        T: Doc,
        F: Fn(&T) -> bool,
    {
        let mut conn = self.pool.acquire().await?;
        find_many_on(&mut conn, predicate).await
    }

    /// Point lookup through a JSON field, e.g. `$.token`. Used where a
    /// secondary index exists instead of scanning the collection.
    pub async fn find_one_by_field<T: Doc>(&self, path: &str, value: &str) -> Result<Option<T>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND json_extract(data, ?) = ?")
            .bind(T::COLLECTION)
            .bind(path)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    /// Full-document replace keyed by the document's own id.
    pub async fn update_by_id<T: Doc>(&self, doc: &T) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        update_by_id_on(&mut conn, doc).await
    }

    pub async fn delete_by_id<T: Doc>(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        delete_by_id_on::<T>(&mut conn, id).await
    }

    pub async fn delete_many<T, F>(&self, predicate: F) -> Result<u64>
    where
        T: Doc,
        F: Fn(&T) -> bool,
    {
        let mut conn = self.pool.acquire().await?;
        delete_many_on(&mut conn, predicate).await
    }

    pub async fn count<T, F>(&self, predicate: F) -> Result<usize>
    where
        T: Doc,
        F: Fn(&T) -> bool,
    {
        Ok(self.find_many(predicate).await?.len())
    }

    /// Begin a multi-statement transaction. Caller commits or the drop
    /// rolls back.
    pub async fn begin(&self) -> Result<StoreTx> {
        Ok(StoreTx { tx: self.pool.begin().await? })
    }

    /// Drops every row of every collection. Only reachable through the
    /// explicit reset-on-boot configuration flag.
    pub async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM documents").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction-scoped view of the store with the same operations.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub async fn insert<T: Doc>(&mut self, doc: &T) -> Result<()> {
        insert_on(&mut self.tx, doc).await
    }

    pub async fn find_by_id<T: Doc>(&mut self, id: Uuid) -> Result<Option<T>> {
        find_by_id_on(&mut self.tx, id).await
    }

    pub async fn find_many<T, F>(&mut self, predicate: F) -> Result<Vec<T>>
    where
        T: Doc,
        F: Fn(&T) -> bool,
    {
        find_many_on(&mut self.tx, predicate).await
    }

    pub async fn update_by_id<T: Doc>(&mut self, doc: &T) -> Result<bool> {
        update_by_id_on(&mut self.tx, doc).await
    }

    pub async fn delete_by_id<T: Doc>(&mut self, id: Uuid) -> Result<bool> {
        delete_by_id_on::<T>(&mut self.tx, id).await
    }

    pub async fn delete_many<T, F>(&mut self, predicate: F) -> Result<u64>
    where
        T: Doc,
        F: Fn(&T) -> bool,
    {
        delete_many_on(&mut self.tx, predicate).await
    }

    /// Compare-and-set replace: the write only lands while the boolean at
    /// `path` still holds `expected`. Returns false when the guard no
    /// longer matches, e.g. because a concurrent writer got there first.
    pub async fn update_by_id_if_flag<T: Doc>(
        &mut self,
        doc: &T,
        path: &str,
        expected: bool,
    ) -> Result<bool> {
        let now = Utc::now().timestamp();
        let data = serde_json::to_string(doc)?;

        let result = sqlx::query(
            "UPDATE documents SET data = ?, updated = ?
             WHERE id = ? AND collection = ? AND json_extract(data, ?) = ?",
        )
        .bind(data)
        .bind(now)
        .bind(doc.id().to_string())
        .bind(T::COLLECTION)
        .bind(path)
        .bind(expected)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

async fn insert_on<T: Doc>(conn: &mut SqliteConnection, doc: &T) -> Result<()> {
    let now = Utc::now().timestamp();
    let data = serde_json::to_string(doc)?;

    sqlx::query(
        "INSERT INTO documents (id, collection, data, created, updated) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(doc.id().to_string())
    .bind(T::COLLECTION)
    .bind(data)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

async fn find_by_id_on<T: Doc>(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<T>> {
    let row = sqlx::query("SELECT data FROM documents WHERE id = ? AND collection = ?")
        .bind(id.to_string())
        .bind(T::COLLECTION)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => {
            let data: String = row.get("data");
            Ok(Some(serde_json::from_str(&data)?))
        }
        None => Ok(None),
    }
}

async fn find_many_on<T, F>(conn: &mut SqliteConnection, predicate: F) -> Result<Vec<T>>
where
    T: Doc,
    F: Fn(&T) -> bool,
{
    let rows = sqlx::query("SELECT data FROM documents WHERE collection = ? ORDER BY created ASC")
        .bind(T::COLLECTION)
        .fetch_all(conn)
        .await?;

    let mut docs = Vec::new();
    for row in rows {
        let data: String = row.get("data");
        let doc: T = serde_json::from_str(&data)?;
        if predicate(&doc) {
            docs.push(doc);
        }
    }

    Ok(docs)
}

async fn update_by_id_on<T: Doc>(conn: &mut SqliteConnection, doc: &T) -> Result<bool> {
    let now = Utc::now().timestamp();
    let data = serde_json::to_string(doc)?;

    let result = sqlx::query("UPDATE documents SET data = ?, updated = ? WHERE id = ? AND collection = ?")
        .bind(data)
        .bind(now)
        .bind(doc.id().to_string())
        .bind(T::COLLECTION)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn delete_by_id_on<T: Doc>(conn: &mut SqliteConnection, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ? AND collection = ?")
        .bind(id.to_string())
        .bind(T::COLLECTION)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn delete_many_on<T, F>(conn: &mut SqliteConnection, predicate: F) -> Result<u64>
where
    T: Doc,
    F: Fn(&T) -> bool,
{
    let matched: Vec<T> = find_many_on(&mut *conn, predicate).await?;

    let mut deleted = 0u64;
    for doc in &matched {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND collection = ?")
            .bind(doc.id().to_string())
            .bind(T::COLLECTION)
            .execute(&mut *conn)
            .await?;
        deleted += result.rows_affected();
    }

    Ok(deleted)
}

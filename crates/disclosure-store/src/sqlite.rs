//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use disclosure_core::{
    Ciphertext, DataRequest, NewRequest, OfferId, PublicKey, RequestFilter, RequestId,
    RequestState,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{check_target, FieldMap, ProfileRepository, RequestStore, TransitionResult};

const REQUEST_COLUMNS: &str =
    "id, from_pk, to_pk, request_data, response_data, state, offer_id";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn conversion_error(
    index: usize,
    ty: Type,
    message: impl Into<String>,
) -> rusqlite::Error {
    let message: String = message.into();
    rusqlite::Error::FromSqlConversionFailure(index, ty, message.into())
}

fn public_key_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<PublicKey> {
    let bytes: Vec<u8> = row.get(index)?;
    PublicKey::from_bytes(&bytes).map_err(|e| conversion_error(index, Type::Blob, e.to_string()))
}

// Helper to convert a row selected with REQUEST_COLUMNS to a DataRequest
fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<DataRequest> {
    let id: i64 = row.get(0)?;
    let state: u8 = row.get(5)?;
    let offer_id: Option<i64> = row.get(6)?;

    Ok(DataRequest {
        id: RequestId(id as u64),
        from: public_key_column(row, 1)?,
        to: public_key_column(row, 2)?,
        request_data: row.get::<_, Option<String>>(3)?.map(Ciphertext::new),
        response_data: row.get::<_, Option<String>>(4)?.map(Ciphertext::new),
        state: RequestState::from_u8(state)
            .ok_or_else(|| conversion_error(5, Type::Integer, format!("unknown state {state}")))?,
        offer_id: offer_id.map(|id| OfferId(id as u64)),
    })
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn insert_request(&self, request: NewRequest) -> Result<RequestId> {
        self.run(move |conn| {
            let now = now_millis();
            conn.execute(
                "INSERT INTO data_requests (
                    from_pk, to_pk, request_data, response_data, state, offer_id,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    &request.from.to_bytes()[..],
                    &request.to.to_bytes()[..],
                    request.request_data.as_ref().map(Ciphertext::as_str),
                    request.response_data.as_ref().map(Ciphertext::as_str),
                    request.state.as_u8(),
                    request.offer_id.map(|id| id.0 as i64),
                    now,
                ],
            )?;

            Ok(RequestId(conn.last_insert_rowid() as u64))
        })
        .await
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<DataRequest>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM data_requests WHERE id = ?1"),
                params![id.0 as i64],
                row_to_request,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn transition(
        &self,
        id: RequestId,
        to_state: RequestState,
        response_data: Option<Ciphertext>,
    ) -> Result<TransitionResult> {
        check_target(to_state)?;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current: Option<u8> = tx
                .query_row(
                    "SELECT state FROM data_requests WHERE id = ?1",
                    params![id.0 as i64],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current) = current else {
                return Ok(TransitionResult::NotFound);
            };
            let current = RequestState::from_u8(current)
                .ok_or_else(|| StoreError::InvalidData(format!("unknown state {current}")))?;

            if current.is_terminal() {
                return Ok(TransitionResult::AlreadyFinal(current));
            }

            tx.execute(
                "UPDATE data_requests
                 SET state = ?2, response_data = ?3, updated_at = ?4
                 WHERE id = ?1 AND state = 0",
                params![
                    id.0 as i64,
                    to_state.as_u8(),
                    response_data.as_ref().map(Ciphertext::as_str),
                    now_millis(),
                ],
            )?;
            tx.commit()?;

            Ok(TransitionResult::Applied)
        })
        .await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<DataRequest>> {
        let from = filter.from().map(|pk| pk.to_bytes().to_vec());
        let to = filter.to().map(|pk| pk.to_bytes().to_vec());
        let state = filter.state();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REQUEST_COLUMNS} FROM data_requests
                 WHERE state = ?1
                   AND (?2 IS NULL OR from_pk = ?2)
                   AND (?3 IS NULL OR to_pk = ?3)
                 ORDER BY id"
            ))?;

            let requests = stmt
                .query_map(params![state.as_u8(), from, to], row_to_request)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(requests)
        })
        .await
    }
}

#[async_trait]
impl ProfileRepository for SqliteStore {
    async fn get_profile(&self, owner: &PublicKey) -> Result<FieldMap> {
        let owner = owner.to_bytes();

        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT field_name, ciphertext FROM profile_fields WHERE owner = ?1",
            )?;

            let fields = stmt
                .query_map(params![&owner[..]], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<FieldMap>>()?;

            Ok(fields)
        })
        .await
    }

    async fn put_fields(&self, owner: &PublicKey, fields: &FieldMap) -> Result<()> {
        let owner = owner.to_bytes();
        let fields = fields.clone();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let now = now_millis();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO profile_fields (owner, field_name, ciphertext, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(owner, field_name) DO UPDATE SET
                        ciphertext = excluded.ciphertext,
                        updated_at = excluded.updated_at",
                )?;
                for (name, ciphertext) in &fields {
                    stmt.execute(params![&owner[..], name, ciphertext, now])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclosure_core::{Identity, LocalIdentity};

    fn pk() -> PublicKey {
        LocalIdentity::generate().public_key()
    }

    fn awaiting(from: PublicKey, to: PublicKey) -> NewRequest {
        NewRequest::awaiting(from, to, Ciphertext::new("cmVxdWVzdA=="))
    }

    #[tokio::test]
    async fn test_insert_and_get_request() {
        let store = SqliteStore::open_memory().unwrap();
        let (a, b) = (pk(), pk());

        let id = store.insert_request(awaiting(a, b)).await.unwrap();
        let record = store.get_request(id).await.unwrap().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.from, a);
        assert_eq!(record.to, b);
        assert_eq!(record.state, RequestState::Await);
        assert_eq!(record.request_data, Some(Ciphertext::new("cmVxdWVzdA==")));
        assert!(record.response_data.is_none());
        assert!(record.offer_id.is_none());
    }

    #[tokio::test]
    async fn test_grant_with_offer_roundtrips() {
        let store = SqliteStore::open_memory().unwrap();
        let grant = NewRequest::granted(pk(), pk(), Ciphertext::new("Z3JhbnQ=")).with_offer(OfferId(42));

        let id = store.insert_request(grant.clone()).await.unwrap();
        let record = store.get_request(id).await.unwrap().unwrap();
        assert_eq!(record, grant.into_request(id));
    }

    #[tokio::test]
    async fn test_transition_once() {
        let store = SqliteStore::open_memory().unwrap();
        let id = store.insert_request(awaiting(pk(), pk())).await.unwrap();

        assert_eq!(
            store.transition(id, RequestState::Reject, None).await.unwrap(),
            TransitionResult::Applied
        );
        assert_eq!(
            store
                .transition(id, RequestState::Accept, Some(Ciphertext::new("eA==")))
                .await
                .unwrap(),
            TransitionResult::AlreadyFinal(RequestState::Reject)
        );
        assert_eq!(
            store
                .transition(RequestId(999), RequestState::Accept, None)
                .await
                .unwrap(),
            TransitionResult::NotFound
        );

        let record = store.get_request(id).await.unwrap().unwrap();
        assert_eq!(record.state, RequestState::Reject);
        assert!(record.response_data.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = SqliteStore::open_memory().unwrap();
        let (a, b, c) = (pk(), pk(), pk());

        let first = store.insert_request(awaiting(a, b)).await.unwrap();
        store.insert_request(awaiting(c, b)).await.unwrap();
        let third = store.insert_request(awaiting(a, b)).await.unwrap();
        store
            .insert_request(NewRequest::granted(a, b, Ciphertext::new("Zw==")))
            .await
            .unwrap();

        let by_from = store
            .list_requests(&RequestFilter::sent_by(a, RequestState::Await))
            .await
            .unwrap();
        let ids: Vec<_> = by_from.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, third]);

        let by_to = store
            .list_requests(&RequestFilter::addressed_to(b, RequestState::Await))
            .await
            .unwrap();
        assert_eq!(by_to.len(), 3);

        let between = store
            .list_requests(&RequestFilter::between(a, b, RequestState::Accept))
            .await
            .unwrap();
        assert_eq!(between.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_upsert() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = pk();

        let mut fields = FieldMap::new();
        fields.insert("email".into(), "c1".into());
        fields.insert("name".into(), "c2".into());
        store.put_fields(&owner, &fields).await.unwrap();

        let mut update = FieldMap::new();
        update.insert("email".into(), "c3".into());
        store.put_fields(&owner, &update).await.unwrap();

        let profile = store.get_profile(&owner).await.unwrap();
        assert_eq!(profile.len(), 2);
        assert_eq!(profile["email"], "c3");
        assert_eq!(profile["name"], "c2");
        assert!(store.get_profile(&pk()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disclosure.db");
        let (a, b) = (pk(), pk());

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let mut fields = FieldMap::new();
            fields.insert("email".into(), "c1".into());
            store.put_fields(&a, &fields).await.unwrap();
            store.insert_request(awaiting(a, b)).await.unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get_request(id).await.unwrap().is_some());
        assert_eq!(store.get_profile(&a).await.unwrap()["email"], "c1");

        let next = store.insert_request(awaiting(b, a)).await.unwrap();
        assert!(next > id);
    }
}

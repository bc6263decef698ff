use redis::aio::ConnectionLike;
use tracing::{debug, warn};

use crate::config::AdapterConfig;
use crate::connection::StoreConnection;
use crate::datalog::DataLogger;
use crate::error::{AdapterError, Result};
use crate::ops::{self, FieldMap};

/// The benchmark-facing adapter: one connection handle, five operations.
///
/// Operations take `&self` and clone the multiplexed handle per call, so a
/// single adapter may serve concurrent callers without locking. The `table`
/// parameter of every operation is accepted for contract compatibility and
/// ignored; the store has a single keyspace.
pub struct StoreAdapter<C = StoreConnection> {
    con: C,
    datalog: Option<DataLogger>,
}

impl StoreAdapter<StoreConnection> {
    /// Connect once, before the first operation. Unreachable store or failed
    /// authentication aborts startup with [`AdapterError::Connection`].
    pub async fn connect(config: &AdapterConfig) -> Result<Self> {
        let con = StoreConnection::establish(config).await?;
        let datalog = match &config.datalog_path {
            Some(path) => {
                let logger = DataLogger::open(path)?;
                debug!(path = %logger.path().display(), "operation log enabled");
                Some(logger)
            }
            None => None,
        };
        Ok(Self { con, datalog })
    }
}

impl<C> StoreAdapter<C>
where
    C: ConnectionLike + Clone + Send,
{
    /// Wrap an already-established connection. Seam for tests and embedding.
    pub fn with_connection(con: C) -> Self {
        Self { con, datalog: None }
    }

    /// Attach an operation log to an adapter built from a bare connection.
    pub fn with_datalog(mut self, datalog: DataLogger) -> Self {
        self.datalog = Some(datalog);
        self
    }

    /// Fetch a record's fields, all of them or only the named ones.
    pub async fn read(
        &self,
        _table: &str,
        key: &str,
        fields: Option<&[String]>,
    ) -> Result<FieldMap> {
        let mut con = self.con.clone();
        match ops::read_record(&mut con, key, fields).await {
            Err(e @ AdapterError::EmptyRecord { .. }) => {
                // The original binding logged misses with an empty payload.
                if let Some(log) = &self.datalog {
                    if let Err(log_err) = log.append(key, &FieldMap::new()) {
                        warn!(key, error = %log_err, "failed to log read miss");
                    }
                }
                Err(e)
            }
            other => other,
        }
    }

    /// Write a new record and index its key for scans.
    pub async fn insert(&self, _table: &str, key: &str, fields: &FieldMap) -> Result<()> {
        let mut con = self.con.clone();
        ops::insert_record(&mut con, key, fields).await?;
        if let Some(log) = &self.datalog {
            log.append(key, fields)?;
        }
        Ok(())
    }

    /// Overwrite fields on an existing record; the index entry is untouched.
    pub async fn update(&self, _table: &str, key: &str, fields: &FieldMap) -> Result<()> {
        let mut con = self.con.clone();
        ops::update_record(&mut con, key, fields).await
    }

    /// Remove a record and its index entry.
    pub async fn delete(&self, _table: &str, key: &str) -> Result<()> {
        let mut con = self.con.clone();
        ops::delete_record(&mut con, key).await
    }

    /// Read up to `count` records starting from the start key's score.
    /// Ordering is by key score, which only approximates key order.
    pub async fn scan(
        &self,
        _table: &str,
        start_key: &str,
        count: usize,
        fields: Option<&[String]>,
    ) -> Result<Vec<FieldMap>> {
        let mut con = self.con.clone();
        ops::scan_records(&mut con, start_key, count, fields).await
    }

    /// Tear down after the last operation: flush and close the operation
    /// log; the connection handle drops with the adapter.
    pub fn close(self) -> Result<()> {
        if let Some(log) = self.datalog {
            log.close()?;
        }
        Ok(())
    }
}

//! The five operation bodies, written once against [`ConnectionLike`] so the
//! same code runs over a single-node handle, a cluster handle, or the
//! in-memory test store.

use std::collections::HashMap;

use redis::aio::ConnectionLike;
use redis::AsyncCommands;

use crate::error::{AdapterError, Result};

/// A record's fields: field name to raw byte value. No further schema.
pub type FieldMap = HashMap<String, Vec<u8>>;

/// The one well-known sorted set holding a score for every inserted key.
pub const INDEX_KEY: &str = "_indices";

/// Score an index key.
///
/// 31-multiplier wrapping i32 accumulation over the key's bytes, widened to
/// f64. Fast and well scattered over the score space, but not
/// order-preserving: scans resolve keys in score order, which only
/// approximates key order.
pub fn key_score(key: &str) -> f64 {
    let mut h: i32 = 0;
    for b in key.bytes() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(b));
    }
    f64::from(h)
}

/// Fetch a record. With no filter all fields are returned; with a filter,
/// fields absent in the store are omitted. A key resolving to no fields at
/// all is a failure.
pub(crate) async fn read_record<C>(
    con: &mut C,
    key: &str,
    fields: Option<&[String]>,
) -> Result<FieldMap>
where
    C: ConnectionLike + Send,
{
    let record: FieldMap = match fields {
        None => con.hgetall(key).await.map_err(AdapterError::Operation)?,
        Some(names) => {
            let mut cmd = redis::cmd("HMGET");
            cmd.arg(key);
            for name in names {
                cmd.arg(name.as_str());
            }
            let values: Vec<Option<Vec<u8>>> =
                cmd.query_async(con).await.map_err(AdapterError::Operation)?;
            names
                .iter()
                .cloned()
                .zip(values)
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect()
        }
    };
    if record.is_empty() {
        return Err(AdapterError::EmptyRecord {
            key: key.to_string(),
        });
    }
    Ok(record)
}

/// Write all fields and add the key to the scan index under its score.
pub(crate) async fn insert_record<C>(con: &mut C, key: &str, fields: &FieldMap) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let items: Vec<(&str, &[u8])> = fields
        .iter()
        .map(|(field, value)| (field.as_str(), value.as_slice()))
        .collect();
    let _: () = con
        .hset_multiple(key, &items)
        .await
        .map_err(AdapterError::Operation)?;
    let _: () = con
        .zadd(INDEX_KEY, key, key_score(key))
        .await
        .map_err(AdapterError::Operation)?;
    Ok(())
}

/// Overwrite the given fields. The key is assumed already indexed.
pub(crate) async fn update_record<C>(con: &mut C, key: &str, fields: &FieldMap) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let items: Vec<(&str, &[u8])> = fields
        .iter()
        .map(|(field, value)| (field.as_str(), value.as_slice()))
        .collect();
    let _: () = con
        .hset_multiple(key, &items)
        .await
        .map_err(AdapterError::Operation)?;
    Ok(())
}

/// Remove the record and its index entry. Fails only when *both* removals
/// report zero effect, so deleting an absent key a second time is a failure
/// while a key present in either place still deletes cleanly. Preserved
/// exactly from the original binding.
pub(crate) async fn delete_record<C>(con: &mut C, key: &str) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let removed: i64 = con.del(key).await.map_err(AdapterError::Operation)?;
    let unindexed: i64 = con
        .zrem(INDEX_KEY, key)
        .await
        .map_err(AdapterError::Operation)?;
    if removed == 0 && unindexed == 0 {
        return Err(AdapterError::DeleteMiss {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Resolve up to `count` keys whose score is at or above the start key's
/// score, then read each one. A key whose record has vanished since indexing
/// contributes an empty field map rather than failing the scan.
pub(crate) async fn scan_records<C>(
    con: &mut C,
    start_key: &str,
    count: usize,
    fields: Option<&[String]>,
) -> Result<Vec<FieldMap>>
where
    C: ConnectionLike + Send,
{
    let keys: Vec<String> = con
        .zrangebyscore_limit(INDEX_KEY, key_score(start_key), f64::INFINITY, 0, count as isize)
        .await
        .map_err(AdapterError::Operation)?;
    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        match read_record(con, &key, fields).await {
            Ok(record) => records.push(record),
            Err(AdapterError::EmptyRecord { .. }) => records.push(FieldMap::new()),
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

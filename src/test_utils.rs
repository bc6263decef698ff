//! In-memory stand-in for a Redis-compatible store.
//!
//! Interprets exactly the command set the adapter issues (hash get/set,
//! delete, sorted-set add/range/remove) over shared state, so every adapter
//! behavior can be exercised hermetically. Clones share state, mirroring how
//! multiplexed connection handles share one underlying connection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use redis::aio::ConnectionLike;
use redis::{Arg, Cmd, ErrorKind, Pipeline, RedisError, RedisFuture, RedisResult, Value};

#[derive(Default)]
struct State {
    hashes: HashMap<String, HashMap<String, Vec<u8>>>,
    /// Sorted sets as member -> score; range queries sort on demand.
    zsets: HashMap<String, BTreeMap<String, f64>>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn dispatch(&self, cmd: &Cmd) -> RedisResult<Value> {
        let args: Vec<Vec<u8>> = cmd
            .args_iter()
            .map(|arg| match arg {
                Arg::Simple(bytes) => bytes.to_vec(),
                Arg::Cursor => b"0".to_vec(),
            })
            .collect();
        if args.is_empty() {
            return Err(protocol_error("empty command"));
        }
        let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match name.as_str() {
            "PING" => Ok(Value::Status("PONG".to_string())),

            "HMSET" | "HSET" => {
                let key = parse_str(&args, 1)?;
                if args.len() < 4 || args.len() % 2 != 0 {
                    return Err(protocol_error("wrong number of arguments for hash set"));
                }
                let hash = state.hashes.entry(key).or_default();
                let mut added = 0i64;
                for pair in args[2..].chunks(2) {
                    let field = String::from_utf8_lossy(&pair[0]).into_owned();
                    if hash.insert(field, pair[1].clone()).is_none() {
                        added += 1;
                    }
                }
                if name == "HSET" {
                    Ok(Value::Int(added))
                } else {
                    Ok(Value::Okay)
                }
            }

            "HGETALL" => {
                let key = parse_str(&args, 1)?;
                let mut items = Vec::new();
                if let Some(hash) = state.hashes.get(&key) {
                    for (field, value) in hash {
                        items.push(Value::Data(field.clone().into_bytes()));
                        items.push(Value::Data(value.clone()));
                    }
                }
                Ok(Value::Bulk(items))
            }

            "HMGET" => {
                let key = parse_str(&args, 1)?;
                if args.len() < 3 {
                    return Err(protocol_error("wrong number of arguments for HMGET"));
                }
                let hash = state.hashes.get(&key);
                let items = args[2..]
                    .iter()
                    .map(|field| {
                        let field = String::from_utf8_lossy(field);
                        match hash.and_then(|h| h.get(field.as_ref())) {
                            Some(value) => Value::Data(value.clone()),
                            None => Value::Nil,
                        }
                    })
                    .collect();
                Ok(Value::Bulk(items))
            }

            "DEL" => {
                let mut removed = 0i64;
                for key in &args[1..] {
                    let key = String::from_utf8_lossy(key);
                    if state.hashes.remove(key.as_ref()).is_some() {
                        removed += 1;
                    }
                }
                Ok(Value::Int(removed))
            }

            "ZADD" => {
                let key = parse_str(&args, 1)?;
                if args.len() != 4 {
                    return Err(protocol_error("wrong number of arguments for ZADD"));
                }
                let score = parse_score(&args[2])?;
                let member = String::from_utf8_lossy(&args[3]).into_owned();
                let zset = state.zsets.entry(key).or_default();
                let added = i64::from(zset.insert(member, score).is_none());
                Ok(Value::Int(added))
            }

            "ZREM" => {
                let key = parse_str(&args, 1)?;
                let mut removed = 0i64;
                if let Some(zset) = state.zsets.get_mut(&key) {
                    for member in &args[2..] {
                        let member = String::from_utf8_lossy(member);
                        if zset.remove(member.as_ref()).is_some() {
                            removed += 1;
                        }
                    }
                }
                Ok(Value::Int(removed))
            }

            "ZRANGEBYSCORE" => {
                let key = parse_str(&args, 1)?;
                if args.len() < 4 {
                    return Err(protocol_error("wrong number of arguments for ZRANGEBYSCORE"));
                }
                let min = parse_score(&args[2])?;
                let max = parse_score(&args[3])?;
                let (offset, count) = if args.len() >= 7
                    && String::from_utf8_lossy(&args[4]).eq_ignore_ascii_case("LIMIT")
                {
                    (
                        parse_score(&args[5])? as usize,
                        parse_score(&args[6])? as usize,
                    )
                } else {
                    (0, usize::MAX)
                };

                let mut members: Vec<(f64, &String)> = state
                    .zsets
                    .get(&key)
                    .map(|zset| {
                        zset.iter()
                            .filter(|(_, score)| **score >= min && **score <= max)
                            .map(|(member, score)| (*score, member))
                            .collect()
                    })
                    .unwrap_or_default();
                members.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

                let items = members
                    .into_iter()
                    .skip(offset)
                    .take(count)
                    .map(|(_, member)| Value::Data(member.clone().into_bytes()))
                    .collect();
                Ok(Value::Bulk(items))
            }

            other => Err(protocol_error_detail("unsupported command", other.to_string())),
        }
    }
}

fn protocol_error(message: &'static str) -> RedisError {
    RedisError::from((ErrorKind::ResponseError, message))
}

fn protocol_error_detail(message: &'static str, detail: String) -> RedisError {
    RedisError::from((ErrorKind::ResponseError, message, detail))
}

fn parse_str(args: &[Vec<u8>], at: usize) -> RedisResult<String> {
    args.get(at)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .ok_or_else(|| protocol_error("missing argument"))
}

fn parse_score(bytes: &[u8]) -> RedisResult<f64> {
    let text = String::from_utf8_lossy(bytes);
    text.parse()
        .map_err(|_| protocol_error_detail("invalid score", text.into_owned()))
}

impl ConnectionLike for InMemoryStore {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        Box::pin(async move { self.dispatch(cmd) })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let mut values = Vec::new();
            for cmd in cmd.cmd_iter() {
                values.push(self.dispatch(cmd)?);
            }
            Ok(values.into_iter().skip(offset).take(count).collect())
        })
    }

    fn get_db(&self) -> i64 {
        0
    }
}

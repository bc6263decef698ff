use std::time::Duration;

use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::cluster::ClusterClientBuilder;
use redis::cluster_async::ClusterConnection;
use redis::{Cmd, ConnectionAddr, ConnectionInfo, Pipeline, RedisConnectionInfo, RedisFuture, Value};
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};

/// The closed set of connection kinds an adapter can hold.
///
/// Single-node and cluster deployments are selected once at connect time and
/// are indistinguishable to the operation bodies, which are written against
/// [`ConnectionLike`]. Both inner handles are multiplexed and cheap to clone;
/// cloning one per operation is how concurrent callers share the adapter.
#[derive(Clone)]
pub enum StoreConnection {
    Single(MultiplexedConnection),
    Cluster(ClusterConnection),
}

impl StoreConnection {
    /// Open the connection described by `config`. Any failure here, including
    /// authentication, is fatal to startup.
    pub async fn establish(config: &AdapterConfig) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: 0,
                username: None,
                password: config.password.clone(),
            },
        };
        debug!(
            host = %config.host,
            port = config.port,
            cluster = config.cluster,
            "connecting to store"
        );

        if config.cluster {
            let mut builder = ClusterClientBuilder::new(vec![info]);
            if let Some(ms) = config.timeout_ms {
                let timeout = Duration::from_millis(ms);
                builder = builder.connection_timeout(timeout).response_timeout(timeout);
            }
            let client = builder.build().map_err(AdapterError::Connection)?;
            let con = client
                .get_async_connection()
                .await
                .map_err(AdapterError::Connection)?;
            Ok(StoreConnection::Cluster(con))
        } else {
            let client = redis::Client::open(info).map_err(AdapterError::Connection)?;
            let con = match config.timeout_ms {
                Some(ms) => {
                    let timeout = Duration::from_millis(ms);
                    client
                        .get_multiplexed_async_connection_with_timeouts(timeout, timeout)
                        .await
                }
                None => client.get_multiplexed_async_connection().await,
            }
            .map_err(AdapterError::Connection)?;
            Ok(StoreConnection::Single(con))
        }
    }
}

impl ConnectionLike for StoreConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            StoreConnection::Single(con) => con.req_packed_command(cmd),
            StoreConnection::Cluster(con) => con.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            StoreConnection::Single(con) => con.req_packed_commands(cmd, offset, count),
            StoreConnection::Cluster(con) => con.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            StoreConnection::Single(con) => con.get_db(),
            StoreConnection::Cluster(con) => con.get_db(),
        }
    }
}

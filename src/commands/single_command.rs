// Copyright 2015-2018 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use tokio::time::Instant;

use crate::cluster::{Cluster, ClusterStats, Node};
use crate::commands::{self};
use crate::errors::{Error, Result};
use crate::net::{Connection, PooledConnection};
use crate::policy::{Policy, RetryPolicy};
use crate::{Key, ResultCode};

// Socket acquisition attempts per restart before the request goes back to
// the parking lot.
const MAX_RESTART_TRIES: usize = 5;

// Upper bound on one stretch of parking while no node is available.
const PARK_RECHECK: std::time::Duration = std::time::Duration::from_millis(100);

/// Per-request state shared by all verbs: the cluster handle, the key being
/// addressed and whether the transaction writes.
pub struct SingleCommand<'a> {
    pub cluster: Arc<Cluster>,
    pub key: &'a Key,
    is_write: bool,
}

/// Bound a suspension point by the transaction deadline. `None` means no
/// timeout was requested.
pub async fn try_with_timeout<O, F: futures::Future<Output = Result<O>>>(
    deadline: Option<Instant>,
    future: F,
) -> Result<O> {
    if let Some(deadline) = deadline {
        match tokio::time::timeout_at(deadline, future).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout("transaction deadline elapsed".to_string())),
        }
    } else {
        future.await
    }
}

// Holds the in-progress counter for the duration of the request, however it
// ends.
struct InProgress<'a>(&'a ClusterStats);

impl<'a> InProgress<'a> {
    fn new(stats: &'a ClusterStats) -> Self {
        stats.start_request();
        InProgress(stats)
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.end_request();
    }
}

impl<'a> SingleCommand<'a> {
    pub fn new(cluster: Arc<Cluster>, key: &'a Key, is_write: bool) -> Self {
        SingleCommand {
            cluster,
            key,
            is_write,
        }
    }

    pub async fn get_node(&self) -> Option<Arc<Node>> {
        self.cluster.node_for(&self.key.digest, self.is_write).await
    }

    // There should not be any more bytes after the message header for
    // header-only responses. Empty the socket to be safe.
    pub async fn empty_socket(conn: &mut Connection) -> Result<()> {
        let sz = conn.buffer.read_u64(None);
        let header_length = u64::from(conn.buffer.read_u8(None));
        let receive_size = ((sz & 0xFFFF_FFFF_FFFF) - header_length) as usize;

        // Read remaining message bytes.
        if receive_size > 0 {
            conn.buffer.resize_buffer(receive_size)?;
            conn.read_buffer(receive_size).await?;
        }

        Ok(())
    }

    async fn transact(
        cmd: &mut (dyn commands::Command + Send),
        conn: &mut PooledConnection,
        deadline: Option<Instant>,
    ) -> Result<()> {
        try_with_timeout(deadline, cmd.write_buffer(conn)).await?;
        try_with_timeout(deadline, cmd.parse_result(conn)).await
    }

    // EXECUTE
    //

    /// Drive one transaction to completion: acquire a node and a pooled
    /// socket (parking while none is available), send the request, read and
    /// decode the response, absorbing transport failures into internal
    /// retries as the write policy allows, all under the transaction
    /// deadline.
    pub async fn execute(
        policy: &(dyn Policy + Send + Sync),
        cmd: &mut (dyn commands::Command + Send),
        retry: RetryPolicy,
        may_throttle: bool,
    ) -> Result<()> {
        let cluster = cmd.cluster();
        let stats = cluster.stats();
        let deadline = policy.deadline();

        let _in_progress = InProgress::new(stats);
        let mut first_restart = true;

        // Execute the command until successful, failed or timed out.
        loop {
            // If the deadline already passed, don't re-arm any I/O.
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    stats.add_timeout();
                    stats.add_failure();
                    return Err(Error::Timeout("transaction deadline elapsed".to_string()));
                }
            }

            if cluster.is_closed() {
                return Err(Error::InvalidNode("cluster has been closed".to_string()));
            }

            // Restart: a handful of node/socket acquisition cycles, then
            // back to the parking lot.
            let mut acquired = None;
            for _ in 0..MAX_RESTART_TRIES {
                let node = match cmd.get_node().await {
                    Some(node) => node,
                    None => break,
                };

                // Throttle before bothering to get the socket. Only the
                // initial restart may throttle; internal retries never do.
                if first_restart && may_throttle && node.should_drop() {
                    stats.add_throttle();
                    return Err(Error::Throttled);
                }

                match try_with_timeout(deadline, node.get_connection()).await {
                    Ok(conn) => {
                        acquired = Some((node, conn));
                        break;
                    }
                    Err(err @ Error::Timeout(_)) => {
                        stats.add_timeout();
                        stats.add_failure();
                        return Err(err);
                    }
                    Err(err) => {
                        // Couldn't get a socket; release the node and try
                        // again from scratch. We may well get the same node,
                        // but we may get a healthier one.
                        warn!("Node {}: {}", node, err);
                    }
                }
            }

            let (node, mut conn) = match acquired {
                Some(pair) => pair,
                None => {
                    // No node available right now. Park until the cluster
                    // signals one, then restart on this very task. The park
                    // is re-checked periodically so a signal racing the
                    // node-selection pass cannot strand the request; the
                    // loop head enforces the transaction deadline.
                    first_restart = false;
                    let mut park_deadline = Instant::now() + PARK_RECHECK;
                    if let Some(deadline) = deadline {
                        park_deadline = park_deadline.min(deadline);
                    }
                    if tokio::time::timeout_at(park_deadline, cluster.wait_for_node())
                        .await
                        .is_ok()
                    {
                        stats.add_internal_retry_off_q();
                    }
                    continue;
                }
            };
            first_restart = false;

            // Encoding failures are argument validation failures; they
            // surface directly and the untouched socket goes back to the
            // pool.
            cmd.prepare_buffer(&mut conn)?;
            cmd.write_timeout(&mut conn, policy.timeout()).await?;

            match Self::transact(cmd, &mut conn, deadline).await {
                Ok(()) => {
                    node.record_success();
                    stats.add_success();
                    return Ok(());
                }
                Err(Error::ServerError(ResultCode::ServersideTimeout)) => {
                    // A complete response arrived, so the socket is healthy
                    // and goes back to the pool; but for node health and the
                    // caller this counts as a timeout.
                    debug!("server-side timeout");
                    node.record_failure();
                    stats.add_timeout();
                    stats.add_failure();
                    return Err(Error::Timeout("server-side timeout".to_string()));
                }
                Err(err) if commands::keep_connection(&err) => {
                    // Any other server result code: the transaction ran.
                    node.record_success();
                    stats.add_success();
                    return Err(err);
                }
                Err(err) => {
                    // Transport failure or deadline: close the socket, do
                    // not put it back in the pool.
                    conn.invalidate();

                    if let Error::Timeout(_) = err {
                        node.record_failure();
                        stats.add_timeout();
                        stats.add_failure();
                        return Err(err);
                    }

                    if retry == RetryPolicy::OneShot {
                        info!("one-shot write failed on node {}: {}", node, err);
                        // Not distinguishing local from remote problems; it
                        // counts against the node for throttle purposes.
                        node.record_failure();
                        stats.add_failure();
                        return Err(Error::Timeout(format!("one-shot write failed: {}", err)));
                    }

                    warn!("Node {}: {}", node, err);
                    drop(node);
                    stats.add_internal_retry();
                }
            }
        }
    }
}

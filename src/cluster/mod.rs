// Copyright 2015-2018 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

pub mod node;

pub use self::node::Node;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::errors::Result;
use crate::key::DIGEST_SIZE;
use crate::net::Host;
use crate::policy::ClientPolicy;

/// Cluster options that may be changed while the client is running.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Drop read transactions against unhealthy nodes at admission.
    pub throttle_reads: bool,

    /// Drop write transactions against unhealthy nodes at admission.
    pub throttle_writes: bool,
}

/// Point-in-time copy of the request counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests that completed with a server response.
    pub n_req_successes: usize,
    /// Requests that failed, including timeouts.
    pub n_req_failures: usize,
    /// Requests that timed out, client- or server-side.
    pub n_req_timeouts: usize,
    /// Requests dropped by the admission throttle.
    pub n_req_throttles: usize,
    /// Transport failures absorbed by an internal retry.
    pub n_internal_retries: usize,
    /// Retries resumed after waiting for a node to become available.
    pub n_internal_retries_off_q: usize,
    /// Requests currently being processed.
    pub requests_in_progress: usize,
}

/// Request counters kept by the cluster. All counters are atomic; readers
/// get a consistent-enough view via [`ClusterStats::snapshot`].
#[derive(Debug, Default)]
pub struct ClusterStats {
    n_req_successes: AtomicUsize,
    n_req_failures: AtomicUsize,
    n_req_timeouts: AtomicUsize,
    n_req_throttles: AtomicUsize,
    n_internal_retries: AtomicUsize,
    n_internal_retries_off_q: AtomicUsize,
    requests_in_progress: AtomicUsize,
}

impl ClusterStats {
    pub(crate) fn add_success(&self) {
        self.n_req_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_failure(&self) {
        self.n_req_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_timeout(&self) {
        self.n_req_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_throttle(&self) {
        self.n_req_throttles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_internal_retry(&self) {
        self.n_internal_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_internal_retry_off_q(&self) {
        self.n_internal_retries_off_q.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn start_request(&self) {
        self.requests_in_progress.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn end_request(&self) {
        self.requests_in_progress.fetch_sub(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            n_req_successes: self.n_req_successes.load(Ordering::Relaxed),
            n_req_failures: self.n_req_failures.load(Ordering::Relaxed),
            n_req_timeouts: self.n_req_timeouts.load(Ordering::Relaxed),
            n_req_throttles: self.n_req_throttles.load(Ordering::Relaxed),
            n_internal_retries: self.n_internal_retries.load(Ordering::Relaxed),
            n_internal_retries_off_q: self.n_internal_retries_off_q.load(Ordering::Relaxed),
            requests_in_progress: self.requests_in_progress.load(Ordering::Relaxed),
        }
    }

    /// Log the current counter values.
    pub fn dump(&self) {
        let s = self.snapshot();
        info!(
            "requests: successes {}, failures {}, timeouts {}, throttles {}, \
             retries {}, retries off queue {}, in progress {}",
            s.n_req_successes,
            s.n_req_failures,
            s.n_req_timeouts,
            s.n_req_throttles,
            s.n_internal_retries,
            s.n_internal_retries_off_q,
            s.requests_in_progress
        );
    }
}

// Cluster directory: the set of known nodes, node selection for requests,
// and the parking spot for requests that arrive while no node is available.
#[derive(Debug)]
pub struct Cluster {
    client_policy: ClientPolicy,

    // Active nodes in cluster.
    nodes: RwLock<Vec<Arc<Node>>>,

    // Rotor for node selection.
    node_index: AtomicUsize,

    // Wakes requests parked while no node was available.
    node_available: Notify,

    throttle_reads: AtomicBool,
    throttle_writes: AtomicBool,

    closed: AtomicBool,

    stats: ClusterStats,
}

impl Cluster {
    pub async fn new(policy: ClientPolicy, hosts: &[Host]) -> Result<Arc<Self>> {
        let cluster = Arc::new(Cluster {
            throttle_reads: AtomicBool::new(policy.throttle_reads),
            throttle_writes: AtomicBool::new(policy.throttle_writes),
            client_policy: policy,
            nodes: RwLock::new(vec![]),
            node_index: AtomicUsize::new(0),
            node_available: Notify::new(),
            closed: AtomicBool::new(false),
            stats: ClusterStats::default(),
        });
        cluster.add_seeds(hosts).await?;
        debug!("New cluster initialized and ready to be used...");
        Ok(cluster)
    }

    pub fn client_policy(&self) -> &ClientPolicy {
        &self.client_policy
    }

    /// Register nodes for the given seed hosts. Parked requests are woken.
    pub async fn add_seeds(&self, hosts: &[Host]) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        for host in hosts {
            if nodes.iter().any(|node| node.host() == *host) {
                continue;
            }
            debug!("Adding seed {}", host);
            nodes.push(Arc::new(Node::new(self.client_policy.clone(), host.clone())));
        }
        drop(nodes);

        self.node_available.notify_waiters();
        Ok(())
    }

    /// Select a node for a transaction. The digest/write shape mirrors the
    /// server's partition addressing; with no partition map the selection
    /// rotates over the active nodes.
    pub async fn node_for(
        &self,
        _digest: &[u8; DIGEST_SIZE],
        _is_write: bool,
    ) -> Option<Arc<Node>> {
        let nodes = self.nodes.read().await;
        if nodes.is_empty() {
            return None;
        }

        for _ in 0..nodes.len() {
            let index = self.node_index.fetch_add(1, Ordering::Relaxed) % nodes.len();
            let node = &nodes[index];
            if node.is_active() {
                return Some(node.clone());
            }
        }

        None
    }

    /// Park until a node may be available. Spurious wake-ups are fine; the
    /// caller re-runs node selection afterwards.
    pub async fn wait_for_node(&self) {
        self.node_available.notified().await;
    }

    pub async fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.read().await.clone()
    }

    /// Flip the admission throttle switches while the client is running.
    pub fn update_runtime_options(&self, options: &RuntimeOptions) {
        self.throttle_reads
            .store(options.throttle_reads, Ordering::Relaxed);
        self.throttle_writes
            .store(options.throttle_writes, Ordering::Relaxed);
    }

    pub fn should_throttle(&self, is_write: bool) -> bool {
        if is_write {
            self.throttle_writes.load(Ordering::Relaxed)
        } else {
            self.throttle_reads.load(Ordering::Relaxed)
        }
    }

    pub fn stats(&self) -> &ClusterStats {
        &self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Deactivate all nodes, close their pools and wake parked requests so
    /// they fail promptly.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        let nodes = self.nodes.read().await;
        for node in nodes.iter() {
            node.close().await;
        }
        drop(nodes);
        self.node_available.notify_waiters();
    }
}

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

use std::fmt;
use std::result::Result as StdResult;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use rand::Rng;

use crate::errors::Result;
use crate::net::{ConnectionPool, Host, PooledConnection};
use crate::policy::ClientPolicy;

lazy_static! {
    static ref CLOCK_START: Instant = Instant::now();
}

fn clock_ms() -> u64 {
    CLOCK_START.elapsed().as_millis() as u64
}

/// A cluster node holding its connection pool and request health history.
///
/// Health is tracked over two admission-throttle windows: the current one
/// accumulates, the previous one is what [`Node::should_drop`] judges by.
#[derive(Debug)]
pub struct Node {
    client_policy: ClientPolicy,
    host: Host,
    address: String,

    connection_pool: ConnectionPool,
    failures: AtomicUsize,
    active: AtomicBool,

    window_start_ms: AtomicU64,
    curr_successes: AtomicUsize,
    curr_failures: AtomicUsize,
    prev_successes: AtomicUsize,
    prev_failures: AtomicUsize,
}

impl Node {
    #![allow(missing_docs)]
    pub fn new(client_policy: ClientPolicy, host: Host) -> Self {
        Node {
            address: host.address(),
            connection_pool: ConnectionPool::new(host.clone(), client_policy.clone()),
            client_policy,
            host,
            failures: AtomicUsize::new(0),
            active: AtomicBool::new(true),
            window_start_ms: AtomicU64::new(clock_ms()),
            curr_successes: AtomicUsize::new(0),
            curr_failures: AtomicUsize::new(0),
            prev_successes: AtomicUsize::new(0),
            prev_failures: AtomicUsize::new(0),
        }
    }

    // Returns the Node address
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn host(&self) -> Host {
        self.host.clone()
    }

    // Get a connection to the node from the connection pool
    pub async fn get_connection(&self) -> Result<PooledConnection> {
        self.connection_pool.get().await
    }

    /// Number of open connections, pooled or checked out.
    pub fn open_connections(&self) -> usize {
        self.connection_pool.open_conns()
    }

    // Amount of consecutive failures
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Record a completed transaction against this node.
    pub(crate) fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        self.curr_successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed or timed-out transaction against this node.
    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.curr_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Admission throttle check: should a new transaction against this node
    /// be dropped before any server contact?
    ///
    /// Judged by the previous full window. The drop percentage grows with
    /// the excess of the failure percentage over the configured threshold.
    pub(crate) fn should_drop(&self) -> bool {
        self.rotate_window();

        let successes = self.prev_successes.load(Ordering::Relaxed);
        let failures = self.prev_failures.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            return false;
        }

        let failure_pct = failures * 100 / total;
        let threshold = self.client_policy.throttle.threshold_failure_pct as usize;
        if failure_pct <= threshold {
            return false;
        }

        let drop_pct =
            ((failure_pct - threshold) * self.client_policy.throttle.factor as usize).min(100);
        (rand::thread_rng().gen_range(0..100) as usize) < drop_pct
    }

    fn rotate_window(&self) {
        let now = clock_ms();
        let window = self.client_policy.throttle.window.as_millis() as u64;
        let start = self.window_start_ms.load(Ordering::Relaxed);
        if now.saturating_sub(start) < window {
            return;
        }

        // Only one rotator wins; the others read the rotated counts.
        if self
            .window_start_ms
            .compare_exchange(start, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let s = self.curr_successes.swap(0, Ordering::Relaxed);
            let f = self.curr_failures.swap(0, Ordering::Relaxed);
            self.prev_successes.store(s, Ordering::Relaxed);
            self.prev_failures.store(f, Ordering::Relaxed);
        }
    }

    fn inactivate(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    // Returns true if the node is active
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    // Set the node inactive and close all connections in the pool
    pub async fn close(&self) {
        self.inactivate();
        self.connection_pool.close().await;
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.address == other.address
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        self.address.fmt(f)
    }
}

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

use std::time::Duration;

/// Tuning for the per-node admission throttle.
///
/// Each node keeps success/failure counts over the current and previous
/// throttle window. When throttling is enabled and the previous window's
/// failure percentage exceeds `threshold_failure_pct`, new transactions are
/// dropped with probability `(failure_pct - threshold) * factor`, capped at
/// 100%.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Length of one measurement window.
    pub window: Duration,

    /// Failure percentage below which no transactions are dropped.
    pub threshold_failure_pct: u32,

    /// Multiplier applied to the excess failure percentage to obtain the
    /// drop percentage.
    pub factor: u32,
}

impl Default for ThrottleConfig {
    fn default() -> ThrottleConfig {
        ThrottleConfig {
            window: Duration::from_secs(60),
            threshold_failure_pct: 2,
            factor: 10,
        }
    }
}

/// `ClientPolicy` encapsulates parameters for cluster and connection-pool
/// behavior. Per-transaction parameters live in `ReadPolicy`/`WritePolicy`.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// Initial host connection timeout.
    pub timeout: Option<Duration>,

    /// Connection idle timeout. Idle pooled connections are closed and
    /// re-established on next use.
    pub idle_timeout: Option<Duration>,

    /// Maximum number of open connections per node, idle or in use.
    pub max_conns_per_node: usize,

    /// Size threshold beyond which per-connection buffers are shrunk back
    /// once a response has been consumed.
    pub buffer_reclaim_threshold: usize,

    /// Drop read transactions against unhealthy nodes before any server
    /// contact. May also be toggled at runtime via the cluster's runtime
    /// options.
    pub throttle_reads: bool,

    /// Drop write transactions against unhealthy nodes before any server
    /// contact. May also be toggled at runtime via the cluster's runtime
    /// options.
    pub throttle_writes: bool,

    /// Admission throttle tuning shared by all nodes.
    pub throttle: ThrottleConfig,
}

impl Default for ClientPolicy {
    fn default() -> ClientPolicy {
        ClientPolicy {
            timeout: Some(Duration::from_secs(10)),
            idle_timeout: Some(Duration::from_secs(55)),
            max_conns_per_node: 256,
            buffer_reclaim_threshold: 65536,
            throttle_reads: false,
            throttle_writes: false,
            throttle: ThrottleConfig::default(),
        }
    }
}

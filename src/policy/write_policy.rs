// Copyright 2015-2020 Aerospike, Inc.
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

use crate::policy::{BasePolicy, Expiration, GenerationPolicy, PolicyLike};

/// `RetryPolicy` selects how the engine reacts to a transport failure in
/// the middle of a write.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RetryPolicy {
    /// Retry the write on another node until the transaction deadline
    /// elapses. The write may be applied more than once.
    Retry,

    /// Give up on the first transport failure and report a timeout. The
    /// failure is counted against the node.
    OneShot,
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy::Retry
    }
}

/// `WritePolicy` encapsulates parameters for all write operations.
#[derive(Debug, Clone, Default)]
pub struct WritePolicy {
    /// Base policy instance.
    pub base_policy: BasePolicy,

    /// Whether a transport failure mid-write is retried on another node or
    /// surfaced immediately.
    pub retry: RetryPolicy,

    /// GenerationPolicy qualifies how to handle record writes based on
    /// record generation. The default (None) indicates that the generation
    /// is not used to restrict writes.
    pub generation_policy: GenerationPolicy,

    /// Expected generation. Generation is the number of times a record has
    /// been modified (including creation) on the server. Only sent when
    /// `generation_policy` is `ExpectGenEqual`.
    pub generation: u32,

    /// Record expiration in seconds, also known as TTL (time-to-live).
    pub expiration: Expiration,
}

impl WritePolicy {
    /// Create a new write policy instance with the specified generation and
    /// expiration parameters.
    pub fn new(gen: u32, exp: Expiration) -> Self {
        WritePolicy {
            generation_policy: GenerationPolicy::ExpectGenEqual,
            generation: gen,
            expiration: exp,
            ..WritePolicy::default()
        }
    }
}

impl PolicyLike for WritePolicy {
    fn base(&self) -> &BasePolicy {
        &self.base_policy
    }
}

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

/// `GenerationPolicy` determines how a write operation uses the record
/// generation for optimistic concurrency.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GenerationPolicy {
    /// Do not use the generation to restrict writes.
    None,

    /// Update or delete the record only if the expected generation equals
    /// the generation stored on the server. Otherwise the transaction fails
    /// with a generation mismatch.
    ExpectGenEqual,
}

impl Default for GenerationPolicy {
    fn default() -> GenerationPolicy {
        GenerationPolicy::None
    }
}

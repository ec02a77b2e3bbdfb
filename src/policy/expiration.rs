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

const NAMESPACE_DEFAULT: u32 = 0x0000_0000;

/// Record expiration, also known as time-to-live (TTL). Travels in the
/// request's `record_ttl` header field as seconds.
#[derive(Debug, Clone, Copy)]
pub enum Expiration {
    /// Set the record to expire X seconds from now.
    Seconds(u32),

    /// Set the record's expiry time using the default time-to-live (TTL)
    /// value for the namespace.
    NamespaceDefault,
}

impl From<Expiration> for u32 {
    fn from(exp: Expiration) -> u32 {
        match exp {
            Expiration::Seconds(secs) => secs,
            Expiration::NamespaceDefault => NAMESPACE_DEFAULT,
        }
    }
}

impl Default for Expiration {
    fn default() -> Expiration {
        Expiration::NamespaceDefault
    }
}

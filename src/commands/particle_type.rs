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

/// On-wire type tag for a value payload inside a field or op. The values
/// align with the server-side file particle.h. Unsupported types are
/// commented out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleType {
    /// Empty value.
    Null = 0,
    /// 64-bit integer, variable-width big-endian on the wire.
    Integer = 1,
    /// 64-bit IEEE-754 float in network byte order.
    Float = 2,
    /// UTF-8 string, not null-terminated.
    String = 3,
    /// Plain byte array.
    Blob = 4,
    // TIMESTAMP = 5,
    // DIGEST    = 6,
    /// Blob serialized by the Java client.
    JavaBlob = 7,
    /// Blob serialized by the C# client.
    CsharpBlob = 8,
    /// Blob serialized by the Python client.
    PythonBlob = 9,
    /// Blob serialized by the Ruby client.
    RubyBlob = 10,
}

impl ParticleType {
    /// Convert from the wire byte; `None` for unrecognized tags.
    pub fn from_u8(val: u8) -> Option<ParticleType> {
        match val {
            0 => Some(ParticleType::Null),
            1 => Some(ParticleType::Integer),
            2 => Some(ParticleType::Float),
            3 => Some(ParticleType::String),
            4 => Some(ParticleType::Blob),
            7 => Some(ParticleType::JavaBlob),
            8 => Some(ParticleType::CsharpBlob),
            9 => Some(ParticleType::PythonBlob),
            10 => Some(ParticleType::RubyBlob),
            _ => None,
        }
    }
}

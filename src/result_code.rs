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

/// Database operation result codes. The positive values are defined in the
/// server-side file proto.h and travel on the wire; the negative values are
/// generated by the client and never leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Request dropped by the admission throttle before any server contact.
    Throttled,

    /// Client or server side timeout. Server-side timeouts are remapped to
    /// this code on delivery.
    Timeout,

    /// Local failure: bad arguments, allocation failure, socket setup.
    ClientError,

    /// Operation was successful.
    Ok,

    /// Unknown server failure.
    Unknown,

    /// On retrieving, touching or replacing a record that doesn't exist.
    NotFound,

    /// On modifying a record with unexpected generation.
    GenerationMismatch,

    /// Bad parameter(s) were passed in database operation call.
    ParameterError,

    /// On create-only (write unique) operations on a record that already
    /// exists.
    KeyExists,

    /// On create-only (write unique) operations on a bin that already exists.
    BinExists,

    /// Expected cluster Id was not received.
    ClusterKeyMismatch,

    /// Server has run out of memory.
    PartitionOutOfSpace,

    /// The server gave up on the transaction before answering. Remapped to
    /// [`ResultCode::Timeout`] before delivery.
    ServersideTimeout,

    /// XDR product is not available.
    NoXds,

    /// Server is not accepting requests.
    ServerUnavailable,

    /// Operation is not supported with the stored particle type.
    IncompatibleType,

    /// Record size exceeds limit.
    RecordTooBig,

    /// Too many concurrent operations on the same record.
    KeyBusy,
}

impl ResultCode {
    /// Convert the result code from the server's byte representation.
    pub fn from_u8(n: u8) -> ResultCode {
        match n {
            0 => ResultCode::Ok,
            2 => ResultCode::NotFound,
            3 => ResultCode::GenerationMismatch,
            4 => ResultCode::ParameterError,
            5 => ResultCode::KeyExists,
            6 => ResultCode::BinExists,
            7 => ResultCode::ClusterKeyMismatch,
            8 => ResultCode::PartitionOutOfSpace,
            9 => ResultCode::ServersideTimeout,
            10 => ResultCode::NoXds,
            11 => ResultCode::ServerUnavailable,
            12 => ResultCode::IncompatibleType,
            13 => ResultCode::RecordTooBig,
            14 => ResultCode::KeyBusy,
            _ => ResultCode::Unknown,
        }
    }

    /// The stable integer for this result code.
    pub fn to_i32(self) -> i32 {
        match self {
            ResultCode::Throttled => -3,
            ResultCode::Timeout => -2,
            ResultCode::ClientError => -1,
            ResultCode::Ok => 0,
            ResultCode::Unknown => 1,
            ResultCode::NotFound => 2,
            ResultCode::GenerationMismatch => 3,
            ResultCode::ParameterError => 4,
            ResultCode::KeyExists => 5,
            ResultCode::BinExists => 6,
            ResultCode::ClusterKeyMismatch => 7,
            ResultCode::PartitionOutOfSpace => 8,
            ResultCode::ServersideTimeout => 9,
            ResultCode::NoXds => 10,
            ResultCode::ServerUnavailable => 11,
            ResultCode::IncompatibleType => 12,
            ResultCode::RecordTooBig => 13,
            ResultCode::KeyBusy => 14,
        }
    }

    /// Convert the result code into a meaningful string.
    pub fn into_string(self) -> String {
        match self {
            ResultCode::Throttled => String::from("Request throttled"),
            ResultCode::Timeout => String::from("Timeout"),
            ResultCode::ClientError => String::from("Client error"),
            ResultCode::Ok => String::from("Ok"),
            ResultCode::Unknown => String::from("Unknown server error"),
            ResultCode::NotFound => String::from("Key not found"),
            ResultCode::GenerationMismatch => String::from("Generation mismatch"),
            ResultCode::ParameterError => String::from("Parameter error"),
            ResultCode::KeyExists => String::from("Key already exists"),
            ResultCode::BinExists => String::from("Bin already exists"),
            ResultCode::ClusterKeyMismatch => String::from("Cluster key mismatch"),
            ResultCode::PartitionOutOfSpace => String::from("Partition out of space"),
            ResultCode::ServersideTimeout => String::from("Server-side timeout"),
            ResultCode::NoXds => String::from("XDR not available"),
            ResultCode::ServerUnavailable => String::from("Server not available"),
            ResultCode::IncompatibleType => String::from("Incompatible particle type"),
            ResultCode::RecordTooBig => String::from("Record too big"),
            ResultCode::KeyBusy => String::from("Hot key"),
        }
    }
}

impl From<u8> for ResultCode {
    fn from(n: u8) -> ResultCode {
        ResultCode::from_u8(n)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ResultCode;

    #[test]
    fn from_u8() {
        assert_eq!(ResultCode::Ok, ResultCode::from(0));
        assert_eq!(ResultCode::NotFound, ResultCode::from(2));
        assert_eq!(ResultCode::ServersideTimeout, ResultCode::from(9));
        assert_eq!(ResultCode::Unknown, ResultCode::from(255));
    }

    #[test]
    fn stable_integers() {
        assert_eq!(0, ResultCode::Ok.to_i32());
        assert_eq!(2, ResultCode::NotFound.to_i32());
        assert_eq!(3, ResultCode::GenerationMismatch.to_i32());
        assert_eq!(4, ResultCode::ParameterError.to_i32());
        assert_eq!(9, ResultCode::ServersideTimeout.to_i32());
        assert_eq!(-1, ResultCode::ClientError.to_i32());
        assert_eq!(-2, ResultCode::Timeout.to_i32());
        assert_eq!(-3, ResultCode::Throttled.to_i32());
    }
}

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

//! Functions used to create database operations used in the client's
//! `operate()` method.

use crate::commands::buffer::Buffer;
use crate::Bin;

/// Operation type for a single op inside a multi-operation transaction. The
/// values travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[doc(hidden)]
pub enum OperationType {
    /// Read the bin.
    Read = 1,
    /// Write the bin.
    Write = 2,
    /// Arithmetic increment on an integer bin.
    Incr = 5,
}

/// Database operation definition. This data type is used in the client's
/// `operate()` method.
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    /// The type of the operation.
    #[doc(hidden)]
    pub op: OperationType,

    /// The name of the bin used in the operation.
    #[doc(hidden)]
    pub bin_name: &'a str,

    /// The value used in the operation; `None` for reads.
    #[doc(hidden)]
    pub value: Option<&'a crate::Value>,
}

impl<'a> Operation<'a> {
    /// True when the operation modifies the record.
    pub fn is_write(&self) -> bool {
        matches!(self.op, OperationType::Write | OperationType::Incr)
    }

    #[doc(hidden)]
    pub fn estimate_size(&self) -> usize {
        let mut size = self.bin_name.len();
        if let Some(value) = self.value {
            size += value.estimate_size();
        }
        size
    }

    #[doc(hidden)]
    pub fn write_to(&self, buffer: &mut Buffer) -> usize {
        let mut size = self.bin_name.len() + 4;
        if let Some(value) = self.value {
            size += value.estimate_size();
        }

        buffer.write_u32(size as u32);
        buffer.write_u8(self.op as u8);
        match self.value {
            Some(value) => buffer.write_u8(value.particle_type() as u8),
            None => buffer.write_u8(0), // reading - the particle type is unknown
        };
        buffer.write_u8(0);
        buffer.write_u8(self.bin_name.len() as u8);
        buffer.write_str(self.bin_name);
        if let Some(value) = self.value {
            value.write_to(buffer);
        }

        size + 4
    }
}

/// Create a read-bin database operation.
pub fn get_bin(bin_name: &str) -> Operation {
    Operation {
        op: OperationType::Read,
        bin_name,
        value: None,
    }
}

/// Create a set database operation.
pub fn put<'a>(bin: &'a Bin) -> Operation<'a> {
    Operation {
        op: OperationType::Write,
        bin_name: bin.name,
        value: Some(&bin.value),
    }
}

/// Create an integer add database operation.
pub fn add<'a>(bin: &'a Bin) -> Operation<'a> {
    Operation {
        op: OperationType::Incr,
        bin_name: bin.name,
        value: Some(&bin.value),
    }
}

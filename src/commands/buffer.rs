// Copyright 2015-2020 Aerospike, Inc.
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

use std::str;
use std::time::Duration;

use byteorder::{ByteOrder, NetworkEndian};

use crate::bin::BIN_NAME_MAX;
use crate::commands::field_type::FieldType;
use crate::errors::{Error, Result};
use crate::operations::{Operation, OperationType};
use crate::policy::{GenerationPolicy, WritePolicy};
use crate::{Bin, Bins, Key};

// Contains a read operation.
pub(crate) const INFO1_READ: u8 = 1;

// Get all bins.
pub(crate) const INFO1_GET_ALL: u8 = 1 << 1;

// Create or update record.
pub(crate) const INFO2_WRITE: u8 = 1;

// Fling a record into the belly of Moloch.
pub(crate) const INFO2_DELETE: u8 = 1 << 1;

// Update if expected generation == old.
pub(crate) const INFO2_GENERATION: u8 = 1 << 2;

pub(crate) const MSG_TOTAL_HEADER_SIZE: u8 = 30;
pub(crate) const FIELD_HEADER_SIZE: u8 = 5;
pub(crate) const OPERATION_HEADER_SIZE: u8 = 8;
pub(crate) const MSG_REMAINING_HEADER_SIZE: u8 = 22;
const CL_MSG_VERSION: u8 = 2;
const CL_MSG_TYPE: u8 = 3;

// MAX_BUFFER_SIZE protects against allocating massive memory blocks for
// buffers when a corrupted stream declares a huge frame size.
pub(crate) const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024 + 8; // 10 MB + header

// Holds the request/response data buffer for a command.
#[derive(Debug, Default)]
pub struct Buffer {
    pub data_buffer: Vec<u8>,
    pub data_offset: usize,
    pub reclaim_threshold: usize,
}

impl Buffer {
    pub(crate) fn new(reclaim_threshold: usize) -> Self {
        Buffer {
            data_buffer: Vec::with_capacity(1024),
            data_offset: 0,
            reclaim_threshold,
        }
    }

    fn begin(&mut self) {
        self.data_offset = MSG_TOTAL_HEADER_SIZE as usize;
    }

    pub(crate) fn size_buffer(&mut self) -> Result<()> {
        let offset = self.data_offset;
        self.resize_buffer(offset)
    }

    pub(crate) fn resize_buffer(&mut self, size: usize) -> Result<()> {
        // Corrupted data streams can result in a huge length.
        // Do a sanity check here.
        if size > MAX_BUFFER_SIZE {
            return Err(Error::InvalidArgument(format!(
                "Invalid size for buffer: {}",
                size
            )));
        }

        let mem_size = self.data_buffer.capacity();
        self.data_buffer.resize(size, 0);
        if mem_size > self.reclaim_threshold && size < mem_size {
            self.data_buffer.shrink_to_fit();
        }

        Ok(())
    }

    pub(crate) fn reset_offset(&mut self) {
        self.data_offset = 0;
    }

    pub(crate) fn end(&mut self) {
        let size = ((self.data_offset - 8) as i64)
            | (i64::from(CL_MSG_VERSION) << 56)
            | (i64::from(CL_MSG_TYPE) << 48);

        // reset data offset
        self.reset_offset();
        self.write_i64(size);
    }

    // Writes the command for read operations. `Bins::All` turns into a
    // GET_ALL header with no ops; named bins become one read op each.
    pub(crate) fn set_read(&mut self, key: &Key, bins: &Bins) -> Result<()> {
        match bins {
            Bins::All => {
                self.begin();
                let field_count = self.estimate_key_size(key)?;
                self.size_buffer()?;
                self.write_header(INFO1_READ | INFO1_GET_ALL, 0, field_count, 0);
                self.write_key(key)?;
                self.end();
                Ok(())
            }
            Bins::Some(ref bin_names) => {
                self.begin();
                let field_count = self.estimate_key_size(key)?;
                for bin_name in bin_names {
                    self.estimate_operation_size_for_bin_name(bin_name)?;
                }

                self.size_buffer()?;
                self.write_header(INFO1_READ, 0, field_count, bin_names.len() as u16);
                self.write_key(key)?;

                for bin_name in bin_names {
                    self.write_operation_for_bin_name(bin_name, OperationType::Read);
                }

                self.end();
                Ok(())
            }
        }
    }

    // Writes the command for write operations.
    pub(crate) fn set_write(
        &mut self,
        policy: &WritePolicy,
        op_type: OperationType,
        key: &Key,
        bins: &[Bin],
    ) -> Result<()> {
        self.begin();
        let field_count = self.estimate_key_size(key)?;

        for bin in bins {
            self.estimate_operation_size_for_bin(bin.as_ref())?;
        }

        self.size_buffer()?;
        self.write_header_with_policy(policy, 0, INFO2_WRITE, field_count, bins.len() as u16);
        self.write_key(key)?;

        for bin in bins {
            self.write_operation_for_bin(bin.as_ref(), op_type);
        }

        self.end();
        Ok(())
    }

    // Writes the command for delete operations.
    pub(crate) fn set_delete(&mut self, policy: &WritePolicy, key: &Key) -> Result<()> {
        self.begin();
        let field_count = self.estimate_key_size(key)?;

        self.size_buffer()?;
        self.write_header_with_policy(policy, 0, INFO2_WRITE | INFO2_DELETE, field_count, 0);
        self.write_key(key)?;

        self.end();
        Ok(())
    }

    // Writes the command for a mixed list of read/write/add operations. The
    // info bits are derived from the operations themselves.
    pub(crate) fn set_operate<'a>(
        &mut self,
        policy: &WritePolicy,
        key: &Key,
        operations: &'a [Operation<'a>],
    ) -> Result<()> {
        self.begin();

        let mut read_attr = 0;
        let mut write_attr = 0;

        for operation in operations {
            match operation.op {
                OperationType::Read => read_attr |= INFO1_READ,
                OperationType::Write | OperationType::Incr => write_attr |= INFO2_WRITE,
            }
            self.estimate_operation_size_for_operation(operation)?;
        }

        let field_count = self.estimate_key_size(key)?;
        self.size_buffer()?;

        if write_attr == 0 {
            self.write_header(read_attr, write_attr, field_count, operations.len() as u16);
        } else {
            self.write_header_with_policy(
                policy,
                read_attr,
                write_attr,
                field_count,
                operations.len() as u16,
            );
        }
        self.write_key(key)?;

        for operation in operations {
            operation.write_to(self);
        }
        self.end();
        Ok(())
    }

    fn estimate_key_size(&mut self, key: &Key) -> Result<u16> {
        let mut field_count: u16 = 0;

        if !key.namespace.is_empty() {
            self.data_offset += key.namespace.len() + FIELD_HEADER_SIZE as usize;
            field_count += 1;
        }

        if !key.set_name.is_empty() {
            self.data_offset += key.set_name.len() + FIELD_HEADER_SIZE as usize;
            field_count += 1;
        }

        // Key-addressed requests carry the user key itself; digest-addressed
        // requests carry the 20-byte digest.
        match key.user_key {
            Some(ref user_key) => {
                self.data_offset += user_key.key_size()? + FIELD_HEADER_SIZE as usize + 1;
                field_count += 1;
            }
            None => {
                self.data_offset += key.digest.len() + FIELD_HEADER_SIZE as usize;
                field_count += 1;
            }
        }

        Ok(field_count)
    }

    fn estimate_operation_size_for_bin(&mut self, bin: &Bin) -> Result<()> {
        if bin.name.len() > BIN_NAME_MAX {
            return Err(Error::InvalidArgument(format!(
                "Bin name `{}` exceeds {} bytes",
                bin.name, BIN_NAME_MAX
            )));
        }
        self.data_offset += bin.name.len() + OPERATION_HEADER_SIZE as usize;
        self.data_offset += bin.value.estimate_size();
        Ok(())
    }

    fn estimate_operation_size_for_bin_name(&mut self, bin_name: &str) -> Result<()> {
        if bin_name.len() > BIN_NAME_MAX {
            return Err(Error::InvalidArgument(format!(
                "Bin name `{}` exceeds {} bytes",
                bin_name, BIN_NAME_MAX
            )));
        }
        self.data_offset += bin_name.len() + OPERATION_HEADER_SIZE as usize;
        Ok(())
    }

    fn estimate_operation_size_for_operation(&mut self, operation: &Operation) -> Result<()> {
        if operation.bin_name.len() > BIN_NAME_MAX {
            return Err(Error::InvalidArgument(format!(
                "Bin name `{}` exceeds {} bytes",
                operation.bin_name, BIN_NAME_MAX
            )));
        }
        self.data_offset += operation.estimate_size() + OPERATION_HEADER_SIZE as usize;
        Ok(())
    }

    fn write_header(&mut self, info1: u8, info2: u8, field_count: u16, operation_count: u16) {
        // Write all header data except total size which must be written last.
        self.data_buffer[8] = MSG_REMAINING_HEADER_SIZE; // Message header length.
        self.data_buffer[9] = info1;
        self.data_buffer[10] = info2;

        // info3, unused, result_code, generation, record_ttl, transaction_ttl
        for i in 11..26 {
            self.data_buffer[i] = 0;
        }

        self.data_offset = 26;
        self.write_u16(field_count);
        self.write_u16(operation_count);

        self.data_offset = MSG_TOTAL_HEADER_SIZE as usize;
    }

    // Header write for write operations.
    fn write_header_with_policy(
        &mut self,
        policy: &WritePolicy,
        info1: u8,
        info2: u8,
        field_count: u16,
        operation_count: u16,
    ) {
        let mut generation: u32 = 0;
        let mut info2 = info2;

        match policy.generation_policy {
            GenerationPolicy::None => (),
            GenerationPolicy::ExpectGenEqual => {
                generation = policy.generation;
                info2 |= INFO2_GENERATION;
            }
        }

        // Write all header data except total size which must be written last.
        self.data_offset = 8;
        self.write_u8(MSG_REMAINING_HEADER_SIZE); // Message header length.
        self.write_u8(info1);
        self.write_u8(info2);
        self.write_u8(0); // info3 never currently written
        self.write_u8(0); // unused
        self.write_u8(0); // clear the result code

        self.write_u32(generation);
        self.write_u32(policy.expiration.into());

        // Initialize transaction ttl. It will be written later.
        self.write_u32(0);

        self.write_u16(field_count);
        self.write_u16(operation_count);
        self.data_offset = MSG_TOTAL_HEADER_SIZE as usize;
    }

    fn write_key(&mut self, key: &Key) -> Result<()> {
        if !key.namespace.is_empty() {
            self.write_field_string(&key.namespace, FieldType::Namespace);
        }

        if !key.set_name.is_empty() {
            self.write_field_string(&key.set_name, FieldType::Set);
        }

        match key.user_key {
            Some(ref user_key) => {
                self.write_field_header(user_key.key_size()? + 1, FieldType::Key);
                self.write_u8(user_key.particle_type() as u8);
                user_key.write_key_to(self)?;
            }
            None => {
                self.write_field_bytes(&key.digest, FieldType::DigestRipe);
            }
        }

        Ok(())
    }

    fn write_field_header(&mut self, size: usize, ftype: FieldType) {
        self.write_u32(size as u32 + 1);
        self.write_u8(ftype as u8);
    }

    fn write_field_string(&mut self, field: &str, ftype: FieldType) {
        self.write_field_header(field.len(), ftype);
        self.write_str(field);
    }

    fn write_field_bytes(&mut self, bytes: &[u8], ftype: FieldType) {
        self.write_field_header(bytes.len(), ftype);
        self.write_bytes(bytes);
    }

    fn write_operation_for_bin(&mut self, bin: &Bin, op_type: OperationType) {
        let name_length = bin.name.len();
        let value_length = bin.value.estimate_size();

        self.write_u32((name_length + value_length + 4) as u32);
        self.write_u8(op_type as u8);
        self.write_u8(bin.value.particle_type() as u8);
        self.write_u8(0);
        self.write_u8(name_length as u8);
        self.write_str(bin.name);
        bin.value.write_to(self);
    }

    fn write_operation_for_bin_name(&mut self, name: &str, op_type: OperationType) {
        self.write_u32(name.len() as u32 + 4);
        self.write_u8(op_type as u8);
        self.write_u8(0); // reading - the particle type is unknown
        self.write_u8(0);
        self.write_u8(name.len() as u8);
        self.write_str(name);
    }

    // Data buffer implementations

    pub(crate) fn skip(&mut self, count: usize) {
        self.data_offset += count;
    }

    /// Bytes left between the read offset and the end of the buffer.
    pub(crate) fn remaining(&self) -> usize {
        self.data_buffer.len().saturating_sub(self.data_offset)
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u8(&mut self, pos: Option<usize>) -> u8 {
        if let Some(pos) = pos {
            self.data_buffer[pos]
        } else {
            let res = self.data_buffer[self.data_offset];
            self.data_offset += 1;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u16(&mut self, pos: Option<usize>) -> u16 {
        let len = 2;
        if let Some(pos) = pos {
            NetworkEndian::read_u16(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u16(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u32(&mut self, pos: Option<usize>) -> u32 {
        let len = 4;
        if let Some(pos) = pos {
            NetworkEndian::read_u32(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u32(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_u64(&mut self, pos: Option<usize>) -> u64 {
        let len = 8;
        if let Some(pos) = pos {
            NetworkEndian::read_u64(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_u64(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    #[allow(clippy::option_if_let_else)]
    pub(crate) fn read_f64(&mut self, pos: Option<usize>) -> f64 {
        let len = 8;
        if let Some(pos) = pos {
            NetworkEndian::read_f64(&self.data_buffer[pos..pos + len])
        } else {
            let res = NetworkEndian::read_f64(
                &self.data_buffer[self.data_offset..self.data_offset + len],
            );
            self.data_offset += len;
            res
        }
    }

    pub(crate) fn read_str(&mut self, len: usize) -> Result<String> {
        let s = str::from_utf8(&self.data_buffer[self.data_offset..self.data_offset + len])?;
        self.data_offset += len;
        Ok(s.to_owned())
    }

    pub(crate) fn read_blob(&mut self, len: usize) -> Vec<u8> {
        let val = self.data_buffer[self.data_offset..self.data_offset + len].to_vec();
        self.data_offset += len;
        val
    }

    pub(crate) fn write_u8(&mut self, val: u8) -> usize {
        self.data_buffer[self.data_offset] = val;
        self.data_offset += 1;
        1
    }

    pub(crate) fn write_u16(&mut self, val: u16) -> usize {
        NetworkEndian::write_u16(
            &mut self.data_buffer[self.data_offset..self.data_offset + 2],
            val,
        );
        self.data_offset += 2;
        2
    }

    pub(crate) fn write_u32(&mut self, val: u32) -> usize {
        NetworkEndian::write_u32(
            &mut self.data_buffer[self.data_offset..self.data_offset + 4],
            val,
        );
        self.data_offset += 4;
        4
    }

    pub(crate) fn write_u64(&mut self, val: u64) -> usize {
        NetworkEndian::write_u64(
            &mut self.data_buffer[self.data_offset..self.data_offset + 8],
            val,
        );
        self.data_offset += 8;
        8
    }

    pub(crate) fn write_i64(&mut self, val: i64) -> usize {
        self.write_u64(val as u64)
    }

    pub(crate) fn write_f64(&mut self, val: f64) -> usize {
        NetworkEndian::write_f64(
            &mut self.data_buffer[self.data_offset..self.data_offset + 8],
            val,
        );
        self.data_offset += 8;
        8
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        for b in bytes {
            self.write_u8(*b);
        }
        bytes.len()
    }

    pub(crate) fn write_str(&mut self, val: &str) -> usize {
        self.write_bytes(val.as_bytes())
    }

    // The transaction ttl tells the server how long the client is willing to
    // wait; it lands in the already-laid-out header.
    pub(crate) fn write_timeout(&mut self, val: Option<Duration>) {
        if let Some(val) = val {
            let millis: u32 = (val.as_secs() * 1_000) as u32 + val.subsec_millis();
            NetworkEndian::write_u32(&mut self.data_buffer[22..22 + 4], millis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Expiration;
    use crate::Value;

    fn test_key() -> Key {
        Key::new("test", "s", Value::from("k1")).unwrap()
    }

    #[test]
    fn put_request_layout() {
        let mut buf = Buffer::new(0);
        let policy = WritePolicy::default();
        let bins = [Bin::new("value", Value::from(42))];
        buf.set_write(&policy, OperationType::Write, &test_key(), &bins)
            .unwrap();

        let b = &buf.data_buffer;
        // proto header: version 2, type 3, 48-bit size = total - 8
        assert_eq!(2, b[0]);
        assert_eq!(3, b[1]);
        let sz = NetworkEndian::read_u64(&b[0..8]) & 0xFFFF_FFFF_FFFF;
        assert_eq!(b.len() as u64 - 8, sz);

        // message header
        assert_eq!(22, b[8]);
        assert_eq!(0, b[9]);
        assert_eq!(INFO2_WRITE, b[10]);
        assert_eq!(0, b[13]); // result code clear
        assert_eq!(3, NetworkEndian::read_u16(&b[26..28])); // ns, set, key
        assert_eq!(1, NetworkEndian::read_u16(&b[28..30]));

        // first field: namespace
        assert_eq!(5, NetworkEndian::read_u32(&b[30..34]));
        assert_eq!(FieldType::Namespace as u8, b[34]);
        assert_eq!(b"test", &b[35..39]);

        // set field
        assert_eq!(2, NetworkEndian::read_u32(&b[39..43]));
        assert_eq!(FieldType::Set as u8, b[43]);
        assert_eq!(b"s", &b[44..45]);

        // key field: particle type + bytes
        assert_eq!(4, NetworkEndian::read_u32(&b[45..49]));
        assert_eq!(FieldType::Key as u8, b[49]);
        assert_eq!(crate::ParticleType::String as u8, b[50]);
        assert_eq!(b"k1", &b[51..53]);

        // single op: 42 encodes in one byte
        assert_eq!(10, NetworkEndian::read_u32(&b[53..57]));
        assert_eq!(OperationType::Write as u8, b[57]);
        assert_eq!(crate::ParticleType::Integer as u8, b[58]);
        assert_eq!(0, b[59]);
        assert_eq!(5, b[60]);
        assert_eq!(b"value", &b[61..66]);
        assert_eq!(42, b[66]);
        assert_eq!(67, b.len());
    }

    #[test]
    fn get_all_layout() {
        let mut buf = Buffer::new(0);
        buf.set_read(&test_key(), &Bins::All).unwrap();

        let b = &buf.data_buffer;
        assert_eq!(INFO1_READ | INFO1_GET_ALL, b[9]);
        assert_eq!(0, b[10]);
        assert_eq!(3, NetworkEndian::read_u16(&b[26..28]));
        assert_eq!(0, NetworkEndian::read_u16(&b[28..30]));
    }

    #[test]
    fn digest_addressed_layout() {
        let source = test_key();
        let key = Key::with_digest("test", source.digest);

        let mut buf = Buffer::new(0);
        buf.set_read(&key, &Bins::Some(vec!["value".to_string()]))
            .unwrap();

        let b = &buf.data_buffer;
        assert_eq!(INFO1_READ, b[9]);
        // namespace + digest, no set field
        assert_eq!(2, NetworkEndian::read_u16(&b[26..28]));

        // namespace field, then the digest field
        assert_eq!(FieldType::Namespace as u8, b[34]);
        assert_eq!(21, NetworkEndian::read_u32(&b[39..43]));
        assert_eq!(FieldType::DigestRipe as u8, b[43]);
        assert_eq!(&source.digest[..], &b[44..64]);
    }

    #[test]
    fn generation_header() {
        let mut buf = Buffer::new(0);
        let mut policy = WritePolicy::new(7, Expiration::Seconds(120));
        policy.generation_policy = GenerationPolicy::ExpectGenEqual;
        buf.set_delete(&policy, &test_key()).unwrap();

        let b = &buf.data_buffer;
        assert_eq!(INFO2_WRITE | INFO2_DELETE | INFO2_GENERATION, b[10]);
        assert_eq!(7, NetworkEndian::read_u32(&b[14..18]));
        assert_eq!(120, NetworkEndian::read_u32(&b[18..22]));
    }

    #[test]
    fn transaction_ttl() {
        let mut buf = Buffer::new(0);
        buf.set_read(&test_key(), &Bins::All).unwrap();
        buf.write_timeout(Some(Duration::from_millis(200)));
        assert_eq!(200, NetworkEndian::read_u32(&buf.data_buffer[22..26]));
    }

    #[test]
    fn oversize_bin_name() {
        let mut buf = Buffer::new(0);
        let policy = WritePolicy::default();
        let bins = [Bin::new("a_rather_too_long_bin_name", Value::from(1))];
        assert!(buf
            .set_write(&policy, OperationType::Write, &test_key(), &bins)
            .is_err());
    }
}

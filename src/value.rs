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

use byteorder::{ByteOrder, NetworkEndian};

use ripemd::digest::Update;
use ripemd::Ripemd160;

use crate::commands::buffer::Buffer;
use crate::commands::ParticleType;
use crate::errors::{Error, Result};

/// Language tag carried by blob values. Plain byte arrays are `Generic`; the
/// other tags mark blobs serialized by a specific client runtime and are
/// passed through opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobType {
    /// Plain byte array.
    Generic,
    /// Blob serialized by the Java client.
    Java,
    /// Blob serialized by the C# client.
    CSharp,
    /// Blob serialized by the Python client.
    Python,
    /// Blob serialized by the Ruby client.
    Ruby,
}

impl BlobType {
    /// The wire particle type for this blob flavor.
    pub fn particle_type(self) -> ParticleType {
        match self {
            BlobType::Generic => ParticleType::Blob,
            BlobType::Java => ParticleType::JavaBlob,
            BlobType::CSharp => ParticleType::CsharpBlob,
            BlobType::Python => ParticleType::PythonBlob,
            BlobType::Ruby => ParticleType::RubyBlob,
        }
    }
}

/// Container for bin values stored in the database.
///
/// Strings are not null-terminated on the wire; integers travel in a
/// variable-width big-endian encoding; floats as the 8-byte IEEE-754 bit
/// pattern in network byte order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Empty value.
    Nil,

    /// Integer value. All integers are represented as 64-bit numerics.
    Int(i64),

    /// Floating point value, stored in 64-bit IEEE-754 format.
    Float(f64),

    /// String value.
    String(String),

    /// Byte array value with its language tag.
    Blob(BlobType, Vec<u8>),
}

impl Value {
    /// Returns true if this value is the empty value (nil).
    pub fn is_nil(&self) -> bool {
        matches!(*self, Value::Nil)
    }

    /// Return the particle type for the value used in the wire protocol.
    /// For internal use only.
    #[doc(hidden)]
    pub fn particle_type(&self) -> ParticleType {
        match *self {
            Value::Nil => ParticleType::Null,
            Value::Int(_) => ParticleType::Integer,
            Value::Float(_) => ParticleType::Float,
            Value::String(_) => ParticleType::String,
            Value::Blob(btype, _) => btype.particle_type(),
        }
    }

    /// Returns a string representation of the value.
    pub fn as_string(&self) -> String {
        match *self {
            Value::Nil => "<null>".to_string(),
            Value::Int(ref val) => val.to_string(),
            Value::Float(ref val) => val.to_string(),
            Value::String(ref val) => val.to_string(),
            Value::Blob(_, ref val) => format!("{:?}", val),
        }
    }

    /// Calculate the size in bytes that the representation on wire for this
    /// value will require. For internal use only.
    #[doc(hidden)]
    pub fn estimate_size(&self) -> usize {
        match *self {
            Value::Nil => 0,
            Value::Int(val) => int_encoded_size(val),
            Value::Float(_) => 8,
            Value::String(ref s) => s.len(),
            Value::Blob(_, ref b) => b.len(),
        }
    }

    /// Serialize the value into the given buffer. For internal use only.
    #[doc(hidden)]
    pub fn write_to(&self, buf: &mut Buffer) -> usize {
        match *self {
            Value::Nil => 0,
            Value::Int(val) => write_int(buf, val),
            Value::Float(val) => buf.write_f64(val),
            Value::String(ref val) => buf.write_str(val),
            Value::Blob(_, ref val) => buf.write_bytes(val),
        }
    }

    /// The on-wire size of the value when used as a record key. Integer keys
    /// always travel as 8 bytes, unlike integer bin values.
    pub(crate) fn key_size(&self) -> Result<usize> {
        match *self {
            Value::Int(_) => Ok(8),
            Value::String(ref s) => Ok(s.len()),
            Value::Blob(_, ref b) => Ok(b.len()),
            _ => Err(Error::InvalidArgument(format!(
                "Data type is not supported as key value: {}",
                self
            ))),
        }
    }

    /// Serialize the value as a record key into the buffer. Must stay in
    /// sync with [`Value::feed_digest`].
    pub(crate) fn write_key_to(&self, buf: &mut Buffer) -> Result<usize> {
        match *self {
            Value::Int(val) => Ok(buf.write_i64(val)),
            Value::String(ref val) => Ok(buf.write_str(val)),
            Value::Blob(_, ref val) => Ok(buf.write_bytes(val)),
            _ => Err(Error::InvalidArgument(format!(
                "Data type is not supported as key value: {}",
                self
            ))),
        }
    }

    /// Feed the key bytes into the digest hash. For internal use only.
    #[doc(hidden)]
    pub fn feed_digest(&self, h: &mut Ripemd160) -> Result<()> {
        match *self {
            Value::Int(val) => {
                let mut buf = [0; 8];
                NetworkEndian::write_i64(&mut buf, val);
                Update::update(h, &buf);
                Ok(())
            }
            Value::String(ref val) => {
                Update::update(h, val.as_bytes());
                Ok(())
            }
            Value::Blob(_, ref val) => {
                Update::update(h, val);
                Ok(())
            }
            _ => Err(Error::InvalidArgument(format!(
                "Data type is not supported as key value: {}",
                self
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        write!(f, "{}", self.as_string())
    }
}

/// Width of the variable-length integer encoding:
/// negative values take 8 bytes, `0..=0x7F` one byte, `0x80..=0x7FFE` two,
/// `0x7FFF..=0x7FFF_FFFE` four, everything else eight.
pub(crate) fn int_encoded_size(val: i64) -> usize {
    if val < 0 {
        8
    } else if val <= 0x7F {
        1
    } else if val < 0x7FFF {
        2
    } else if val < 0x7FFF_FFFF {
        4
    } else {
        8
    }
}

fn write_int(buf: &mut Buffer, val: i64) -> usize {
    match int_encoded_size(val) {
        1 => buf.write_u8(val as u8),
        2 => buf.write_u16(val as u16),
        4 => buf.write_u32(val as u32),
        _ => buf.write_i64(val),
    }
}

/// Decode a variable-width wire integer. Size 8 is unconditionally signed;
/// sizes 1-7 are unsigned big-endian magnitudes; size 0 decodes to zero.
pub(crate) fn decode_int(bytes: &[u8]) -> Result<i64> {
    match bytes.len() {
        0 => Ok(0),
        8 => Ok(NetworkEndian::read_i64(bytes)),
        n if n < 8 => {
            let mut val: i64 = 0;
            for b in bytes {
                val = (val << 8) | i64::from(*b);
            }
            Ok(val)
        }
        n => Err(Error::BadResponse(format!(
            "Invalid integer particle size: {}",
            n
        ))),
    }
}

/// Decode a response particle into a typed value.
pub(crate) fn bytes_to_particle(ptype: u8, buf: &mut Buffer, len: usize) -> Result<Value> {
    match ParticleType::from_u8(ptype) {
        Some(ParticleType::Null) => {
            buf.skip(len);
            Ok(Value::Nil)
        }
        Some(ParticleType::Integer) => {
            let bytes = buf.read_blob(len);
            Ok(Value::Int(decode_int(&bytes)?))
        }
        Some(ParticleType::Float) => {
            if len != 8 {
                return Err(Error::BadResponse(format!(
                    "Invalid float particle size: {}",
                    len
                )));
            }
            Ok(Value::Float(buf.read_f64(None)))
        }
        Some(ParticleType::String) => Ok(Value::String(buf.read_str(len)?)),
        Some(ParticleType::Blob) => Ok(Value::Blob(BlobType::Generic, buf.read_blob(len))),
        Some(ParticleType::JavaBlob) => Ok(Value::Blob(BlobType::Java, buf.read_blob(len))),
        Some(ParticleType::CsharpBlob) => Ok(Value::Blob(BlobType::CSharp, buf.read_blob(len))),
        Some(ParticleType::PythonBlob) => Ok(Value::Blob(BlobType::Python, buf.read_blob(len))),
        Some(ParticleType::RubyBlob) => Ok(Value::Blob(BlobType::Ruby, buf.read_blob(len))),
        None => Err(Error::BadResponse(format!(
            "Unknown particle type: {}",
            ptype
        ))),
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value::String(val)
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Value {
        Value::Blob(BlobType::Generic, val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Value {
        Value::Float(val)
    }
}

impl<'a> From<&'a f64> for Value {
    fn from(val: &'a f64) -> Value {
        Value::Float(*val)
    }
}

impl<'a> From<&'a String> for Value {
    fn from(val: &'a String) -> Value {
        Value::String(val.clone())
    }
}

impl<'a> From<&'a str> for Value {
    fn from(val: &'a str) -> Value {
        Value::String(val.to_string())
    }
}

impl<'a> From<&'a Vec<u8>> for Value {
    fn from(val: &'a Vec<u8>) -> Value {
        Value::Blob(BlobType::Generic, val.clone())
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(val: &'a [u8]) -> Value {
        Value::Blob(BlobType::Generic, val.to_vec())
    }
}

impl From<i8> for Value {
    fn from(val: i8) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<u8> for Value {
    fn from(val: u8) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<i16> for Value {
    fn from(val: i16) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<u16> for Value {
    fn from(val: u16) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Value {
        Value::Int(i64::from(val))
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Value {
        Value::Int(val)
    }
}

impl From<isize> for Value {
    fn from(val: isize) -> Value {
        Value::Int(val as i64)
    }
}

impl<'a> From<&'a i8> for Value {
    fn from(val: &'a i8) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a u8> for Value {
    fn from(val: &'a u8) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a i16> for Value {
    fn from(val: &'a i16) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a u16> for Value {
    fn from(val: &'a u16) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a i32> for Value {
    fn from(val: &'a i32) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a u32> for Value {
    fn from(val: &'a u32) -> Value {
        Value::Int(i64::from(*val))
    }
}

impl<'a> From<&'a i64> for Value {
    fn from(val: &'a i64) -> Value {
        Value::Int(*val)
    }
}

impl<'a> From<&'a isize> for Value {
    fn from(val: &'a isize) -> Value {
        Value::Int(*val as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_buffer(len: usize) -> Buffer {
        let mut buf = Buffer::new(0);
        buf.resize_buffer(len).unwrap();
        buf
    }

    fn encode_int_bytes(val: i64) -> Vec<u8> {
        let mut buf = scratch_buffer(8);
        let n = write_int(&mut buf, val);
        buf.data_buffer[..n].to_vec()
    }

    #[test]
    fn int_width_law() {
        assert_eq!(8, int_encoded_size(-1));
        assert_eq!(8, int_encoded_size(i64::min_value()));
        assert_eq!(1, int_encoded_size(0));
        assert_eq!(1, int_encoded_size(0x7F));
        assert_eq!(2, int_encoded_size(0x80));
        assert_eq!(2, int_encoded_size(0x7FFE));
        assert_eq!(4, int_encoded_size(0x7FFF));
        assert_eq!(4, int_encoded_size(0x7FFF_FFFE));
        assert_eq!(8, int_encoded_size(0x7FFF_FFFF));
        assert_eq!(8, int_encoded_size(i64::max_value()));
    }

    #[test]
    fn int_round_trip() {
        let samples = [
            0,
            1,
            0x7F,
            0x80,
            0x100,
            0x7FFE,
            0x7FFF,
            0x10000,
            0x7FFF_FFFE,
            0x7FFF_FFFF,
            0x1_0000_0000,
            i64::max_value(),
            -1,
            -127,
            -32768,
            i64::min_value(),
        ];
        for &val in &samples {
            let bytes = encode_int_bytes(val);
            assert_eq!(int_encoded_size(val), bytes.len());
            assert_eq!(val, decode_int(&bytes).unwrap(), "value {:#x}", val);
        }
    }

    #[test]
    fn int_decode_widths() {
        assert_eq!(0, decode_int(&[]).unwrap());
        assert_eq!(0x7F, decode_int(&[0x7F]).unwrap());
        // sizes 1-7 decode as unsigned magnitudes even with the top bit set
        assert_eq!(0xFF, decode_int(&[0xFF]).unwrap());
        assert_eq!(0xFFFF, decode_int(&[0xFF, 0xFF]).unwrap());
        assert_eq!(
            -1,
            decode_int(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap()
        );
        assert!(decode_int(&[0; 9]).is_err());
    }

    #[test]
    fn float_bits() {
        let mut buf = scratch_buffer(8);
        Value::Float(4.1415).write_to(&mut buf);
        assert_eq!(4.1415f64.to_be_bytes().to_vec(), buf.data_buffer);

        buf.reset_offset();
        let val = bytes_to_particle(ParticleType::Float as u8, &mut buf, 8).unwrap();
        assert_eq!(Value::Float(4.1415), val);
    }

    #[test]
    fn blob_subtypes() {
        let blob = Value::Blob(BlobType::Python, vec![1, 2, 3]);
        assert_eq!(ParticleType::PythonBlob, blob.particle_type());

        let mut buf = scratch_buffer(3);
        blob.write_to(&mut buf);
        buf.reset_offset();
        let val = bytes_to_particle(ParticleType::PythonBlob as u8, &mut buf, 3).unwrap();
        assert_eq!(blob, val);
    }

    #[test]
    fn unknown_particle() {
        let mut buf = scratch_buffer(4);
        assert!(bytes_to_particle(99, &mut buf, 4).is_err());
    }
}

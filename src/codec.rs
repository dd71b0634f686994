//! Binary serialization for store data structures.
//!
//! The on-disk archive is deliberately simple: fixed-width little-endian
//! integers, `u64`-length-prefixed strings and byte sequences, and
//! `u64`-length-prefixed homogeneous containers. Composite types opt in
//! through the [`BinaryCodec`] trait and are written/read with
//! [`marshall`] and [`unmarshall`].

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{BridgeError, Result};

/// A binary stream writer that keeps count of the bytes it emits.
pub struct BinaryWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer.
    pub fn new(writer: W) -> Self {
        BinaryWriter { writer, written: 0 }
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.written += 1;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.written += 4;
        Ok(())
    }

    /// Write a u64 value (little-endian).
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.written += 8;
        Ok(())
    }

    /// Write a bool as a single byte.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Write raw bytes with a u64 length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_u64(value.len() as u64)?;
        self.write_raw(value)
    }

    /// Write a string as length-prefixed UTF-8.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write raw bytes without a length prefix.
    pub fn write_raw(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        self.written += value.len() as u64;
        Ok(())
    }

    /// Total bytes emitted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// A binary stream reader.
///
/// Every failure (short read, invalid UTF-8, length exceeding the input)
/// surfaces as [`BridgeError::Serialization`].
pub struct BinaryReader<R: Read> {
    reader: R,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader.
    pub fn new(reader: R) -> Self {
        BinaryReader { reader }
    }

    /// Read a u8 value.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.reader
            .read_u8()
            .map_err(|e| BridgeError::serialization(format!("failed to read u8: {e}")))
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        self.reader
            .read_u32::<LittleEndian>()
            .map_err(|e| BridgeError::serialization(format!("failed to read u32: {e}")))
    }

    /// Read a u64 value (little-endian).
    pub fn read_u64(&mut self) -> Result<u64> {
        self.reader
            .read_u64::<LittleEndian>()
            .map_err(|e| BridgeError::serialization(format!("failed to read u64: {e}")))
    }

    /// Read a bool encoded as a single byte.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BridgeError::serialization(format!(
                "invalid bool byte: {other}"
            ))),
        }
    }

    /// Read a u64-length-prefixed byte sequence.
    ///
    /// The bytes are pulled through `Read::take` so that a corrupt length
    /// fails with a short read instead of an oversized allocation.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.read_u64()?;
        let mut bytes = Vec::new();
        self.reader
            .by_ref()
            .take(length)
            .read_to_end(&mut bytes)
            .map_err(|e| BridgeError::serialization(format!("failed to read bytes: {e}")))?;
        if bytes.len() as u64 != length {
            return Err(BridgeError::serialization(format!(
                "byte sequence truncated: expected {length} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| BridgeError::serialization(format!("invalid UTF-8: {e}")))
    }
}

/// Types that can be written to and read back from a binary archive.
pub trait BinaryCodec: Sized {
    /// Encode `self` onto the writer.
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()>;

    /// Decode a value from the reader.
    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self>;
}

/// Encode a value onto a byte sink, returning the number of bytes written.
pub fn marshall<W: Write, T: BinaryCodec>(sink: W, value: &T) -> Result<u64> {
    let mut writer = BinaryWriter::new(sink);
    value.encode(&mut writer)?;
    Ok(writer.written())
}

/// Decode a value from a byte source.
pub fn unmarshall<R: Read, T: BinaryCodec>(source: R) -> Result<T> {
    let mut reader = BinaryReader::new(source);
    T::decode(&mut reader)
}

impl BinaryCodec for u32 {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u32(*self)
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_u32()
    }
}

impl BinaryCodec for u64 {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u64(*self)
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_u64()
    }
}

impl BinaryCodec for bool {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_bool(*self)
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_bool()
    }
}

impl BinaryCodec for String {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_string(self)
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_string()
    }
}

impl<T: BinaryCodec> BinaryCodec for Vec<T> {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u64(self.len() as u64)?;
        for item in self {
            item.encode(writer)?;
        }
        Ok(())
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let length = reader.read_u64()? as usize;
        let mut items = Vec::with_capacity(length.min(1 << 16));
        for _ in 0..length {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<K, V> BinaryCodec for BTreeMap<K, V>
where
    K: BinaryCodec + Ord,
    V: BinaryCodec,
{
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u64(self.len() as u64)?;
        for (key, value) in self {
            key.encode(writer)?;
            value.encode(writer)?;
        }
        Ok(())
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let length = reader.read_u64()?;
        let mut map = BTreeMap::new();
        for _ in 0..length {
            let key = K::decode(reader)?;
            let value = V::decode(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_round_trip() {
        let mut buffer = Vec::new();
        let mut writer = BinaryWriter::new(&mut buffer);

        writer.write_u8(42).unwrap();
        writer.write_u32(5678).unwrap();
        writer.write_u64(9876543210).unwrap();
        writer.write_bool(true).unwrap();
        writer.write_string("Hello, World!").unwrap();
        writer.write_bytes(b"binary data").unwrap();
        assert_eq!(writer.written(), buffer.len() as u64);

        let mut reader = BinaryReader::new(&buffer[..]);
        assert_eq!(reader.read_u8().unwrap(), 42);
        assert_eq!(reader.read_u32().unwrap(), 5678);
        assert_eq!(reader.read_u64().unwrap(), 9876543210);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_string().unwrap(), "Hello, World!");
        assert_eq!(reader.read_bytes().unwrap(), b"binary data");
    }

    #[test]
    fn test_marshall_unmarshall_containers() {
        let values: Vec<u32> = vec![1, 5, 10, 15, 25];
        let mut buffer = Vec::new();
        let written = marshall(&mut buffer, &values).unwrap();
        assert_eq!(written, 8 + 4 * 5);

        let decoded: Vec<u32> = unmarshall(&buffer[..]).unwrap();
        assert_eq!(decoded, values);

        let mut map = BTreeMap::new();
        map.insert(3u32, 300u32);
        map.insert(1u32, 100u32);
        let mut buffer = Vec::new();
        marshall(&mut buffer, &map).unwrap();
        let decoded: BTreeMap<u32, u32> = unmarshall(&buffer[..]).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_short_read_fails() {
        let buffer = vec![1u8, 2, 3];
        let result: Result<u64> = unmarshall(&buffer[..]);
        assert!(matches!(result, Err(BridgeError::Serialization(_))));
    }

    #[test]
    fn test_truncated_byte_sequence_fails() {
        let mut buffer = Vec::new();
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_u64(1000).unwrap();
        writer.write_raw(b"too short").unwrap();

        let mut reader = BinaryReader::new(&buffer[..]);
        let result = reader.read_bytes();
        assert!(matches!(result, Err(BridgeError::Serialization(_))));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut buffer = Vec::new();
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_bytes(&[0xff, 0xfe, 0xfd]).unwrap();

        let mut reader = BinaryReader::new(&buffer[..]);
        assert!(matches!(
            reader.read_string(),
            Err(BridgeError::Serialization(_))
        ));
    }

    #[test]
    fn test_invalid_bool_fails() {
        let buffer = vec![7u8];
        let mut reader = BinaryReader::new(&buffer[..]);
        assert!(matches!(
            reader.read_bool(),
            Err(BridgeError::Serialization(_))
        ));
    }
}

use crate::error::{Error, Result};

/// Record type stored in the WAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Put = 0x01,
    Delete = 0x02,
    CreateNamespace = 0x03,
    DropNamespace = 0x04,
    /// Closes a transaction. Records after the last commit marker are
    /// ignored on replay.
    Commit = 0x05,
}

impl RecordType {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(RecordType::Put),
            0x02 => Ok(RecordType::Delete),
            0x03 => Ok(RecordType::CreateNamespace),
            0x04 => Ok(RecordType::DropNamespace),
            0x05 => Ok(RecordType::Commit),
            _ => Err(Error::Corruption(format!("invalid record type: {}", byte))),
        }
    }
}

/// A single record in the WAL.
///
/// On-disk format:
/// ```text
/// ┌──────────┬────────┬──────────┬───────────┬─────────┬────────────┬───────────┬───────────┐
/// │ CRC (4B) │ Len(4B)│ Type(1B) │ NsLen(2B) │ Ns (var)│ KeyLen(4B) │ Key (var) │ Val (var) │
/// └──────────┴────────┴──────────┴───────────┴─────────┴────────────┴───────────┴───────────┘
/// ```
///
/// CRC covers everything after the CRC field itself. All integers are
/// little-endian. If CRC doesn't match on read, the record was a partial
/// write (crash mid-write) and recovery stops here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WALRecord {
    pub record_type: RecordType,
    pub namespace: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

// Header sizes
const CRC_SIZE: usize = 4;
const LEN_SIZE: usize = 4;
const TYPE_SIZE: usize = 1;
const NS_LEN_SIZE: usize = 2;
const KEY_LEN_SIZE: usize = 4;
const HEADER_SIZE: usize = CRC_SIZE + LEN_SIZE + TYPE_SIZE + NS_LEN_SIZE + KEY_LEN_SIZE;

/// Longest namespace name the frame can carry.
pub const MAX_NAMESPACE_LEN: usize = u16::MAX as usize;

impl WALRecord {
    /// Create a Put record.
    pub fn put(namespace: &str, key: Vec<u8>, value: Vec<u8>) -> Self {
        WALRecord {
            record_type: RecordType::Put,
            namespace: namespace.to_owned(),
            key,
            value,
        }
    }

    /// Create a Delete record.
    pub fn delete(namespace: &str, key: Vec<u8>) -> Self {
        WALRecord {
            record_type: RecordType::Delete,
            namespace: namespace.to_owned(),
            key,
            value: Vec::new(),
        }
    }

    /// Create a record that makes an empty namespace.
    pub fn create_namespace(namespace: &str) -> Self {
        WALRecord {
            record_type: RecordType::CreateNamespace,
            namespace: namespace.to_owned(),
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Create a record that removes a namespace and its keys.
    pub fn drop_namespace(namespace: &str) -> Self {
        WALRecord {
            record_type: RecordType::DropNamespace,
            namespace: namespace.to_owned(),
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Create the marker that closes a transaction.
    pub fn commit() -> Self {
        WALRecord {
            record_type: RecordType::Commit,
            namespace: String::new(),
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Serialize this record to bytes (including CRC header).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_size());
        self.encode_into(&mut buf);
        buf
    }

    /// Append the serialized record to `buf`. Used to build a whole
    /// transaction as one contiguous write.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        let start = buf.len();
        let payload_len = self.encoded_size() - CRC_SIZE - LEN_SIZE;

        // Reserve space for CRC (we'll fill it at the end)
        buf.extend_from_slice(&[0u8; CRC_SIZE]);

        // Length (of everything after CRC and Length fields)
        buf.extend_from_slice(&(payload_len as u32).to_le_bytes());

        buf.push(self.record_type as u8);

        buf.extend_from_slice(&(self.namespace.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.namespace.as_bytes());

        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.key);

        buf.extend_from_slice(&self.value);

        // Compute CRC over everything after CRC field
        let crc = crc32fast::hash(&buf[start + CRC_SIZE..]);
        buf[start..start + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    }

    /// Deserialize a record from bytes. Returns error if CRC doesn't match.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("record too short".into()));
        }

        let stored_crc = read_u32(data, 0)?;
        let payload_len = read_u32(data, CRC_SIZE)? as usize;

        let total_len = CRC_SIZE + LEN_SIZE + payload_len;
        if payload_len < HEADER_SIZE - CRC_SIZE - LEN_SIZE || data.len() < total_len {
            return Err(Error::Corruption("record truncated".into()));
        }

        let computed_crc = crc32fast::hash(&data[CRC_SIZE..total_len]);
        if stored_crc != computed_crc {
            return Err(Error::Corruption("CRC mismatch".into()));
        }

        let mut offset = CRC_SIZE + LEN_SIZE;

        let record_type = RecordType::from_u8(data[offset])?;
        offset += TYPE_SIZE;

        let ns_len = u16::from_le_bytes([data[offset], data[offset + 1]]) as usize;
        offset += NS_LEN_SIZE;
        if offset + ns_len + KEY_LEN_SIZE > total_len {
            return Err(Error::Corruption("namespace length exceeds record".into()));
        }
        let namespace = std::str::from_utf8(&data[offset..offset + ns_len])
            .map_err(|e| Error::Corruption(format!("namespace is not utf-8: {e}")))?
            .to_owned();
        offset += ns_len;

        let key_len = read_u32(data, offset)? as usize;
        offset += KEY_LEN_SIZE;
        if offset + key_len > total_len {
            return Err(Error::Corruption("key length exceeds record".into()));
        }
        let key = data[offset..offset + key_len].to_vec();
        offset += key_len;

        // Value (rest of the record)
        let value = data[offset..total_len].to_vec();

        Ok(WALRecord {
            record_type,
            namespace,
            key,
            value,
        })
    }

    /// Size of this record when serialized on disk.
    pub fn encoded_size(&self) -> usize {
        HEADER_SIZE + self.namespace.len() + self.key.len() + self.value.len()
    }
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::Corruption("record truncated".into()))
}

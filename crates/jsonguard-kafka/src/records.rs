use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{KafkaError, Result};

/// Fixed part of an encoded record: offset (8) + key length (4) +
/// value length (4) + header count (2).
pub const RECORD_OVERHEAD: usize = 18;

const NULL_LENGTH: i32 = -1;

/// A single record header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: String,
    pub value: Option<Bytes>,
}

impl RecordHeader {
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// One record of a partition's record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: i64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub headers: Vec<RecordHeader>,
}

impl Record {
    pub fn new(offset: i64, value: impl Into<Bytes>) -> Self {
        Self {
            offset,
            key: None,
            value: Some(value.into()),
            headers: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_header(mut self, header: RecordHeader) -> Self {
        self.headers.push(header);
        self
    }
}

/// An encoded record set, as carried by produce requests and fetch responses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryRecords(Bytes);

impl MemoryRecords {
    /// The empty record set.
    pub const EMPTY: Self = Self(Bytes::new());

    /// Wrap an already encoded record set.
    pub fn readable(buffer: impl Into<Bytes>) -> Self {
        Self(buffer.into())
    }

    /// Encode `records` into a new record set.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Self> {
        let mut buf = BytesMut::new();
        for record in records {
            encode_record(record, &mut buf)?;
        }
        Ok(Self(buf.freeze()))
    }

    /// Decode every record in the set.
    pub fn records(&self) -> Result<Vec<Record>> {
        let mut src = self.0.clone();
        let mut records = Vec::new();
        while src.has_remaining() {
            records.push(decode_record(&mut src)?);
        }
        Ok(records)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn buffer(&self) -> &Bytes {
        &self.0
    }
}

/// Encode a record into the record-set wire format.
///
/// Wire format (big-endian):
/// ```text
/// ┌─────────────┬──────────────┬───────┬──────────────┬───────┬──────────────┬─────────┐
/// │ Offset (8B) │ Key len (4B) │ Key   │ Val len (4B) │ Value │ Headers (2B) │ Headers │
/// └─────────────┴──────────────┴───────┴──────────────┴───────┴──────────────┴─────────┘
/// ```
/// A length of -1 marks a null key or value. Each header is a 2-byte key
/// length, the UTF-8 key, then a 4-byte value length and the value.
pub fn encode_record(record: &Record, dst: &mut BytesMut) -> Result<()> {
    if record.headers.len() > u16::MAX as usize {
        return Err(KafkaError::FieldTooLarge {
            field: "header count",
            size: record.headers.len(),
            max: u16::MAX as usize,
        });
    }

    dst.reserve(RECORD_OVERHEAD);
    dst.put_i64(record.offset);
    put_nullable(dst, "record key", record.key.as_deref())?;
    put_nullable(dst, "record value", record.value.as_deref())?;
    dst.put_u16(record.headers.len() as u16);

    for header in &record.headers {
        if header.key.len() > u16::MAX as usize {
            return Err(KafkaError::FieldTooLarge {
                field: "header key",
                size: header.key.len(),
                max: u16::MAX as usize,
            });
        }
        dst.put_u16(header.key.len() as u16);
        dst.put_slice(header.key.as_bytes());
        put_nullable(dst, "header value", header.value.as_deref())?;
    }
    Ok(())
}

/// Decode one record, consuming its bytes from `src`.
///
/// Unlike a stream decoder the whole set is in memory, so a short buffer is
/// an error rather than a request for more data.
pub fn decode_record(src: &mut Bytes) -> Result<Record> {
    ensure(src, 8)?;
    let offset = src.get_i64();
    let key = get_nullable(src, "record key")?;
    let value = get_nullable(src, "record value")?;

    ensure(src, 2)?;
    let header_count = src.get_u16() as usize;
    let mut headers = Vec::with_capacity(header_count);
    for _ in 0..header_count {
        ensure(src, 2)?;
        let key_len = src.get_u16() as usize;
        ensure(src, key_len)?;
        let key = String::from_utf8(src.split_to(key_len).to_vec())
            .map_err(|_| KafkaError::InvalidHeaderKey)?;
        let value = get_nullable(src, "header value")?;
        headers.push(RecordHeader { key, value });
    }

    Ok(Record {
        offset,
        key,
        value,
        headers,
    })
}

fn put_nullable(dst: &mut BytesMut, field: &'static str, value: Option<&[u8]>) -> Result<()> {
    match value {
        None => dst.put_i32(NULL_LENGTH),
        Some(bytes) => {
            if bytes.len() > i32::MAX as usize {
                return Err(KafkaError::FieldTooLarge {
                    field,
                    size: bytes.len(),
                    max: i32::MAX as usize,
                });
            }
            dst.put_i32(bytes.len() as i32);
            dst.put_slice(bytes);
        }
    }
    Ok(())
}

fn get_nullable(src: &mut Bytes, field: &'static str) -> Result<Option<Bytes>> {
    ensure(src, 4)?;
    let length = src.get_i32();
    if length == NULL_LENGTH {
        return Ok(None);
    }
    if length < 0 {
        return Err(KafkaError::InvalidLength { field, length });
    }
    let length = length as usize;
    ensure(src, length)?;
    Ok(Some(src.split_to(length)))
}

fn ensure(src: &Bytes, needed: usize) -> Result<()> {
    if src.remaining() < needed {
        return Err(KafkaError::Truncated {
            needed,
            available: src.remaining(),
        });
    }
    Ok(())
}

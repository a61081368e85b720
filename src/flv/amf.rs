//! Action-Script value parsing (AMF0), as embedded in FLV `onMetaData` script tags.

/// Errors produced while parsing Action-Script values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Ran out of input before a value finished parsing.
    #[error("attempted to read {requested} bytes with only {available} remaining")]
    DomainOverrun {
        /// Bytes requested.
        requested: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// An Action-Script value type marker this parser doesn't recognise.
    #[error("unknown Action-Script value type {0}")]
    UnknownType(u8),
}

/// A parsed Action-Script value (AMF0 typed value).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
    /// A short (u16-length-prefixed) string.
    String(String),
    /// An anonymous object: key/value pairs terminated by an empty-key end marker.
    Object(Vec<(String, Value)>),
    /// An ECMA array: a u32 approximate-count followed by the same key/value encoding as `Object`.
    EcmaArray(Vec<(String, Value)>),
    /// A strict array, as actually encoded by the source implementation: a u32 count of
    /// (string, value) pairs, not of bare values.
    StrictArray(Vec<(String, Value)>),
    /// The ActionScript `null`/`undefined` values, which this parser does not distinguish.
    Null,
    /// A date, stored as milliseconds since the Unix epoch and a timezone offset in minutes.
    Date {
        /// Milliseconds since the Unix epoch.
        timestamp_ms: f64,
        /// Timezone offset in minutes.
        timezone_offset: i16,
    },
    /// A long (u32-length-prefixed) string.
    LongString(String),
    /// The object/array terminator value; never produced at the top level.
    EndMarker,
}

struct Parser<'a> {
    buf: &'a [u8],
}

impl<'a> Parser<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if n > self.buf.len() {
            return Err(Error::DomainOverrun {
                requested: n,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes: [u8; 2] = self.take(2)?.try_into().expect("take(2) yields 2 bytes");
        Ok(u16::from_be_bytes(bytes))
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("take(4) yields 4 bytes");
        Ok(u32::from_be_bytes(bytes))
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("take(8) yields 8 bytes");
        Ok(f64::from_be_bytes(bytes))
    }

    fn read_binary(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u16()? as usize;
        self.take(len)
    }

    fn read_string(&mut self) -> Result<String, Error> {
        let bytes = self.read_binary()?;
        let trimmed = match bytes.iter().rposition(|b| *b != 0) {
            Some(last) => &bytes[..=last],
            None => &bytes[..0],
        };
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }

    fn read_long_string(&mut self) -> Result<String, Error> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_key_value(&mut self) -> Result<(String, Value), Error> {
        let key = self.read_string()?;
        let value = self.read_value()?;
        Ok((key, value))
    }

    /// Reads key/value pairs until the end marker (empty key followed by an
    /// `EndMarker` value), as used by both `Object` and `EcmaArray`.
    fn read_terminated_pairs(&mut self) -> Result<Vec<(String, Value)>, Error> {
        let mut entries = Vec::new();
        loop {
            let (key, value) = self.read_key_value()?;
            if key.is_empty() && matches!(value, Value::EndMarker) {
                break;
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    fn read_value(&mut self) -> Result<Value, Error> {
        let type_marker = self.read_u8()?;
        Ok(match type_marker {
            0 => Value::Number(self.read_f64()?),
            1 => Value::Boolean(self.read_u8()? != 0),
            2 => Value::String(self.read_string()?),
            3 => Value::Object(self.read_terminated_pairs()?),
            4 => Value::String(String::from_utf8_lossy(self.read_binary()?).into_owned()),
            5 | 6 => Value::Null,
            8 => {
                self.take(4)?; // approximate ECMA array length, unused
                Value::EcmaArray(self.read_terminated_pairs()?)
            }
            9 => Value::EndMarker,
            10 => {
                let len = self.read_u32()? as usize;
                let mut entries = Vec::with_capacity(len);
                for _ in 0..len {
                    entries.push(self.read_key_value()?);
                }
                Value::StrictArray(entries)
            }
            11 => {
                let timestamp_ms = self.read_f64()? / 1000.0;
                let timezone_offset = self.read_u16()? as i16;
                Value::Date {
                    timestamp_ms,
                    timezone_offset,
                }
            }
            12 => Value::LongString(self.read_long_string()?),
            other => return Err(Error::UnknownType(other)),
        })
    }
}

/// Parses exactly two top-level Action-Script values out of `buf` and returns them as a
/// `(key, value)` pair.
///
/// FLV script tags are nominally a single typed value, but in practice every encoder emits
/// a bare string followed by the actual payload value with no enclosing structure; reading
/// exactly two top-level values (rather than trying to parse a single self-describing tree)
/// is the only heuristic that survives real-world files.
pub fn parse_script_data(buf: &[u8]) -> Result<(Value, Value), Error> {
    let mut parser = Parser { buf };
    let key = parser.read_value()?;
    let value = parser.read_value()?;
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_on_metadata_shape() {
        let mut buf = Vec::new();
        buf.push(2); // string marker
        buf.extend_from_slice(&10u16.to_be_bytes());
        buf.extend_from_slice(b"onMetaData");
        buf.push(8); // ecmaarray marker
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.push(2); // key "duration"
        buf.extend_from_slice(&8u16.to_be_bytes());
        buf.extend_from_slice(b"duration");
        buf.push(0); // number
        buf.extend_from_slice(&12.5f64.to_be_bytes());
        buf.push(0); // end-marker key (empty string)
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.push(9); // end marker value

        let (key, value) = parse_script_data(&buf).unwrap();
        assert_eq!(key, Value::String("onMetaData".to_string()));
        match value {
            Value::EcmaArray(entries) => {
                assert_eq!(entries, vec![("duration".to_string(), Value::Number(12.5))]);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn domain_overrun_is_reported() {
        let buf = [2u8, 0, 10]; // claims a 10-byte string but supplies none
        assert!(matches!(
            parse_script_data(&buf),
            Err(Error::DomainOverrun { .. })
        ));
    }
}

// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

/// Arrays nested deeper than this are rejected, parsing recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("protocol error; unsupported frame data type: {:?}", as_char(.0))]
    UnsupportedType(u8),
    #[error("protocol error; invalid length {0:?}")]
    MalformedLength(String),
    #[error("protocol error; invalid integer {0:?}")]
    InvalidInteger(String),
    /// A bulk string body was not followed by CRLF.
    #[error("protocol error; bulk string is not terminated by CRLF")]
    InvalidTerminator,
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUtf8,
    #[error("protocol error; arrays nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// The null bulk string, used to signal the absence of a value.
    Null,
    Array(Vec<Frame>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Parses exactly one frame starting at the cursor position, leaving the cursor right after it.
    ///
    /// Returns `Error::Incomplete` when the buffer ends before the frame does, in which case the
    /// cursor position is meaningless and the caller must retry once more data is buffered.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_nested(src, 0)
    }

    fn parse_nested(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let line = get_line(src)?;
                let integer = std::str::from_utf8(line)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| Error::InvalidInteger(lossy(line)))?;

                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = match get_length(src)? {
                    Some(length) => length,
                    None => return Ok(Frame::Null),
                };

                // The body is length-delimited, it may contain CRLF sequences itself.
                let data = get_exact(src, length)?;
                let data = Bytes::copy_from_slice(data);
                skip_crlf(src)?;

                Ok(Frame::Bulk(data))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = match get_length(src)? {
                    Some(length) => length,
                    None => return Ok(Frame::Null),
                };

                if depth >= MAX_NESTING_DEPTH {
                    return Err(Error::TooDeep {
                        limit: MAX_NESTING_DEPTH,
                    });
                }

                // Every element takes at least one byte, so never trust the announced length
                // beyond what is already buffered.
                let mut frames = Vec::with_capacity(length.min(src.remaining()));
                for _ in 0..length {
                    let frame = Self::parse_nested(src, depth + 1)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let integer = i.to_string();
                let mut bytes = Vec::with_capacity(1 + integer.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(integer.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(bytes) => {
                let length_str = bytes.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + bytes.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(bytes);
                result.extend_from_slice(CRLF);
                result
            }
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn as_char(byte: &u8) -> char {
    char::from(*byte)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Returns the bytes up to the next CRLF and moves the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();
    let rest = buf.get(start..).ok_or(Error::Incomplete)?;

    let line_end = rest
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)?;

    src.set_position((start + line_end + CRLF.len()) as u64);

    Ok(&rest[..line_end])
}

/// Reads a length header. `-1` stands for a null value and is returned as `None`.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    let line = get_line(src)?;
    let length = std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Error::MalformedLength(lossy(line)))?;

    match length {
        -1 => Ok(None),
        length if length < -1 => Err(Error::MalformedLength(lossy(line))),
        length => usize::try_from(length)
            .map(Some)
            .map_err(|_| Error::MalformedLength(lossy(line))),
    }
}

fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], Error> {
    if src.remaining() < len {
        return Err(Error::Incomplete);
    }

    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();
    src.advance(len);

    Ok(&buf[start..start + len])
}

fn skip_crlf(src: &mut Cursor<&[u8]>) -> Result<(), Error> {
    if src.remaining() < CRLF.len() {
        return Err(Error::Incomplete);
    }
    if src.chunk()[..CRLF.len()] != CRLF[..] {
        return Err(Error::InvalidTerminator);
    }
    src.advance(CRLF.len());
    Ok(())
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    BulkString,   // '$'
    SimpleError,  // '-'
    Integer,      // ':'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::UnsupportedType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        Error::InvalidUtf8
    }
}

use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};

pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] frame::Error),
    /// The peer closed the stream in the middle of a frame. A close on a frame boundary is a
    /// regular disconnect and is not reported as an error.
    #[error("protocol error; stream closed with {remaining} bytes of an incomplete frame")]
    Truncated { remaining: usize },
    #[error("frame size {size} exceeds limit of {limit} bytes")]
    FrameTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Splits a byte stream into [`Frame`]s and writes frames back as bytes.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data to parse a frame. Refuse to keep buffering past the limit so a
            // single client cannot make the server allocate without bound.
            Err(frame::Error::Incomplete) if src.len() > self.max_frame_size => {
                return Err(Error::FrameTooLarge {
                    size: src.len(),
                    limit: self.max_frame_size,
                })
            }
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // The cursor walks an in-memory slice, so its position always fits a usize.
        let position = cursor.position() as usize;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(Error::Truncated {
                remaining: src.len(),
            }),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

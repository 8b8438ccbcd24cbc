use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::{self, FrameCodec};
use crate::frame::Frame;

pub struct Connection {
    pub id: Uuid,
    pub client_address: SocketAddr,
    // Data is read from the socket into the codec read buffer. When a frame is parsed, the
    // corresponding data is removed from the buffer.
    frames: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, client_address: SocketAddr) -> Connection {
        Self::with_codec(stream, client_address, FrameCodec::default())
    }

    pub fn with_codec(
        stream: TcpStream,
        client_address: SocketAddr,
        codec: FrameCodec,
    ) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            client_address,
            // Allocate the buffer with 4kb of capacity.
            frames: Framed::with_capacity(stream, codec, 4096),
        }
    }

    /// Waits for the next frame. `None` means the client closed the connection between two
    /// frames, closing it halfway through a frame is reported as `codec::Error::Truncated`.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, codec::Error> {
        self.frames.next().await.transpose()
    }

    /// Writes a frame and flushes it to the socket.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), codec::Error> {
        self.frames.send(frame).await
    }
}

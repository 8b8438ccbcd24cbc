use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument, warn};

use crate::codec::{self, FrameCodec};
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(config.addr()).await?;
    let store = Store::new();

    serve(listener, store, FrameCodec::new(config.max_frame_size)).await
}

/// Accepts connections on `listener` forever, serving each one on its own task against the
/// shared `store`.
pub async fn serve(listener: TcpListener, store: Store, codec: FrameCodec) -> Result<(), Error> {
    info!("Redis server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        let store = store.clone();
        let codec = codec.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store, codec).await {
                error!("Connection failed: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip_all,
    fields(connection_id, client_address = %client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
    codec: FrameCodec,
) -> Result<(), Error> {
    let mut conn = Connection::with_codec(stream, client_address, codec);

    tracing::Span::current().record("connection_id", tracing::field::display(conn.id));
    info!("Client connected");

    loop {
        let frame = match conn.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(codec::Error::Io(e)) => return Err(e.into()),
            // There is no way to find the start of the next frame, so the connection is dropped.
            Err(e) => {
                warn!("Closing connection after protocol error: {}", e);
                return Ok(());
            }
        };
        debug!("Received frame from client: {}", frame);

        let (res, quit) = match Command::try_from(frame) {
            Ok(cmd) => {
                let quit = cmd.is_quit();
                (cmd.exec(store.clone())?, quit)
            }
            Err(e) => {
                debug!("Rejected command: {}", e);
                (Frame::from(e), false)
            }
        };

        debug!("Sending response to client: {}", res);
        conn.write_frame(res).await?;

        if quit {
            info!("Client quit");
            return Ok(());
        }
    }

    info!("Client disconnected");
    Ok(())
}

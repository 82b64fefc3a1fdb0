//! Per-connection read and write loops.

use crate::dispatch::HandlerInvoker;
use crate::error::DispatchError;
use crate::packets::decode_frame;
use crate::session::SessionManager;
use orvane_event_system::DisconnectReason;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

/// Upper bound on one frame body. A length prefix past this is a corrupt or
/// hostile stream, not a real packet.
const MAX_FRAME_BYTES: usize = 1 << 20;

/// Drives one client connection to completion.
///
/// Registers the session, splits the socket into a reader loop (frames in,
/// dispatched through the invoker) and a writer task (bytes queued by
/// [`ClientSession::send`](crate::session::ClientSession::send) out), and
/// retires the session through the manager whichever side ends first.
pub async fn run_connection(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<SessionManager>,
    invoker: Arc<HandlerInvoker>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();
    let session = sessions.accept(addr, outbound_tx);

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            // Close sentinel from a server-side disconnect.
            if bytes.is_empty() {
                let _ = writer.shutdown().await;
                break;
            }
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }
    });

    let reason = loop {
        let mut length_buf = [0u8; 4];
        match reader.read_exact(&mut length_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                break DisconnectReason::ClientDisconnect;
            }
            Err(e) => {
                debug!("Read error on session {}: {}", session.id(), e);
                break DisconnectReason::TransportError;
            }
        }

        let length = u32::from_le_bytes(length_buf) as usize;
        if length > MAX_FRAME_BYTES {
            warn!(
                "{} sent an oversized frame ({} bytes), kicking",
                session, length
            );
            break DisconnectReason::ServerKick;
        }

        let mut payload = vec![0u8; length];
        if reader.read_exact(&mut payload).await.is_err() {
            break DisconnectReason::TransportError;
        }

        let frame = match decode_frame(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{} sent a malformed frame, kicking: {}", session, e);
                break DisconnectReason::ServerKick;
            }
        };

        if let Err(e) = invoker.dispatch_packet(session.clone(), &frame).await {
            match e {
                // A contract violation means a handler is registered against
                // the wrong type; the client is not at fault, so the session
                // survives while the defect is loud in the logs.
                DispatchError::Contract(_) => {
                    error!("❌ Dispatch contract violation on {}: {}", session, e);
                }
                DispatchError::Handler(_) => {
                    error!("❌ Packet handler failed for {}: {}", session, e);
                }
            }
        }
    };

    sessions.disconnect(session.id(), reason).await;
    writer_task.abort();
}

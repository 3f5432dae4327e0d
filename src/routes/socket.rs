//! Length-prefixed TCP transport
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of
//! UTF-8 JSON. A connection carries any number of request frames, each answered
//! by exactly one response frame, until the client closes it.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::core::{MatchError, Matcher};
use crate::models::{ErrorResponse, MatchRequest};

/// Read one frame; `Ok(None)` on a clean EOF before the length prefix
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };

    if len > max_frame_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit of {}", len, max_frame_bytes),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large for length prefix"))?;
    writer.write_u32(len).await?;
    writer.write_all(payload).await?;
    writer.flush().await
}

/// Accept connections forever, one task per client
pub async fn serve(listener: TcpListener, matcher: Arc<Matcher>, max_frame_bytes: usize) -> io::Result<()> {
    info!("Socket transport listening on {}", listener.local_addr()?);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let matcher = Arc::clone(&matcher);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, peer, matcher, max_frame_bytes).await {
                        warn!("Connection {} closed with error: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    matcher: Arc<Matcher>,
    max_frame_bytes: usize,
) -> io::Result<()> {
    info!("Accepted connection from {}", peer);
    let (mut reader, mut writer) = stream.into_split();

    while let Some(payload) = read_frame(&mut reader, max_frame_bytes).await? {
        debug!("Received {} byte frame from {}", payload.len(), peer);

        let span = tracing::info_span!("match_request", request_id = %Uuid::new_v4(), %peer);
        let matched = handle_frame(&matcher, &payload).instrument(span);

        // Dropping the match future abandons every judge call still in flight
        let response = tokio::select! {
            response = matched => response,
            _ = closed(&mut reader) => {
                info!("Connection from {} closed mid-request, abandoning match", peer);
                return Ok(());
            }
        };
        write_frame(&mut writer, &response).await?;
    }

    info!("Connection from {} closed by client", peer);
    Ok(())
}

/// Resolves once the peer has closed its side of the connection
///
/// Bytes of a pipelined next frame are only peeked, never consumed; while they
/// are pending the peer is still connected.
async fn closed(reader: &mut OwnedReadHalf) -> io::Result<()> {
    let mut next = [0u8; 1];
    if reader.peek(&mut next).await? == 0 {
        return Ok(());
    }
    std::future::pending().await
}

/// Decode, match and encode a single request frame
pub async fn handle_frame(matcher: &Matcher, payload: &[u8]) -> Vec<u8> {
    let body = match serde_json::from_slice::<MatchRequest>(payload) {
        Ok(request) => match matcher.match_request(&request).await {
            Ok(response) => serde_json::to_vec(&response),
            Err(e) => {
                match &e {
                    MatchError::Validation(_) => info!("Rejected match request: {}", e),
                    _ => error!("Match failed: {}", e),
                }
                serde_json::to_vec(&e.to_error_response())
            }
        },
        Err(e) => {
            warn!("Failed to decode request frame: {}", e);
            serde_json::to_vec(&ErrorResponse {
                error: "invalid_json".to_string(),
                message: format!("Invalid JSON: {}", e),
                status_code: 400,
                category: None,
            })
        }
    };

    body.unwrap_or_else(|e| {
        error!("Failed to encode response frame: {}", e);
        br#"{"error":"internal","message":"failed to encode response","status_code":500}"#.to_vec()
    })
}

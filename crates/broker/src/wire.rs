//! Socket-level framing helpers
//!
//! Frames and the subscriber's topic handshake are length-prefixed:
//! `[4-byte big-endian length][payload]`.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use courier_protocol::{ProtocolError, PushFrame, MAX_FRAME_LEN};

use crate::error::Result;

/// Read one frame; `Ok(None)` on clean EOF
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Option<PushFrame>>
where
    R: AsyncRead + Unpin,
{
    let Some(body) = read_prefixed(reader).await? else {
        return Ok(None);
    };
    Ok(Some(PushFrame::decode(body)?))
}

/// Write one encoded frame
pub(crate) async fn write_frame<W>(writer: &mut W, frame: &PushFrame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.encode()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the subscriber's topic filter handshake; `Ok(None)` on clean EOF
pub(crate) async fn read_topic<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let Some(body) = read_prefixed(reader).await? else {
        return Ok(None);
    };
    let topic = String::from_utf8(body.to_vec())
        .map_err(|e| ProtocolError::Codec(format!("topic not UTF-8: {e}")))?;
    Ok(Some(topic))
}

/// Write the subscriber's topic filter handshake
pub(crate) async fn write_topic<W>(writer: &mut W, topic: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&(topic.len() as u32).to_be_bytes()).await?;
    writer.write_all(topic.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_prefixed<R>(reader: &mut R) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_LEN,
        }
        .into());
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(Bytes::from(body)))
}

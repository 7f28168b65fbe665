//! Bounded request body reader

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

use contracts::PayloadError;

const INITIAL_CAPACITY: usize = 8 * 1024;

/// Read `reader` to EOF, failing once more than `limit` bytes arrive.
#[instrument(name = "dispatcher_read_body", skip(reader))]
pub async fn read_body<R>(reader: R, limit: usize) -> Result<Bytes, PayloadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(limit.min(INITIAL_CAPACITY));
    // One byte past the limit is enough to detect an oversize body
    let mut reader = reader.take(limit as u64 + 1);

    loop {
        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            break;
        }
        if buf.len() > limit {
            return Err(PayloadError::TooLarge { limit });
        }
    }

    debug!(bytes = buf.len(), "Request body read");
    Ok(buf.freeze())
}

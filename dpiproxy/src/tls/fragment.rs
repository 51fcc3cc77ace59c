//! ClientHello fragmentation.
//!
//! Splits the raw bytes of a ClientHello record (header and payload
//! together) into chunks that get written to the upstream socket one at a
//! time, so the kernel typically emits each chunk as its own TCP segment.
//! This is the only place fragmentation is applied; everything else on the
//! wire goes through the pipe untouched.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::RelayError;

/// Partition `data` into the chunks that `write_fragmented` would write,
/// without performing any I/O. Exposed separately so the partitioning
/// logic can be tested without a socket.
///
/// `window_size <= 0` selects the legacy 1/N split: one chunk holding just
/// `data[0]`, one chunk holding the rest. `data.len() <= 1` degenerates to
/// a single chunk, since there's no second byte to split off.
pub fn fragment_chunks(data: &[u8], window_size: i64) -> Vec<&[u8]> {
    if window_size <= 0 {
        if data.len() <= 1 {
            return vec![data];
        }
        return vec![&data[..1], &data[1..]];
    }

    let window = window_size as usize;
    if data.is_empty() {
        return vec![data];
    }

    data.chunks(window).collect()
}

/// Write `data` to `writer` as a sequence of individual `write` calls per
/// `fragment_chunks(data, window_size)`.
pub async fn write_fragmented<W>(
    writer: &mut W,
    data: &[u8],
    window_size: i64,
) -> Result<(), RelayError>
where
    W: AsyncWrite + Unpin,
{
    for chunk in fragment_chunks(data, window_size) {
        writer
            .write_all(chunk)
            .await
            .map_err(|e| RelayError::new("client->upstream", &e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_chunks_partition_exactly() {
        let data: Vec<u8> = (0..=255u8).collect();
        let window = 7i64;
        let chunks = fragment_chunks(&data, window);
        let rejoined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(rejoined, data);

        let (last, rest) = chunks.split_last().unwrap();
        for chunk in rest {
            assert_eq!(chunk.len(), window as usize);
        }
        let expected_last_len = ((data.len() - 1) % window as usize) + 1;
        assert_eq!(last.len(), expected_last_len);
    }

    #[test]
    fn legacy_split_on_long_data() {
        let data = [1u8, 2, 3, 4];
        let chunks = fragment_chunks(&data, 0);
        assert_eq!(chunks, vec![&data[0..1], &data[1..4]]);
    }

    #[test]
    fn legacy_split_on_negative_window() {
        let data = [1u8, 2, 3];
        let chunks = fragment_chunks(&data, -5);
        assert_eq!(chunks, vec![&data[0..1], &data[1..3]]);
    }

    #[test]
    fn legacy_split_single_byte_is_one_chunk() {
        let data = [9u8];
        let chunks = fragment_chunks(&data, 0);
        assert_eq!(chunks, vec![&data[..]]);
    }

    #[test]
    fn legacy_split_empty_is_one_chunk() {
        let data: [u8; 0] = [];
        let chunks = fragment_chunks(&data, 0);
        assert_eq!(chunks, vec![&data[..]]);
    }

    #[tokio::test]
    async fn write_fragmented_emits_every_chunk() {
        let data = [1u8, 2, 3, 4, 5];
        let mut out = Vec::new();
        write_fragmented(&mut out, &data, 2).await.unwrap();
        assert_eq!(out, data);
    }
}

//! Splitting file bytes into chunks for a [`FileTransfer`] and putting them back
//! together on the receiving side.

use crate::error::{ProtocolError, Result};
use crate::protocol::message::{FileChunk, FileTransfer};
use tracing::{debug, warn};

/// Slice `bytes` into the chunks announced by `transfer`.
///
/// Each chunk carries its own SHA-256 checksum and the final chunk is flagged
/// `isLast`. An empty file yields no chunks.
pub fn split_into_chunks(transfer: &FileTransfer, bytes: &[u8]) -> Result<Vec<FileChunk>> {
    if bytes.len() as u64 != transfer.file_size {
        return Err(ProtocolError::Schema(format!(
            "file {} announced {} bytes but {} were supplied",
            transfer.file_id,
            transfer.file_size,
            bytes.len()
        )));
    }
    if transfer.chunk_size == 0 {
        return Err(ProtocolError::Schema(format!(
            "file {} has a zero chunk size",
            transfer.file_id
        )));
    }

    let chunk_size = transfer.chunk_size as usize;
    let count = bytes.chunks(chunk_size).len();
    let chunks: Vec<FileChunk> = bytes
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, slice)| {
            FileChunk::new(
                transfer.file_id.clone(),
                index as u64,
                slice.to_vec(),
                index + 1 == count,
            )
        })
        .collect();

    debug!(file_id = %transfer.file_id, chunks = chunks.len(), "split file into chunks");
    Ok(chunks)
}

/// Reassemble the file bytes for `transfer` from `chunks`, in any order.
///
/// All-or-nothing: exactly `totalChunks` chunks for this `fileId`, indices
/// `0..totalChunks` each present once, every checksum valid, and the total length
/// equal to `fileSize`. Any defect fails the whole assembly.
pub fn assemble_chunks(transfer: &FileTransfer, chunks: &[FileChunk]) -> Result<Vec<u8>> {
    if chunks.len() as u64 != transfer.total_chunks {
        warn!(
            file_id = %transfer.file_id,
            expected = transfer.total_chunks,
            got = chunks.len(),
            "chunk count mismatch"
        );
        return Err(ProtocolError::Schema(format!(
            "expected {} chunks for file {}, got {}",
            transfer.total_chunks,
            transfer.file_id,
            chunks.len()
        )));
    }

    let mut ordered: Vec<Option<&FileChunk>> = vec![None; chunks.len()];
    for chunk in chunks {
        if chunk.file_id != transfer.file_id {
            return Err(ProtocolError::Schema(format!(
                "chunk {} belongs to file {}, not {}",
                chunk.chunk_index, chunk.file_id, transfer.file_id
            )));
        }
        let slot = usize::try_from(chunk.chunk_index)
            .ok()
            .and_then(|index| ordered.get_mut(index))
            .ok_or_else(|| {
                ProtocolError::Schema(format!("chunk index {} out of range", chunk.chunk_index))
            })?;
        if slot.is_some() {
            return Err(ProtocolError::Schema(format!(
                "duplicate chunk index {}",
                chunk.chunk_index
            )));
        }
        chunk.verify()?;
        *slot = Some(chunk);
    }

    let mut out = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
    // every slot is filled: count matched and no index repeated
    for chunk in ordered.into_iter().flatten() {
        out.extend_from_slice(&chunk.data);
    }

    if out.len() as u64 != transfer.file_size {
        return Err(ProtocolError::Schema(format!(
            "assembled {} bytes for file {}, expected {}",
            out.len(),
            transfer.file_id,
            transfer.file_size
        )));
    }

    debug!(file_id = %transfer.file_id, bytes = out.len(), "assembled file");
    Ok(out)
}

//! Chunked transport codec (§4.1).
//!
//! Two wire framings share one constrained-MTU link:
//!
//! - **Per-chunk framing**: every fragment carries a 4-byte header
//!   `{seq_no: u16 BE, total_chunks: u16 BE}` followed by up to `mtu - 4`
//!   bytes of payload. Used for request/response bodies.
//! - **Length-prefixed streaming framing**: the first fragment carries a
//!   4-byte BE total length followed by payload bytes; every following
//!   fragment is raw payload with no header. Used for `task_response`
//!   notification streams (§4.4).
//!
//! Both are implemented here because §4.1 requires both to be supported by
//! the same transport.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("payload too large for u16 chunk count at this MTU")]
    PayloadTooLarge,
    #[error("MTU too small to carry the chunk header")]
    MtuTooSmall,
    #[error("chunk shorter than the 4-byte frame header")]
    ChunkTooShort,
    #[error("reassembly diverged: logical message dropped")]
    ReassemblyDiverged,
}

const HEADER_LEN: usize = 4;

// ── Per-chunk framing ─────────────────────────────────────────────────────────

/// Split `payload` into MTU-bounded fragments, each carrying a 4-byte
/// `{seq_no, total_chunks}` header.
pub fn encode_chunked(payload: &[u8], mtu: usize) -> Result<Vec<Vec<u8>>, ChunkError> {
    if mtu <= HEADER_LEN {
        return Err(ChunkError::MtuTooSmall);
    }
    let data_size = mtu - HEADER_LEN;
    let total_chunks = payload.len().div_ceil(data_size).max(1);
    if total_chunks > u16::MAX as usize {
        return Err(ChunkError::PayloadTooLarge);
    }

    let mut out = Vec::with_capacity(total_chunks);
    for (seq_no, data) in payload.chunks(data_size).enumerate() {
        let mut frame = Vec::with_capacity(HEADER_LEN + data.len());
        frame.extend_from_slice(&(seq_no as u16).to_be_bytes());
        frame.extend_from_slice(&(total_chunks as u16).to_be_bytes());
        frame.extend_from_slice(data);
        out.push(frame);
    }
    if out.is_empty() {
        // Zero-length payload still produces exactly one (empty) chunk.
        let mut frame = Vec::with_capacity(HEADER_LEN);
        frame.extend_from_slice(&0u16.to_be_bytes());
        frame.extend_from_slice(&1u16.to_be_bytes());
        out.push(frame);
    }
    Ok(out)
}

/// Decode the whole `payload` through `encode_chunked`/reassembly in one call
/// — used by property tests; production code uses `ChunkReassembler`.
pub fn roundtrip_chunked(payload: &[u8], mtu: usize) -> Result<Vec<u8>, ChunkError> {
    let frames = encode_chunked(payload, mtu)?;
    let mut r = ChunkReassembler::default();
    let mut out = None;
    for frame in frames {
        out = r.ingest("peer", "msg", &frame)?;
    }
    out.ok_or(ChunkError::ReassemblyDiverged)
}

#[derive(Debug, Default)]
struct ChunkBuffer {
    total_chunks: u16,
    parts: HashMap<u16, Vec<u8>>,
}

/// Reassembles per-chunk-framed fragments keyed by `(peer, logical message id)`.
#[derive(Debug, Default)]
pub struct ChunkReassembler {
    buffers: HashMap<(String, String), ChunkBuffer>,
}

impl ChunkReassembler {
    /// Feed one fragment. Returns `Ok(Some(bytes))` once the logical message
    /// is complete, `Ok(None)` while more fragments are expected.
    ///
    /// If a fragment's `total_chunks` disagrees with a previously buffered
    /// value for the same key, the entire in-progress message is dropped
    /// (§4.1 "if received chunk count diverges... drop the entire logical
    /// message") and reassembly restarts from this fragment.
    pub fn ingest(
        &mut self,
        peer: &str,
        msg_id: &str,
        frame: &[u8],
    ) -> Result<Option<Vec<u8>>, ChunkError> {
        if frame.len() < HEADER_LEN {
            return Err(ChunkError::ChunkTooShort);
        }
        let seq_no = u16::from_be_bytes([frame[0], frame[1]]);
        let total_chunks = u16::from_be_bytes([frame[2], frame[3]]);
        let data = &frame[HEADER_LEN..];

        let key = (peer.to_string(), msg_id.to_string());
        let buf = self.buffers.entry(key.clone()).or_default();

        if buf.total_chunks != 0 && buf.total_chunks != total_chunks {
            // Divergent total_chunks claim — drop and restart clean.
            self.buffers.remove(&key);
            return Err(ChunkError::ReassemblyDiverged);
        }
        buf.total_chunks = total_chunks;
        buf.parts.insert(seq_no, data.to_vec());

        if buf.parts.len() as u16 == total_chunks {
            let buf = self.buffers.remove(&key).unwrap();
            let mut out = Vec::new();
            let mut seqs: Vec<u16> = buf.parts.keys().copied().collect();
            seqs.sort_unstable();
            if seqs.len() as u16 != total_chunks || seqs != (0..total_chunks).collect::<Vec<_>>() {
                return Err(ChunkError::ReassemblyDiverged);
            }
            for s in seqs {
                out.extend_from_slice(&buf.parts[&s]);
            }
            return Ok(Some(out));
        }
        Ok(None)
    }
}

// ── Length-prefixed streaming framing ─────────────────────────────────────────

/// Split `payload` into a first length-prefixed fragment followed by raw
/// continuation fragments, per the streaming framing in §4.1.
pub fn encode_stream(payload: &[u8], mtu: usize) -> Result<Vec<Vec<u8>>, ChunkError> {
    if mtu <= HEADER_LEN {
        return Err(ChunkError::MtuTooSmall);
    }
    let first_data_size = mtu - HEADER_LEN;
    let mut out = Vec::new();

    let mut first = Vec::with_capacity(mtu);
    first.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    let first_data_len = first_data_size.min(payload.len());
    first.extend_from_slice(&payload[..first_data_len]);
    out.push(first);

    let mut offset = first_data_len;
    while offset < payload.len() {
        let end = (offset + mtu).min(payload.len());
        out.push(payload[offset..end].to_vec());
        offset = end;
    }
    Ok(out)
}

/// Reassembles length-prefixed streaming fragments keyed by `(peer, logical
/// message id)`.
#[derive(Debug, Default)]
pub struct StreamReassembler {
    buffers: HashMap<(String, String), (u32, Vec<u8>)>,
}

impl StreamReassembler {
    /// Feed one fragment. Returns `Ok(Some(bytes))` once `total_len` bytes
    /// have been accumulated.
    pub fn ingest(
        &mut self,
        peer: &str,
        msg_id: &str,
        frame: &[u8],
    ) -> Result<Option<Vec<u8>>, ChunkError> {
        let key = (peer.to_string(), msg_id.to_string());
        if !self.buffers.contains_key(&key) {
            if frame.len() < HEADER_LEN {
                return Err(ChunkError::ChunkTooShort);
            }
            let total_len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
            let data = frame[HEADER_LEN..].to_vec();
            self.buffers.insert(key.clone(), (total_len, data));
        } else {
            let entry = self.buffers.get_mut(&key).unwrap();
            entry.1.extend_from_slice(frame);
        }

        let (total_len, buf) = self.buffers.get(&key).unwrap();
        if buf.len() as u32 >= *total_len {
            let (total_len, mut buf) = self.buffers.remove(&key).unwrap();
            buf.truncate(total_len as usize);
            return Ok(Some(buf));
        }
        Ok(None)
    }
}

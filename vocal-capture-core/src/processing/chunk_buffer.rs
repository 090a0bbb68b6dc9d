/// Ordered, append-only store for encoded chunks of one recording.
///
/// Wrap in `Arc<parking_lot::Mutex<ChunkBuffer>>` to share it with the
/// recorder callback. Once sealed, appends are ignored and the sequence
/// can only be read out.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    sealed: bool,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk in arrival order.
    ///
    /// Empty chunks are skipped. Returns `false` if the buffer is sealed.
    pub fn push(&mut self, chunk: Vec<u8>) -> bool {
        if self.sealed {
            return false;
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        true
    }

    /// Freeze the sequence and hand out the chunks.
    pub fn seal(&mut self) -> Vec<Vec<u8>> {
        self.sealed = true;
        std::mem::take(&mut self.chunks)
    }
}

/// Concatenate chunks into one contiguous buffer, preserving order.
pub fn concat(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut data = Vec::with_capacity(total);
    for chunk in chunks {
        data.extend_from_slice(chunk);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_arrival_order() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1, 1]);
        buf.push(vec![2]);
        buf.push(vec![3, 3, 3]);

        let sealed = buf.seal();
        assert_eq!(sealed.len(), 3);
        assert_eq!(concat(&sealed), vec![1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn skips_empty_chunks() {
        let mut buf = ChunkBuffer::new();
        assert!(buf.push(Vec::new()));
        assert!(buf.push(vec![7]));
        assert_eq!(buf.seal(), vec![vec![7]]);
    }

    #[test]
    fn sealed_buffer_rejects_appends() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1]);
        let sealed = buf.seal();

        assert!(!buf.push(vec![2]));
        assert_eq!(sealed, vec![vec![1]]);
        assert!(buf.seal().is_empty());
    }

    #[test]
    fn concat_empty() {
        assert!(concat(&[]).is_empty());
    }
}

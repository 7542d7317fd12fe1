use checksums::strong::TruncatedMd4;
use checksums::RollingChecksum;
use control::{ControlFile, SequenceMatch};

use crate::buffer::RollingBuffer;
use crate::error::MatchError;
use crate::index::HashIndex;
use crate::sink::BlockSink;

/// Scans a seed's rolling buffer against a control file's hash index,
/// delivering verified blocks to a [`BlockSink`].
pub struct BlockMatcher<'a> {
    control: &'a ControlFile,
    index: &'a HashIndex,
}

impl<'a> BlockMatcher<'a> {
    /// Builds a matcher over a control file and its pre-built hash index.
    #[must_use]
    pub const fn new(control: &'a ControlFile, index: &'a HashIndex) -> Self {
        Self { control, index }
    }

    fn block_size(&self) -> usize {
        self.control.blocksize as usize
    }

    fn truncator(&self) -> TruncatedMd4 {
        TruncatedMd4::new(usize::from(self.control.strong_len))
    }

    fn weak_masked(&self, window: &[u8]) -> u32 {
        let mut rolling = RollingChecksum::new();
        rolling.update(window);
        rolling.masked(self.control.weak_len)
    }

    /// Examines the buffer's current window and, on a verified match, feeds
    /// the matched block(s) to `sink`.
    ///
    /// Returns the number of bytes the caller should advance the buffer by:
    /// `1` on no match, `block_size` on a single-block match, or
    /// `2 * block_size` on a verified two-block match under
    /// [`SequenceMatch::Pair`]. Returns `0` if the buffer no longer holds a
    /// full window, signalling the caller to stop scanning this seed.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, buffer, sink)))]
    pub fn step<R: std::io::Read>(
        &self,
        buffer: &mut RollingBuffer<R>,
        sink: &mut impl BlockSink,
    ) -> usize {
        let block_size = self.block_size();
        let Some(window) = buffer.window_view(block_size).map(<[u8]>::to_vec) else {
            return 0;
        };

        let weak = self.weak_masked(&window);

        if self.control.sequence_match == SequenceMatch::Pair {
            if let Some(next_window) = buffer
                .window_view(block_size * 2)
                .map(|full| full[block_size..].to_vec())
            {
                let next_weak = self.weak_masked(&next_window);
                let candidates = self.index.probe_pair(weak, next_weak);
                if !candidates.is_empty() {
                    let truncator = self.truncator();
                    let strong = truncator.digest(&window);
                    let next_strong = truncator.digest(&next_window);
                    for &k in candidates {
                        if self.control.blocks[k].strong == strong
                            && self.control.blocks[k + 1].strong == next_strong
                        {
                            sink.write_block(k, &window);
                            sink.write_block(k + 1, &next_window);
                            #[cfg(feature = "tracing")]
                            tracing::debug!(block = k, paired = true, "matcher verified block pair");
                            return block_size * 2;
                        }
                    }
                }
            }
        }

        let candidates = self.index.probe_single(weak);
        if candidates.is_empty() {
            return 1;
        }

        let strong = self.truncator().digest(&window);
        for &k in candidates {
            if self.control.blocks[k].strong == strong {
                sink.write_block(k, &window);
                #[cfg(feature = "tracing")]
                tracing::debug!(block = k, paired = false, "matcher verified block");
                return block_size;
            }
        }

        1
    }

    /// Drives the match/advance loop over an entire seed until the buffer
    /// is exhausted or `sink` reports completion.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] if reading the underlying seed channel fails.
    pub fn scan<R: std::io::Read>(
        &self,
        buffer: &mut RollingBuffer<R>,
        sink: &mut impl BlockSink,
    ) -> Result<(), MatchError> {
        loop {
            if sink.is_complete() {
                return Ok(());
            }

            let consumed = self.step(buffer, sink);
            if consumed == 0 {
                return Ok(());
            }

            if !buffer.advance(consumed)? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zero_pad::ZeroPadded;
    use control::BlockEntry;
    use control::WholeFileDigest;
    use std::cell::RefCell;

    struct RecordingSink {
        blocks: RefCell<Vec<(usize, Vec<u8>)>>,
        total_blocks: usize,
    }

    impl RecordingSink {
        fn new(total_blocks: usize) -> Self {
            Self {
                blocks: RefCell::new(Vec::new()),
                total_blocks,
            }
        }
    }

    impl BlockSink for RecordingSink {
        fn write_block(&mut self, index: usize, bytes: &[u8]) {
            let mut blocks = self.blocks.borrow_mut();
            if !blocks.iter().any(|(k, _)| *k == index) {
                blocks.push((index, bytes.to_vec()));
            }
        }

        fn is_complete(&self) -> bool {
            self.blocks.borrow().len() == self.total_blocks
        }
    }

    fn control_for(target: &[u8], block_size: u32, sequence_match: SequenceMatch, strong_len: u8) -> ControlFile {
        let blocks: Vec<BlockEntry> = target
            .chunks(block_size as usize)
            .map(|chunk| {
                let mut padded = chunk.to_vec();
                padded.resize(block_size as usize, 0);
                let mut rolling = RollingChecksum::new();
                rolling.update(&padded);
                let weak = rolling.masked(4);
                let strong = TruncatedMd4::new(usize::from(strong_len)).digest(&padded);
                BlockEntry { weak, strong }
            })
            .collect();

        ControlFile {
            zsync_version: "0.6.2".to_string(),
            producer: None,
            filename: "target".to_string(),
            url: "target".to_string(),
            length: target.len() as u64,
            blocksize: block_size,
            sequence_match,
            weak_len: 4,
            strong_len,
            whole_file_digest: WholeFileDigest::Md4([0; 16]),
            mtime: None,
            blocks,
        }
    }

    #[test]
    fn identity_seed_matches_every_block_with_q1() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4, SequenceMatch::Single, 3);
        let index = HashIndex::build(&control);
        let matcher = BlockMatcher::new(&control, &index);

        let seed = ZeroPadded::new(&target[..], 4);
        let mut buffer = RollingBuffer::new(seed, 4).unwrap();
        let mut sink = RecordingSink::new(2);

        matcher.scan(&mut buffer, &mut sink).unwrap();

        assert!(sink.is_complete());
        let blocks = sink.blocks.borrow();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn shifted_seed_finds_blocks_at_unaligned_offset() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4, SequenceMatch::Single, 3);
        let index = HashIndex::build(&control);
        let matcher = BlockMatcher::new(&control, &index);

        let shifted = b"XXABCDEFGHYY";
        let seed = ZeroPadded::new(&shifted[..], 4);
        let mut buffer = RollingBuffer::new(seed, 4).unwrap();
        let mut sink = RecordingSink::new(2);

        matcher.scan(&mut buffer, &mut sink).unwrap();

        assert!(sink.is_complete());
    }

    #[test]
    fn identity_seed_matches_every_block_with_q2() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4, SequenceMatch::Pair, 3);
        let index = HashIndex::build(&control);
        let matcher = BlockMatcher::new(&control, &index);

        let seed = ZeroPadded::new(&target[..], 4);
        let mut buffer = RollingBuffer::new(seed, 4).unwrap();
        let mut sink = RecordingSink::new(2);

        matcher.scan(&mut buffer, &mut sink).unwrap();

        assert!(sink.is_complete());
        let blocks = sink.blocks.borrow();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn partial_seed_matches_only_covered_block() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4, SequenceMatch::Single, 3);
        let index = HashIndex::build(&control);
        let matcher = BlockMatcher::new(&control, &index);

        let seed = ZeroPadded::new(&b"ABCDZZZZ"[..], 4);
        let mut buffer = RollingBuffer::new(seed, 4).unwrap();
        let mut sink = RecordingSink::new(2);

        matcher.scan(&mut buffer, &mut sink).unwrap();

        let blocks = sink.blocks.borrow();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0, 0);
    }
}

use std::collections::HashMap;

use control::{ControlFile, SequenceMatch};

/// Lookup structure mapping a window's weak sum to candidate target block
/// indices.
///
/// Built once per control file. When the control file's sequence-match
/// parameter is [`SequenceMatch::Pair`], every block but the last is keyed
/// by the composite of its own weak sum and the following block's weak
/// sum, reducing false positives at the cost of requiring two matching
/// blocks back to back; the last block (which has no successor) always
/// falls back to a single-key lookup.
#[derive(Debug, Default)]
pub struct HashIndex {
    singles: HashMap<u32, Vec<usize>>,
    pairs: HashMap<(u32, u32), Vec<usize>>,
}

impl HashIndex {
    /// Builds the index from a parsed control file's block-sum table.
    #[must_use]
    pub fn build(control: &ControlFile) -> Self {
        let mut index = Self::default();
        let blocks = &control.blocks;
        let last = blocks.len().saturating_sub(1);

        for (k, block) in blocks.iter().enumerate() {
            match control.sequence_match {
                SequenceMatch::Pair if k != last => {
                    let next = blocks[k + 1].weak;
                    index.pairs.entry((block.weak, next)).or_default().push(k);
                }
                _ => {
                    index.singles.entry(block.weak).or_default().push(k);
                }
            }
        }

        index
    }

    /// Returns candidate block indices for a single-block probe.
    #[must_use]
    pub fn probe_single(&self, weak: u32) -> &[usize] {
        self.singles.get(&weak).map_or(&[], Vec::as_slice)
    }

    /// Returns candidate block-pair start indices (`k` such that `k` and
    /// `k+1` together match) for a composite probe.
    #[must_use]
    pub fn probe_pair(&self, weak: u32, next_weak: u32) -> &[usize] {
        self.pairs
            .get(&(weak, next_weak))
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use control::{BlockEntry, WholeFileDigest};

    fn control_with_blocks(sequence_match: SequenceMatch, weaks: &[u32]) -> ControlFile {
        ControlFile {
            zsync_version: "0.6.2".to_string(),
            producer: None,
            filename: "t".to_string(),
            url: "t".to_string(),
            length: 0,
            blocksize: 4,
            sequence_match,
            weak_len: 2,
            strong_len: 3,
            whole_file_digest: WholeFileDigest::Md4([0; 16]),
            mtime: None,
            blocks: weaks
                .iter()
                .map(|&weak| BlockEntry {
                    weak,
                    strong: vec![0; 3],
                })
                .collect(),
        }
    }

    #[test]
    fn single_sequence_match_indexes_every_block_individually() {
        let control = control_with_blocks(SequenceMatch::Single, &[1, 2, 3]);
        let index = HashIndex::build(&control);

        assert_eq!(index.probe_single(1), &[0]);
        assert_eq!(index.probe_single(2), &[1]);
        assert_eq!(index.probe_single(3), &[2]);
    }

    #[test]
    fn pair_sequence_match_composes_keys_except_last_block() {
        let control = control_with_blocks(SequenceMatch::Pair, &[10, 20, 30]);
        let index = HashIndex::build(&control);

        assert_eq!(index.probe_pair(10, 20), &[0]);
        assert_eq!(index.probe_pair(20, 30), &[1]);
        assert_eq!(index.probe_single(30), &[2]);
        assert!(index.probe_single(10).is_empty());
    }

    #[test]
    fn duplicate_weak_sums_accumulate_candidates() {
        let control = control_with_blocks(SequenceMatch::Single, &[7, 7]);
        let index = HashIndex::build(&control);
        assert_eq!(index.probe_single(7), &[0, 1]);
    }
}

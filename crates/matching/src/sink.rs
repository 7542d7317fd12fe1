/// Destination for blocks the matcher has verified against the strong-sum
/// table.
///
/// Implemented by the output writer; kept as a trait here so this crate
/// does not need to depend on the writer crate.
pub trait BlockSink {
    /// Accepts a fully verified block. Implementors must silently ignore a
    /// block index that has already been written.
    fn write_block(&mut self, index: usize, bytes: &[u8]);

    /// Reports whether every target block has been written.
    fn is_complete(&self) -> bool;
}

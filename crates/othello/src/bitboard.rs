use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Shl, Shr};

/// A single 8×8 bitboard represented by a 64-bit integer.
///
/// Bit `row * 8 + col` holds cell (row, col), so iterating the set bits from
/// least to most significant visits cells in row-major order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, BitOr, BitOrAssign, BitAnd, BitAndAssign, Not, Shl, Shr,
)]
#[repr(transparent)]
pub struct BitBoard(pub u64);

impl BitBoard {
    pub const EMPTY: BitBoard = BitBoard(0);
    pub const FULL: BitBoard = BitBoard(u64::MAX);

    /// Converts a (row, col) coordinate pair into a single bit index (0–63).
    #[inline]
    pub fn index(row: usize, col: usize) -> usize {
        row * 8 + col
    }

    /// Returns a bit mask (`u64`) with a single bit set at the given (row, col).
    #[inline]
    fn mask(row: usize, col: usize) -> u64 {
        1u64 << Self::index(row, col)
    }

    /// A board with only (row, col) set.
    #[inline]
    pub fn cell(row: usize, col: usize) -> BitBoard {
        BitBoard(Self::mask(row, col))
    }

    /// Checks whether the bit at (row, col) is set.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.0 & Self::mask(row, col) != 0
    }

    /// Sets the bit at (row, col).
    pub fn set(&mut self, row: usize, col: usize) {
        self.0 |= Self::mask(row, col);
    }

    /// Clears the bit at (row, col).
    pub fn clear(&mut self, row: usize, col: usize) {
        self.0 &= !Self::mask(row, col);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Set cells as (row, col), in row-major order.
    pub fn cells(&self) -> Cells {
        Cells(self.0)
    }
}

impl From<BitBoard> for u64 {
    fn from(bb: BitBoard) -> u64 { bb.0 }
}

/// Iterator over the set cells of a [`BitBoard`].
#[derive(Clone, Debug)]
pub struct Cells(u64);

impl Iterator for Cells {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }
        let i = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some((i / 8, i % 8))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Cells {}

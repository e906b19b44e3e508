//! Symmetric block-sparse matrix over vertex pairs.
//!
//! The matrix is a flat arena of 3×3 blocks. The first `vertex_count`
//! blocks are the diagonal (block `i` sits at row = col = `i`); the next
//! `spring_count` blocks are off-diagonal, one per spring slot, tagged with
//! the spring's two endpoints. Only one triangle is stored: the block at
//! (col, row) is the transpose of the stored (row, col) block and is
//! reconstructed on the fly in products.
//!
//! ```text
//! blocks: [ d0 | d1 | ... | d(n-1) | s0 (r,c) | s1 (r,c) | ... ]
//!           └──── diagonal ───────┘ └──── one per spring ────┘
//! ```
//!
//! The layout is fixed at construction. Springs may be switched off by the
//! caller, but their slot stays in the arena.

use std::collections::BTreeMap;

use glam::{Mat3, Vec3};
use tress_types::constants::PARALLEL_VERTEX_THRESHOLD;
use tress_types::{BlockHandle, TressError, TressResult};

use crate::block::entry;

/// One stored 3×3 block with its block-row and block-column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixBlock {
    pub row: usize,
    pub col: usize,
    pub value: Mat3,
}

impl MatrixBlock {
    fn zeroed(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            value: Mat3::ZERO,
        }
    }
}

/// Symmetric block-sparse matrix (see module docs for the layout).
#[derive(Debug, Clone)]
pub struct BlockSparseMatrix {
    vertex_count: usize,
    blocks: Vec<MatrixBlock>,
}

impl BlockSparseMatrix {
    /// Creates a zeroed matrix with `vertex_count` diagonal blocks and
    /// `spring_count` (untagged) off-diagonal slots.
    pub fn new(vertex_count: usize, spring_count: usize) -> Self {
        let mut blocks = Vec::with_capacity(vertex_count + spring_count);
        blocks.extend((0..vertex_count).map(|i| MatrixBlock::zeroed(i, i)));
        blocks.extend((0..spring_count).map(|_| MatrixBlock::zeroed(0, 0)));
        Self {
            vertex_count,
            blocks,
        }
    }

    /// Number of diagonal blocks.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of off-diagonal slots.
    pub fn spring_count(&self) -> usize {
        self.blocks.len() - self.vertex_count
    }

    /// Total stored blocks (`vertex_count + spring_count`).
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// All stored blocks, diagonal first.
    pub fn blocks(&self) -> &[MatrixBlock] {
        &self.blocks
    }

    /// The off-diagonal part of the arena.
    pub fn off_diagonal(&self) -> &[MatrixBlock] {
        &self.blocks[self.vertex_count..]
    }

    /// Off-diagonal blocks as `(row, col, value)`, value mutable.
    pub fn off_diagonal_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut Mat3)> {
        let n = self.vertex_count;
        self.blocks[n..]
            .iter_mut()
            .map(|block| (block.row, block.col, &mut block.value))
    }

    /// Diagonal block of vertex `i`.
    pub fn diagonal(&self, i: usize) -> &Mat3 {
        &self.blocks[i].value
    }

    pub fn diagonal_mut(&mut self, i: usize) -> &mut Mat3 {
        &mut self.blocks[i].value
    }

    /// Block addressed by a spring handle.
    pub fn block(&self, handle: BlockHandle) -> &MatrixBlock {
        &self.blocks[handle.index()]
    }

    /// Mutable value of the block addressed by a spring handle.
    pub fn block_mut(&mut self, handle: BlockHandle) -> &mut Mat3 {
        &mut self.blocks[handle.index()].value
    }

    /// Tags off-diagonal slot `slot` with endpoints (`row`, `col`).
    ///
    /// Returns the handle of the slot, which is the same in every matrix
    /// built with the same vertex and spring counts.
    pub fn init_spring(&mut self, slot: usize, row: usize, col: usize) -> BlockHandle {
        let index = self.vertex_count + slot;
        let block = &mut self.blocks[index];
        block.row = row;
        block.col = col;
        BlockHandle(index as u32)
    }

    /// Returns true if both matrices have the same block count and tags.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.vertex_count == other.vertex_count
            && self.blocks.len() == other.blocks.len()
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(a, b)| a.row == b.row && a.col == b.col)
    }

    /// Copies layout and values from `other` (which must have the same
    /// block count).
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.blocks.len(), other.blocks.len());
        self.vertex_count = other.vertex_count;
        self.blocks.clone_from_slice(&other.blocks);
    }

    /// Sets every block (diagonal and off-diagonal) to `value`.
    pub fn fill(&mut self, value: Mat3) {
        for block in &mut self.blocks {
            block.value = value;
        }
    }

    /// Sets diagonal blocks to `value` and off-diagonal blocks to zero.
    pub fn fill_diagonal(&mut self, value: Mat3) {
        let n = self.vertex_count;
        for block in &mut self.blocks[..n] {
            block.value = value;
        }
        for block in &mut self.blocks[n..] {
            block.value = Mat3::ZERO;
        }
    }

    /// `self = a · a_scale + b · b_scale`, block by block.
    ///
    /// The layout (tags) is taken from `a`.
    pub fn scale_add(&mut self, a: &Self, a_scale: f32, b: &Self, b_scale: f32) {
        debug_assert_eq!(self.blocks.len(), a.blocks.len());
        debug_assert_eq!(self.blocks.len(), b.blocks.len());
        self.vertex_count = a.vertex_count;
        for ((to, x), y) in self.blocks.iter_mut().zip(&a.blocks).zip(&b.blocks) {
            to.row = x.row;
            to.col = x.col;
            to.value = x.value * a_scale + y.value * b_scale;
        }
    }

    /// Checked variant of [`scale_add`](Self::scale_add).
    pub fn try_scale_add(&mut self, a: &Self, a_scale: f32, b: &Self, b_scale: f32) -> TressResult<()> {
        for other in [a, b] {
            if other.blocks.len() != self.blocks.len() {
                return Err(TressError::DimensionMismatch {
                    expected: self.blocks.len(),
                    found: other.blocks.len(),
                });
            }
        }
        self.scale_add(a, a_scale, b, b_scale);
        Ok(())
    }

    /// `self -= a · a_scale + b · b_scale`, block by block.
    pub fn sub_scaled(&mut self, a: &Self, a_scale: f32, b: &Self, b_scale: f32) {
        debug_assert_eq!(self.blocks.len(), a.blocks.len());
        debug_assert_eq!(self.blocks.len(), b.blocks.len());
        for ((to, x), y) in self.blocks.iter_mut().zip(&a.blocks).zip(&b.blocks) {
            to.value -= x.value * a_scale + y.value * b_scale;
        }
    }

    /// `to = M · v` over the symmetric structure.
    ///
    /// Runs the two accumulation passes on separate threads once the
    /// vertex count exceeds [`PARALLEL_VERTEX_THRESHOLD`].
    pub fn mul_vector(&self, v: &[Vec3], to: &mut [Vec3]) {
        self.mul_vector_threaded(v, to, self.vertex_count > PARALLEL_VERTEX_THRESHOLD);
    }

    /// `to = M · v`, choosing explicitly whether to split the passes
    /// across threads.
    ///
    /// Pass 1 adds `blockᵀ · v[row]` into `col` for each off-diagonal
    /// block; pass 2 adds `block · v[col]` into `row` for every block.
    /// Each pass owns its destination buffer and runs sequentially in
    /// arena order, and the two buffers are summed in a fixed order
    /// afterwards, so the result is bit-identical either way.
    pub fn mul_vector_threaded(&self, v: &[Vec3], to: &mut [Vec3], threaded: bool) {
        debug_assert_eq!(v.len(), self.vertex_count);
        debug_assert_eq!(to.len(), self.vertex_count);

        let mut transposed = vec![Vec3::ZERO; self.vertex_count];
        if threaded {
            rayon::join(
                || self.accumulate_transposed(v, &mut transposed),
                || self.accumulate_direct(v, to),
            );
        } else {
            self.accumulate_transposed(v, &mut transposed);
            self.accumulate_direct(v, to);
        }

        for (t, x) in to.iter_mut().zip(&transposed) {
            *t += *x;
        }
    }

    fn accumulate_transposed(&self, v: &[Vec3], acc: &mut [Vec3]) {
        for block in self.off_diagonal() {
            acc[block.col] += block.value.transpose() * v[block.row];
        }
    }

    fn accumulate_direct(&self, v: &[Vec3], acc: &mut [Vec3]) {
        acc.fill(Vec3::ZERO);
        for block in &self.blocks {
            acc[block.row] += block.value * v[block.col];
        }
    }

    /// Expands the full symmetric matrix into scalar `(row, col, value)`
    /// triplets, merging blocks that land on the same entry.
    ///
    /// Rows and columns are scalar indices (`3 · vertex + axis`). The
    /// result is sorted column-major.
    pub fn to_triplets(&self) -> Vec<(usize, usize, f64)> {
        let mut entries: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (index, block) in self.blocks.iter().enumerate() {
            let (r0, c0) = (3 * block.row, 3 * block.col);
            let is_diagonal = index < self.vertex_count;
            for c in 0..3 {
                for r in 0..3 {
                    let value = entry(&block.value, r, c) as f64;
                    *entries.entry((c0 + c, r0 + r)).or_insert(0.0) += value;
                    if !is_diagonal {
                        *entries.entry((r0 + r, c0 + c)).or_insert(0.0) += value;
                    }
                }
            }
        }
        entries
            .into_iter()
            .map(|((col, row), value)| (row, col, value))
            .collect()
    }
}

//! Block-arena handles.

use serde::{Deserialize, Serialize};

/// Opaque handle to a spring's off-diagonal block in every
/// block-sparse matrix of a solver instance.
///
/// Returned by spring registration. The value is the block's offset in
/// the arena: `vertex_count + slot`, so it can never be mistaken for the
/// plain slot number it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHandle(pub u32);

impl BlockHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

//! Duplicate image detection.
//!
//! A photo should appear at most once per gallery. Repeats are reported, never
//! removed: which occurrence to keep is an editorial call.

use crate::manifest::{Block, Layout};
use std::collections::HashSet;

/// A repeated image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateImage {
    /// Block where the repeat occurred (not where the image was first seen).
    pub block_index: usize,
    /// Layout of that block, for reporting.
    pub layout: Layout,
    pub image: String,
}

/// Every repeat occurrence of an image across `blocks`, in block order.
///
/// An image listed three times yields two entries. Repeats inside one block
/// count too.
pub fn find_duplicate_images(blocks: &[Block]) -> Vec<DuplicateImage> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        for image in &block.images {
            if !seen.insert(image.as_str()) {
                duplicates.push(DuplicateImage {
                    block_index,
                    layout: block.layout.clone(),
                    image: image.clone(),
                });
            }
        }
    }
    duplicates
}

//! Provides a queue of image tiles for the worker threads of the
//! direct illumination pass. The queue itself is not changed after
//! creation; workers pull tiles through an atomic counter, in Morton
//! order so that consecutive tiles stay close together on screen.

use std::sync::atomic::{AtomicUsize, Ordering};
// others
use log::warn;

// see github/tray_rust/src/sampler/block_queue.rs

/// The queue of blocks to be worked on shared immutably between worker threads.
pub struct BlockQueue {
    /// The block indices of blocks to work on for the image
    blocks: Vec<(u32, u32)>,
    /// Index of the next block to be worked on
    next: AtomicUsize,
}

impl BlockQueue {
    /// Create a block queue covering an image of `img` pixels with
    /// blocks of `dim` pixels. Blocks on the right and bottom border
    /// may extend beyond the image.
    pub fn new(img: (u32, u32), dim: (u32, u32)) -> BlockQueue {
        let dim: (u32, u32) = (dim.0.max(1), dim.1.max(1));
        let num_blocks = ((img.0 + dim.0 - 1) / dim.0, (img.1 + dim.1 - 1) / dim.1);
        let mut blocks: Vec<(u32, u32)> = (0..num_blocks.0 * num_blocks.1)
            .map(|i| (i % num_blocks.0, i / num_blocks.0))
            .collect();
        blocks.sort_by_key(|b| morton2(*b));
        if blocks.is_empty() {
            warn!("Block queue for image {:?} is empty", img);
        }
        BlockQueue {
            blocks,
            next: AtomicUsize::new(0),
        }
    }
    /// Get an iterator to work through the queue
    pub fn iter(&self) -> BlockQueueIterator {
        BlockQueueIterator { queue: self }
    }
    /// Get the next block in the queue or None if the queue is finished
    pub fn next(&self) -> Option<(u32, u32)> {
        let i = self.next.fetch_add(1, Ordering::AcqRel);
        self.blocks.get(i).copied()
    }
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    /// Check if every block has been handed out
    pub fn is_empty(&self) -> bool {
        self.next.load(Ordering::Acquire) >= self.blocks.len()
    }
}

/// Iterator to work through the queue safely
pub struct BlockQueueIterator<'a> {
    queue: &'a BlockQueue,
}

impl<'a> Iterator for BlockQueueIterator<'a> {
    type Item = (u32, u32);
    fn next(&mut self) -> Option<(u32, u32)> {
        self.queue.next()
    }
}

// see github/tray_rust/src/sampler/morton.rs

/// Insert a 0 bit between each of the low 16 bits of x
fn part1_by1(mut x: u32) -> u32 {
    x &= 0x0000_ffff;
    x = (x ^ (x << 8)) & 0x00ff_00ff;
    x = (x ^ (x << 4)) & 0x0f0f_0f0f;
    x = (x ^ (x << 2)) & 0x3333_3333;
    (x ^ (x << 1)) & 0x5555_5555
}
/// Compute the Morton code for the `(x, y)` position.
fn morton2(p: (u32, u32)) -> u32 {
    (part1_by1(p.1) << 1) + part1_by1(p.0)
}

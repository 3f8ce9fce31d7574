//! # Allocators
//!
//! Storage of a value tree is requested through an `Allocator`. The
//! allocator decides the growth of containers and accounts for the memory
//! handed out to a tree. Storage always returns to the global heap once
//! its owner is dropped. Allocators without `NEED_FREE` are not told about
//! released blocks, so releasing a tree built with them needs no walk over
//! its nodes.

use alloc::{boxed::Box, vec::Vec};

/// Default size of a memory pool chunk.
pub const DEFAULT_CHUNK_CAPACITY: usize = 64 * 1024;

/// ## Allocator Capability
///
/// Source of the byte blocks backing owned strings, and growth policy of
/// the element vectors backing arrays and objects.
pub trait Allocator {
    /// Whether released blocks must be handed back through `free()`.
    const NEED_FREE: bool;

    /// Allocate a zeroed block of `size` bytes.
    fn malloc(&mut self, size: usize) -> Box<[u8]>;

    /// ## Resize Block
    ///
    /// Yield a block of `new_size` bytes which starts with the content of
    /// `block`, truncated to `new_size`.
    fn realloc(&mut self, block: Box<[u8]>, new_size: usize) -> Box<[u8]>;

    /// Release a block previously allocated with this allocator.
    fn free(&mut self, block: Box<[u8]>);

    /// ## Reserve Elements
    ///
    /// Grow `v` to hold at least `capacity` elements. Never shrinks.
    fn reserve<T>(&mut self, v: &mut Vec<T>, capacity: usize);
}

fn resize(block: Box<[u8]>, new_size: usize) -> Box<[u8]> {
    if block.len() == new_size {
        return block;
    }

    let mut v = Vec::from(block);
    v.resize(new_size, 0);
    v.into_boxed_slice()
}

/// ## Heap Allocator
///
/// Plain allocator forwarding to the global heap.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CrtAllocator;

impl Allocator for CrtAllocator {
    const NEED_FREE: bool = true;

    fn malloc(&mut self, size: usize) -> Box<[u8]> {
        alloc::vec![0; size].into_boxed_slice()
    }

    fn realloc(&mut self, block: Box<[u8]>, new_size: usize) -> Box<[u8]> {
        resize(block, new_size)
    }

    fn free(&mut self, block: Box<[u8]>) {
        drop(block);
    }

    fn reserve<T>(&mut self, v: &mut Vec<T>, capacity: usize) {
        if capacity > v.capacity() {
            v.reserve_exact(capacity - v.len());
        }
    }
}

/// ## Memory Pool Allocator
///
/// Allocator that accounts for its blocks in fixed-size chunks and never
/// reclaims anything before `clear()`. Suitable for trees that are built
/// once and released as a whole.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemoryPoolAllocator {
    chunk_capacity: usize,
    chunks: usize,
    capacity: usize,
    size: usize,
    last_chunk: usize,
    chunk_used: usize,
}

impl MemoryPoolAllocator {
    /// ## Create Memory Pool
    ///
    /// Create an empty pool which reserves chunks of at least
    /// `chunk_capacity` bytes. A zero capacity selects the default.
    pub fn new(chunk_capacity: usize) -> Self {
        Self {
            chunk_capacity: if chunk_capacity == 0 { DEFAULT_CHUNK_CAPACITY } else { chunk_capacity },
            chunks: 0,
            capacity: 0,
            size: 0,
            last_chunk: 0,
            chunk_used: 0,
        }
    }

    /// Yield the number of bytes handed out since the last `clear()`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Yield the number of bytes reserved in chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Yield the number of chunks reserved.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Release all chunks.
    pub fn clear(&mut self) {
        self.chunks = 0;
        self.capacity = 0;
        self.size = 0;
        self.last_chunk = 0;
        self.chunk_used = 0;
    }

    fn account(&mut self, n: usize) {
        if n == 0 {
            return;
        }

        let room = self.last_chunk - self.chunk_used;
        if n > room {
            let chunk = self.chunk_capacity.max(n);
            self.chunks += 1;
            self.capacity += chunk;
            self.chunk_used = 0;
            self.last_chunk = chunk;
        }

        self.chunk_used += n;
        self.size += n;
    }
}

impl Default for MemoryPoolAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CAPACITY)
    }
}

impl Allocator for MemoryPoolAllocator {
    const NEED_FREE: bool = false;

    fn malloc(&mut self, size: usize) -> Box<[u8]> {
        self.account(size);
        alloc::vec![0; size].into_boxed_slice()
    }

    fn realloc(&mut self, block: Box<[u8]>, new_size: usize) -> Box<[u8]> {
        if new_size > block.len() {
            self.account(new_size);
        }
        resize(block, new_size)
    }

    fn free(&mut self, block: Box<[u8]>) {
        drop(block);
    }

    fn reserve<T>(&mut self, v: &mut Vec<T>, capacity: usize) {
        let previous = v.capacity();
        if capacity > previous {
            v.reserve_exact(capacity - v.len());
            self.account((v.capacity() - previous) * core::mem::size_of::<T>());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<A: Allocator>(a: &mut A) {
        let mut p = a.malloc(100);
        assert_eq!(p.len(), 100);
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut q = a.realloc(p, 200);
        assert_eq!(q.len(), 200);
        assert!(q[..100].iter().enumerate().all(|(i, v)| *v == i as u8));
        for i in 100..200 {
            q[i] = i as u8;
        }

        let r = a.realloc(q, 150);
        assert_eq!(r.len(), 150);
        assert!(r.iter().enumerate().all(|(i, v)| *v == i as u8));

        a.free(r);
    }

    // Heap Allocator Test
    //
    // Verify blocks keep their content across growing and shrinking.
    #[test]
    fn allocator_crt() {
        let mut a = CrtAllocator;
        exercise(&mut a);

        let mut v: Vec<u64> = Vec::new();
        a.reserve(&mut v, 16);
        assert!(v.capacity() >= 16);
        a.reserve(&mut v, 4);
        assert!(v.capacity() >= 16);
    }

    // Memory Pool Test
    //
    // Verify the pool accounts for all blocks, grows by whole chunks and
    // forgets everything on clear.
    #[test]
    fn allocator_pool() {
        let mut a = MemoryPoolAllocator::default();
        exercise(&mut a);
        assert_eq!(a.size(), 300);
        assert_eq!(a.chunks(), 1);
        assert_eq!(a.capacity(), DEFAULT_CHUNK_CAPACITY);

        for i in 1..1000 {
            assert_eq!(a.malloc(i).len(), i);
            assert!(a.size() <= a.capacity());
        }
        assert!(a.chunks() > 1);

        a.clear();
        assert_eq!(a.size(), 0);
        assert_eq!(a.capacity(), 0);
    }

    // Oversized Block Test
    //
    // Verify blocks larger than a chunk get a dedicated chunk.
    #[test]
    fn allocator_pool_oversized() {
        let mut a = MemoryPoolAllocator::new(64);
        a.malloc(10);
        a.malloc(1000);
        assert_eq!(a.chunks(), 2);
        assert_eq!(a.capacity(), 64 + 1000);
        a.malloc(60);
        assert_eq!(a.chunks(), 3);

        let mut v: Vec<u32> = Vec::new();
        a.reserve(&mut v, 4);
        assert_eq!(a.size(), 10 + 1000 + 60 + v.capacity() * 4);
    }
}

//! Index addressed storage for ring nodes.
//!
//! Every node sits in its own block obtained from an `Allocator`. Slots
//! refer to nodes by index, so links are plain `usize` values and a freed
//! slot index is recycled by the next insertion.

use alloc::vec::Vec;
use core::alloc::Layout;
use core::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::error::{Error, Result};

/// One element slot of the ring.
pub struct Node<T> {
    /// `None` until the slot is first written, and again after a dequeue.
    pub value: Option<T>,
    /// Index of the following node.
    pub next: usize,
}

pub struct Arena<T> {
    slots: Vec<Option<NonNull<Node<T>>>>,
    vacant: Vec<usize>,
}

impl<T> Arena<T> {
    pub const NODE_LAYOUT: Layout = Layout::new::<Node<T>>();

    #[inline]
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Allocates a node with an empty slot, linked to itself.
    ///
    /// The block is obtained first and only then initialized, so a failed
    /// allocation leaves the arena untouched.
    pub fn insert<A: Allocator + ?Sized>(&mut self, allocator: &A) -> Result<usize> {
        let layout = Self::NODE_LAYOUT;
        let block = allocator
            .allocate(layout)
            .ok_or(Error::AllocationFailure { layout })?;
        let node = block.cast::<Node<T>>();
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        unsafe {
            ptr::write(node.as_ptr(), Node { value: None, next: index });
        }
        self.slots[index] = Some(node);
        Ok(index)
    }

    /// Returns the block of the node at `index`, then drops the node.
    ///
    /// The slot is vacant and the block freed before the element's own
    /// `Drop` runs, so a panicking element leaves the arena consistent.
    ///
    /// # Safety
    ///
    /// `allocator` must be the allocator the node was inserted with.
    pub unsafe fn remove<A: Allocator + ?Sized>(&mut self, allocator: &A, index: usize) {
        if let Some(node) = self.slots[index].take() {
            let node = Self::release(allocator, node);
            self.vacant.push(index);
            drop(node);
        }
    }

    /// Drops every node and returns all blocks, leaving the arena empty.
    /// Returns the number of nodes released.
    ///
    /// If an element panics while being dropped, the remaining nodes are
    /// still released before the panic propagates.
    ///
    /// # Safety
    ///
    /// `allocator` must be the allocator all nodes were inserted with.
    pub unsafe fn release_all<A: Allocator + ?Sized>(&mut self, allocator: &A) -> usize {
        struct Guard<'r, T, A: Allocator + ?Sized> {
            arena: &'r mut Arena<T>,
            allocator: &'r A,
            released: usize,
        }

        impl<'r, T, A: Allocator + ?Sized> Drop for Guard<'r, T, A> {
            fn drop(&mut self) {
                // only has work left when unwinding
                while let Some(node) = unsafe { self.arena.release_last(self.allocator) } {
                    self.released += 1;
                    drop(node);
                }
            }
        }

        let mut guard = Guard {
            arena: self,
            allocator,
            released: 0,
        };
        while let Some(node) = guard.arena.release_last(guard.allocator) {
            guard.released += 1;
            drop(node);
        }
        guard.released
    }

    /// Pops the last occupied slot, frees its block and hands back the node.
    unsafe fn release_last<A: Allocator + ?Sized>(&mut self, allocator: &A) -> Option<Node<T>> {
        while let Some(slot) = self.slots.pop() {
            if let Some(node) = slot {
                return Some(Self::release(allocator, node));
            }
        }
        self.vacant.clear();
        None
    }

    /// Moves the node out of its block and frees the block.
    #[inline]
    unsafe fn release<A: Allocator + ?Sized>(allocator: &A, node: NonNull<Node<T>>) -> Node<T> {
        let value = ptr::read(node.as_ptr());
        allocator.free(node.cast::<u8>(), Self::NODE_LAYOUT);
        value
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Node<T> {
        match self.slots[index] {
            Some(node) => unsafe { &*node.as_ptr() },
            None => panic!("ring node {} is not allocated", index),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut Node<T> {
        match self.slots[index] {
            Some(node) => unsafe { &mut *node.as_ptr() },
            None => panic!("ring node {} is not allocated", index),
        }
    }
}

impl<T> Drop for Arena<T> {
    fn drop(&mut self) {
        // blocks can only go back through the allocator that owns them
        debug_assert_eq!(self.len(), 0, "arena dropped with live nodes");
    }
}

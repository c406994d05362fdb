//! A circular queue with fixed capacity, built from linked nodes.
//!
//! Every node of the ring is placed in its own block obtained from an
//! [`Allocator`] supplied by the caller. The allocator is borrowed, never
//! owned, so the borrow checker makes sure it outlives the buffer.
//!
//! Writing to a full `RingBuffer` **overwrites** the oldest element, so once
//! full the buffer is a sliding window over the most recent writes.
//! Reading and writing never allocate; only construction and [`resize`]
//! talk to the allocator, and only they can fail.
//!
//! [`resize`]: RingBuffer::resize
//!
//! # Feature Flags
//! The **nodering** crate has the following cargo feature flags:
//!
//! - `std`
//!   - Optional, enabled by default
//!   - Use libstd; without it the crate only needs `alloc`
//!
//! # Usage
//!
//! First, add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! nodering = "0.1"
//! ```
//!
//! To use nodering in a `#![no_std]` crate:
//!
//! ```toml
//! [dependencies]
//! nodering = { version = "0.1", default-features = false }
//! ```
//!
//! # Capacity
//!
//! A ring has at least [`MIN_CAPACITY`] nodes. All of them are allocated up
//! front, whether or not they ever hold an element.
//!
//! # Examples
//! ```
//! use nodering::{Heap, RingBuffer};
//!
//! let mut ring = RingBuffer::new(&Heap, 3).unwrap();
//! assert_eq!(ring.capacity(), 3);
//! assert_eq!(ring.available(), 0);
//!
//! ring.enqueue(1);
//! ring.enqueue(2);
//! assert_eq!(ring.available(), 2);
//!
//! assert_eq!(ring.dequeue(), Some(1));
//! assert_eq!(ring.dequeue(), Some(2));
//! assert_eq!(ring.dequeue(), None);
//! ```
//!
//! # Overwrite
//! ```
//! use nodering::{Heap, RingBuffer};
//!
//! let mut ring = RingBuffer::new(&Heap, 3).unwrap();
//!
//! for i in 0..5 {
//!     ring.enqueue(i);
//! }
//!
//! assert!(ring.is_full());
//! assert_eq!(format!("{:?}", ring), "[2, 3, 4]");
//! ```
//!
//! # Resize
//! ```
//! use nodering::{Heap, RingBuffer};
//!
//! let mut ring = RingBuffer::new(&Heap, 4).unwrap();
//! ring.enqueue(1.5);
//! ring.enqueue(2.5);
//!
//! ring.resize(8).unwrap();
//! assert_eq!(ring.capacity(), 8);
//! assert_eq!(ring.average(), 2.0);
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]

extern crate alloc;

use core::fmt;
use core::mem;

use log::{debug, trace, warn};

mod allocator;
mod arena;
pub mod error;
mod numeric;

pub use allocator::{Allocator, Counting, Heap};
pub use error::{Error, Result};
pub use numeric::Arithmetic;

use arena::Arena;

/// The smallest number of nodes a ring can be built or resized to.
pub const MIN_CAPACITY: usize = 3;

/// A fixed capacity ring buffer of linked nodes.
///
/// `enqueue` adds to the back, `dequeue` removes from the front. When the
/// buffer is full, `enqueue` drops the oldest element to make room.
///
/// Nodes are allocated through the borrowed allocator `A`. Every node is
/// returned to the same allocator when the buffer is resized down or
/// dropped.
///
/// # Moves
///
/// Moving a `RingBuffer` hands its nodes and its allocator over to the
/// destination. Assigning over a live buffer first releases all of its
/// nodes through its own allocator. [`take`] moves the contents out of a
/// place and leaves behind an empty buffer that owns no nodes.
///
/// There is no `Clone`: nodes cannot be shared between buffers.
///
/// [`take`]: RingBuffer::take
pub struct RingBuffer<'a, T, A: Allocator + ?Sized = Heap> {
    nodes: Arena<T>,
    head: usize,
    tail: usize,
    capacity: usize,
    count: usize,
    allocator: &'a A,
}

unsafe impl<'a, T: Send, A: Allocator + Sync + ?Sized> Send for RingBuffer<'a, T, A> {}

impl<'a, T, A: Allocator + ?Sized> Drop for RingBuffer<'a, T, A> {
    fn drop(&mut self) {
        let released = unsafe { self.nodes.release_all(self.allocator) };
        debug_assert_eq!(released, self.capacity);
        if released > 0 {
            trace!("ring buffer released {} nodes", released);
        }
    }
}

impl<'a, T, A: Allocator + ?Sized> RingBuffer<'a, T, A> {
    #[inline]
    fn next(&self, index: usize) -> usize {
        self.nodes.get(index).next
    }

    #[inline]
    fn check_capacity(requested: usize) -> Result<()> {
        if requested < MIN_CAPACITY {
            return Err(Error::InvalidCapacity {
                requested,
                minimum: MIN_CAPACITY,
            });
        }
        Ok(())
    }

    /// Allocates a node and links it in right after `tail`.
    ///
    /// The new slot is the next one `enqueue` will fill, so the order of
    /// live elements is preserved.
    fn splice_after_tail(&mut self) -> Result<()> {
        let index = self.nodes.insert(self.allocator)?;
        if self.capacity == 0 {
            // a lone node is already linked to itself
            self.head = index;
            self.tail = index;
        } else {
            let after = self.next(self.tail);
            self.nodes.get_mut(index).next = after;
            self.nodes.get_mut(self.tail).next = index;
            if self.count == 0 {
                self.head = index;
            }
        }
        self.capacity += 1;
        Ok(())
    }

    /// Unlinks and frees the node right after `tail`, which is the oldest
    /// slot of the ring. In a full buffer that slot holds the front element,
    /// which is lost.
    fn unlink_after_tail(&mut self) {
        debug_assert!(self.capacity > 1);
        let victim = self.next(self.tail);
        let after = self.next(victim);
        self.nodes.get_mut(self.tail).next = after;
        if victim == self.head {
            self.head = after;
            self.count = self.count.saturating_sub(1);
        }
        // the victim's element may panic on drop; the ring must already
        // be consistent by then
        self.capacity -= 1;
        unsafe {
            self.nodes.remove(self.allocator, victim);
        }
    }

    /// Creates an empty `RingBuffer` of `capacity` nodes, each allocated
    /// through `allocator`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] when `capacity` is below [`MIN_CAPACITY`];
    /// the allocator is not called.
    ///
    /// [`Error::AllocationFailure`] when the allocator runs out; every node
    /// allocated up to that point has been returned to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Error, Heap, RingBuffer};
    ///
    /// let ring: RingBuffer<u32> = RingBuffer::new(&Heap, 3).unwrap();
    /// assert_eq!(ring.capacity(), 3);
    ///
    /// assert!(matches!(
    ///     RingBuffer::<u32>::new(&Heap, 2),
    ///     Err(Error::InvalidCapacity { requested: 2, .. })
    /// ));
    /// ```
    pub fn new(allocator: &'a A, capacity: usize) -> Result<Self> {
        Self::check_capacity(capacity)?;

        // Dropping the half built ring on failure hands its nodes back.
        let mut ring = RingBuffer {
            nodes: Arena::new(),
            head: 0,
            tail: 0,
            capacity: 0,
            count: 0,
            allocator,
        };
        while ring.capacity < capacity {
            if let Err(err) = ring.splice_after_tail() {
                warn!(
                    "ring buffer construction failed after {} of {} nodes: {}",
                    ring.capacity, capacity, err
                );
                return Err(err);
            }
        }
        debug!("ring buffer created with {} nodes", capacity);
        Ok(ring)
    }

    /// Appends an element to the back of the buffer.
    ///
    /// If the buffer is full, the front element is overwritten and returned.
    /// This never allocates.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
    ///
    /// assert_eq!(ring.enqueue(1), None);
    /// assert_eq!(ring.enqueue(2), None);
    /// assert_eq!(ring.enqueue(3), None);
    /// assert_eq!(ring.enqueue(4), Some(1));
    /// assert_eq!(ring.read(), Some(&2));
    /// ```
    pub fn enqueue(&mut self, element: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(element);
        }
        self.tail = self.next(self.tail);
        if self.is_full() {
            self.head = self.next(self.head);
            trace!("ring buffer full, overwriting the oldest element");
            self.nodes.get_mut(self.tail).value.replace(element)
        } else {
            self.count += 1;
            let stale = self.nodes.get_mut(self.tail).value.replace(element);
            drop(stale);
            None
        }
    }

    /// Same as [`enqueue`](RingBuffer::enqueue).
    #[inline]
    pub fn write(&mut self, element: T) -> Option<T> {
        self.enqueue(element)
    }

    /// Removes the front element and returns it, or `None` if the buffer
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
    /// assert_eq!(ring.dequeue(), None);
    ///
    /// ring.enqueue("a");
    /// ring.enqueue("b");
    /// assert_eq!(ring.dequeue(), Some("a"));
    /// assert_eq!(ring.available(), 1);
    /// ```
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let front = self.head;
        self.head = self.next(front);
        self.count -= 1;
        self.nodes.get_mut(front).value.take()
    }

    /// Provides a reference to the front element, or `None` if the buffer
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
    /// assert_eq!(ring.read(), None);
    ///
    /// ring.enqueue(7);
    /// assert_eq!(ring.read(), Some(&7));
    /// assert_eq!(ring.available(), 1);
    /// ```
    pub fn read(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.nodes.get(self.head).value.as_ref()
    }

    /// Changes the number of nodes in the ring.
    ///
    /// Growing allocates new empty slots right after the back element, so
    /// the elements keep their order and `available()` is unchanged.
    ///
    /// Shrinking frees the oldest slots first. Empty slots go before live
    /// ones; once the buffer is full, every further node freed takes the
    /// front element with it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] when `new_capacity` is below
    /// [`MIN_CAPACITY`]; nothing changes.
    ///
    /// [`Error::AllocationFailure`] when the allocator runs out while
    /// growing. The nodes added before the failure are kept, so
    /// `capacity()` reports how far the ring got.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 5).unwrap();
    /// for i in 1..=5 {
    ///     ring.enqueue(i);
    /// }
    ///
    /// ring.resize(3).unwrap();
    /// assert_eq!(ring.capacity(), 3);
    /// assert_eq!(format!("{:?}", ring), "[3, 4, 5]");
    ///
    /// ring.resize(5).unwrap();
    /// ring.enqueue(6);
    /// assert_eq!(format!("{:?}", ring), "[3, 4, 5, 6]");
    /// ```
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        Self::check_capacity(new_capacity)?;

        let old_capacity = self.capacity;
        while self.capacity > new_capacity {
            self.unlink_after_tail();
        }
        while self.capacity < new_capacity {
            if let Err(err) = self.splice_after_tail() {
                warn!(
                    "ring buffer grew from {} to {} nodes of {} requested: {}",
                    old_capacity, self.capacity, new_capacity, err
                );
                return Err(err);
            }
        }
        debug!(
            "ring buffer resized from {} to {} nodes",
            old_capacity, new_capacity
        );
        Ok(())
    }

    /// Empties the buffer without touching any node.
    ///
    /// Elements still stored in the ring are dropped as they are
    /// overwritten, or when the ring is resized down or dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
    /// ring.enqueue(1);
    /// ring.enqueue(2);
    /// ring.clear();
    /// assert_eq!(ring.available(), 0);
    /// assert_eq!(ring.read(), None);
    ///
    /// ring.enqueue(3);
    /// assert_eq!(ring.dequeue(), Some(3));
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.count = 0;
        if self.capacity > 0 {
            self.head = self.next(self.tail);
        }
    }

    /// Moves the contents out into a new buffer, leaving `self` without
    /// nodes.
    ///
    /// The emptied buffer keeps the allocator, reports a capacity of `0`,
    /// hands every enqueued element straight back and can be brought back
    /// into service with [`resize`](RingBuffer::resize).
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 4).unwrap();
    /// ring.enqueue(1);
    ///
    /// let moved = ring.take();
    /// assert_eq!(moved.capacity(), 4);
    /// assert_eq!(moved.available(), 1);
    /// assert_eq!(ring.capacity(), 0);
    /// assert_eq!(ring.available(), 0);
    /// ```
    pub fn take(&mut self) -> Self {
        RingBuffer {
            nodes: mem::replace(&mut self.nodes, Arena::new()),
            head: mem::replace(&mut self.head, 0),
            tail: mem::replace(&mut self.tail, 0),
            capacity: mem::replace(&mut self.capacity, 0),
            count: mem::replace(&mut self.count, 0),
            allocator: self.allocator,
        }
    }

    /// Returns the number of nodes in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements in the buffer.
    #[inline]
    pub fn available(&self) -> usize {
        self.count
    }

    /// Same as [`available`](RingBuffer::available).
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the buffer contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the next `enqueue` will overwrite an element.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
    /// ring.enqueue(1);
    /// ring.enqueue(2);
    /// assert!(!ring.is_full());
    /// ring.enqueue(3);
    /// assert!(ring.is_full());
    /// ```
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Returns the allocator the nodes live in.
    #[inline]
    pub fn allocator(&self) -> &'a A {
        self.allocator
    }

    fn live(&self) -> Live<'_, 'a, T, A> {
        Live {
            ring: self,
            cursor: self.head,
            remaining: self.count,
        }
    }
}

impl<'a, T: Arithmetic, A: Allocator + ?Sized> RingBuffer<'a, T, A> {
    /// Returns the mean of the elements, or `0.0` if the buffer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodering::{Heap, RingBuffer};
    ///
    /// let mut ring = RingBuffer::new(&Heap, 5).unwrap();
    /// assert_eq!(ring.average(), 0.0);
    ///
    /// for i in 1..=5 {
    ///     ring.enqueue(i);
    /// }
    /// assert_eq!(ring.average(), 3.0);
    /// ```
    pub fn average(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.live().map(|x| x.to_f64()).sum();
        sum / self.count as f64
    }
}

impl<'a, T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for RingBuffer<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.live()).finish()
    }
}

/// Walks the live elements front to back.
struct Live<'r, 'a, T, A: Allocator + ?Sized> {
    ring: &'r RingBuffer<'a, T, A>,
    cursor: usize,
    remaining: usize,
}

impl<'r, 'a, T, A: Allocator + ?Sized> Iterator for Live<'r, 'a, T, A> {
    type Item = &'r T;

    fn next(&mut self) -> Option<&'r T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let node = self.ring.nodes.get(self.cursor);
        self.cursor = node.next;
        debug_assert!(node.value.is_some(), "live ring slot without an element");
        node.value.as_ref()
    }
}

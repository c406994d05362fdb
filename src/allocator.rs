//! Low level memory providers for ring nodes.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

/// A provider of raw memory blocks.
///
/// `RingBuffer` borrows an allocator for its whole lifetime and asks it
/// for one block per node. The allocator is never owned by the buffer.
///
/// # Safety
///
/// A block returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must not alias
/// any other live block until it is passed back to `free`.
pub unsafe trait Allocator {
    /// Returns a block fitting `layout`, or `None` if none is available.
    ///
    /// Failure is not fatal: callers unwind and report it.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this same allocator
    /// with the same `layout`, and must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<'a, A: Allocator + ?Sized> Allocator for &'a A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).free(ptr, layout)
    }
}

/// The global heap.
///
/// # Examples
///
/// ```
/// use nodering::{Heap, RingBuffer};
///
/// let mut ring = RingBuffer::new(&Heap, 3).unwrap();
/// ring.enqueue("a");
/// assert_eq!(ring.read(), Some(&"a"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Heap;

unsafe impl Allocator for Heap {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            // dangling but well aligned
            return NonNull::new(layout.align() as *mut u8);
        }
        NonNull::new(unsafe { alloc::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            alloc::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// An allocator adapter that keeps a tally of the blocks it hands out.
///
/// An optional limit caps the number of blocks outstanding at once;
/// requests beyond it fail as if the inner allocator were exhausted.
///
/// # Examples
///
/// ```
/// use nodering::{Counting, Error, Heap, RingBuffer};
///
/// let budget = Counting::with_limit(Heap, 4);
/// {
///     let ring = RingBuffer::<u8, _>::new(&budget, 4).unwrap();
///     assert_eq!(budget.outstanding(), 4);
///     assert!(matches!(
///         RingBuffer::<u8, _>::new(&budget, 3),
///         Err(Error::AllocationFailure { .. })
///     ));
///     drop(ring);
/// }
/// assert_eq!(budget.outstanding(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Counting<A> {
    inner: A,
    limit: Cell<Option<usize>>,
    allocations: Cell<usize>,
    frees: Cell<usize>,
    failures: Cell<usize>,
}

impl<A: Allocator> Counting<A> {
    /// Wraps `inner` without a limit.
    pub fn new(inner: A) -> Self {
        Counting {
            inner,
            limit: Cell::new(None),
            allocations: Cell::new(0),
            frees: Cell::new(0),
            failures: Cell::new(0),
        }
    }

    /// Wraps `inner`, allowing at most `limit` blocks outstanding.
    pub fn with_limit(inner: A, limit: usize) -> Self {
        Counting {
            limit: Cell::new(Some(limit)),
            ..Counting::new(inner)
        }
    }

    /// Number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Number of blocks returned so far.
    pub fn frees(&self) -> usize {
        self.frees.get()
    }

    /// Number of allocation requests that failed.
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Blocks handed out and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.allocations.get() - self.frees.get()
    }

    /// Changes the outstanding block limit.
    ///
    /// Takes effect on the next request, also for rings already built on
    /// this allocator.
    pub fn set_limit(&self, limit: Option<usize>) {
        self.limit.set(limit);
    }

    /// Returns the wrapped allocator.
    pub fn into_inner(self) -> A {
        self.inner
    }
}

unsafe impl<A: Allocator> Allocator for Counting<A> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let within_limit = self.limit.get().map_or(true, |limit| self.outstanding() < limit);
        let block = if within_limit {
            self.inner.allocate(layout)
        } else {
            None
        };
        match block {
            Some(_) => self.allocations.set(self.allocations.get() + 1),
            None => self.failures.set(self.failures.get() + 1),
        }
        block
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        debug_assert!(self.outstanding() > 0, "free without a matching allocation");
        self.frees.set(self.frees.get() + 1);
        self.inner.free(ptr, layout)
    }
}

use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::thread;

use nodering::{Allocator, Heap};

/// Heap allocator that remembers every live block.
///
/// Freeing an unknown block, or a block with the wrong layout, panics.
/// Dropping the ledger with blocks still live panics too.
#[derive(Default)]
pub struct Ledger {
    live: RefCell<HashMap<usize, Layout>>,
    attempts: Cell<usize>,
    allocations: Cell<usize>,
    frees: Cell<usize>,
    fail_on: Cell<Option<usize>>,
}

#[allow(dead_code)]
impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Makes the `nth` allocation attempt from now on fail (1-based).
    pub fn fail_on(&self, nth: usize) {
        self.fail_on.set(Some(self.attempts.get() + nth));
    }

    pub fn outstanding(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub fn frees(&self) -> usize {
        self.frees.get()
    }
}

unsafe impl Allocator for Ledger {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        if self.fail_on.get() == Some(attempt) {
            return None;
        }
        let block = Heap.allocate(layout)?;
        let previous = self.live.borrow_mut().insert(block.as_ptr() as usize, layout);
        assert!(previous.is_none(), "block handed out twice");
        self.allocations.set(self.allocations.get() + 1);
        Some(block)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        let recorded = self.live.borrow_mut().remove(&(ptr.as_ptr() as usize));
        assert_eq!(recorded, Some(layout), "unknown or double freed block");
        self.frees.set(self.frees.get() + 1);
        Heap.free(ptr, layout)
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        if !thread::panicking() {
            assert_eq!(self.outstanding(), 0, "leaked blocks");
            assert_eq!(self.allocations.get(), self.frees.get());
        }
    }
}

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use faer_core::Parallelism;
use swarm_qr_rs::{RegularizedSolver, SparseMatrix};

struct CountingAlloc;

static ALLOC_TOTAL: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ALLOC_TOTAL.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            ALLOC_TOTAL.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe {
            System.dealloc(ptr, layout);
        }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            ALLOC_TOTAL.fetch_add(new_size, Ordering::Relaxed);
        }
        new_ptr
    }
}

fn reset_alloc_counter() {
    ALLOC_TOTAL.store(0, Ordering::SeqCst);
}

fn allocated_bytes() -> usize {
    ALLOC_TOTAL.load(Ordering::SeqCst)
}

/// Ring of `agents` with one relative-offset row per edge and an anchor row.
fn ring_with_anchor(agents: usize) -> SparseMatrix {
    let mut entries = Vec::new();
    for edge in 0..agents {
        entries.push((edge, edge, -1.0));
        entries.push((edge, (edge + 1) % agents, 1.0));
    }
    entries.push((agents, 0, 1.0));
    SparseMatrix::from_triplets(agents + 1, agents, &entries).unwrap()
}

#[test]
fn regularized_solve_does_not_allocate() {
    let a = ring_with_anchor(32);
    let b: Vec<f64> = (0..a.nrows()).map(|i| (i % 3) as f64 - 1.0).collect();
    let mut x = vec![0.0; a.ncols()];

    let mut solver = RegularizedSolver::new(&a, Parallelism::None).unwrap();
    solver.solve(&a, 1e-3, &b, &mut x).unwrap();

    reset_alloc_counter();
    for lambda in [1e-3, 1e-2, 1e-1] {
        solver.solve(&a, lambda, &b, &mut x).unwrap();
    }
    let alloc = allocated_bytes();
    assert!(alloc <= 50_000, "allocations too high: {alloc}");
}

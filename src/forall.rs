//! Device-agnostic "parallel for" over elements.
//!
//! Every kernel in this crate is a map over element indices in which element `e` reads shared,
//! immutable input and writes only to its own contiguous chunk of the output. [`forall_elements`]
//! expresses exactly that, which lets the execution policy be swapped without touching the
//! kernels.
use crate::config::{ExecutionConfig, ExecutionPolicy};
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

/// Runs `f(scratch, e, output_e)` for every element `e`, where `output_e` is the `e`-th chunk
/// of length `chunk_len` of `output`.
///
/// Each worker creates its own scratch state with `init` and reuses it for all elements it
/// processes. No ordering between elements is guaranteed by the parallel policy.
///
/// # Panics
///
/// Panics if `chunk_len` is zero or does not divide the length of `output`.
pub fn forall_elements<T, S, I, F>(config: &ExecutionConfig, output: &mut [T], chunk_len: usize, init: I, f: F)
where
    T: Send,
    I: Fn() -> S + Sync + Send,
    F: Fn(&mut S, usize, &mut [T]) + Sync + Send,
{
    assert!(chunk_len > 0, "element chunks must be non-empty");
    assert_eq!(
        output.len() % chunk_len,
        0,
        "output length {} is not a multiple of the element chunk length {}",
        output.len(),
        chunk_len
    );

    match config.policy {
        ExecutionPolicy::Serial => {
            let mut scratch = init();
            for (e, output_e) in output.chunks_mut(chunk_len).enumerate() {
                f(&mut scratch, e, output_e);
            }
        }
        ExecutionPolicy::Parallel => {
            output
                .par_chunks_mut(chunk_len)
                .enumerate()
                .with_min_len(config.min_elements_per_task.max(1))
                .for_each_init(init, |scratch, (e, output_e)| f(scratch, e, output_e));
        }
    }
}

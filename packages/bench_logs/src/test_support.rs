//! Shared fixtures for unit tests.

/// A log with all six blocks of a three-worker sweep.
pub(crate) const SIX_BLOCK_LOG: &str = "\
#### SEQUENTIAL ####
sequential.sum_loop elapsed time : 0.31
#### ThreadPool ####
thread_pool.sum_loop(max_wks = 1) elapsed time : 0.32
thread_pool.sum_loop(max_wks = 2) elapsed time : 0.17
thread_pool.sum_loop(max_wks = 3) elapsed time : 0.12
#### ProcessPool ####
process_pool.sum_loop(max_wks = 1) elapsed time : 0.35
process_pool.sum_loop(max_wks = 2) elapsed time : 0.2
process_pool.sum_loop(max_wks = 3) elapsed time : 0.15
#### SEQUENTIAL-Vectorized ####
sequential.sum_vectorized elapsed time : 0.9
#### ThreadPool-Vectorized ####
thread_pool.sum_vectorized(max_wks = 1) elapsed time : 0.91
thread_pool.sum_vectorized(max_wks = 2) elapsed time : 0.47
thread_pool.sum_vectorized(max_wks = 3) elapsed time : 0.33
#### ProcessPool-Vectorized ####
process_pool.sum_vectorized(max_wks = 1) elapsed time : 0.95
process_pool.sum_vectorized(max_wks = 2) elapsed time : 0.52
process_pool.sum_vectorized(max_wks = 3) elapsed time : 0.36
";

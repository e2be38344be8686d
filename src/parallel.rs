//! Bounded worker pools for CPU-bound fan-out.
//!
//! Pools are built per component; rayon's global pool is never configured.

use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Pool with exactly `workers` threads (at least one)
pub fn worker_pool(workers: usize) -> Result<ThreadPool> {
    let workers = workers.max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("seaice-worker-{index}"))
        .build()?;
    debug!("Built worker pool with {} threads", pool.current_num_threads());
    Ok(pool)
}

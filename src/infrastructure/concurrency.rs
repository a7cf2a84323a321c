/// Concurrency management for codeatlas.
/// Configures the rayon pool used for parallel source parsing.

use anyhow::Result;
use tracing::debug;

/// Initialize the global rayon thread pool with controlled worker count.
/// Reserves ~50% of CPU capacity so the indexer stays polite on shared
/// machines; minimum 1 worker.
pub fn init_thread_pool() -> Result<()> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    debug!(workers, cores, "initialized thread pool");
    Ok(())
}

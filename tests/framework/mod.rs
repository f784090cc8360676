use anyhow::Result;

use deimos::prelude::*;

/// Grab a command buffer from the pool and run it through a full recording so
/// it can back a GPU task.
#[allow(dead_code)]
pub fn recorded_buffer(pool: &CommandBufferPool) -> Result<PooledCommandBuffer> {
    let mut buffer = pool.allocate()?;
    buffer.begin()?;
    buffer.finish()?;
    Ok(buffer)
}

/// Create a GPU task backed by a freshly recorded command buffer.
#[allow(dead_code)]
pub fn gpu_task(
    name: &str,
    pool: &CommandBufferPool,
    inputs: Vec<IoResource>,
    outputs: Vec<IoResource>,
) -> Result<PresentTask> {
    PresentTask::gpu(name, recorded_buffer(pool)?, inputs, outputs)
}

/// Create a CPU task whose callback does nothing.
#[allow(dead_code)]
pub fn noop_cpu_task(
    name: &str,
    inputs: Vec<IoResource>,
    outputs: Vec<IoResource>,
) -> Result<PresentTask> {
    PresentTask::cpu(name, || Ok(()), inputs, outputs)
}

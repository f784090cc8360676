use anyhow::Result;

use deimos::prelude::*;

mod framework;

#[test]
pub fn retain_release_is_balanced() -> Result<()> {
    let task = framework::noop_cpu_task("task", vec![], vec![])?;
    assert_eq!(task.reference_count(), 1);

    // A retain followed by a release is a no-op on observable state.
    let retained = task.clone();
    assert_eq!(task.reference_count(), 2);
    drop(retained);
    assert_eq!(task.reference_count(), 1);

    // N retains require exactly N releases.
    let handles: Vec<_> = (0..4).map(|_| task.clone()).collect();
    assert_eq!(task.reference_count(), 5);
    drop(handles);
    assert_eq!(task.reference_count(), 1);
    Ok(())
}

#[test]
pub fn group_retains_its_members() -> Result<()> {
    let task = framework::noop_cpu_task("task", vec![], vec![])?;
    let group = PresentTask::group("group", &[task.clone()], vec![], vec![], vec![])?;
    assert_eq!(task.reference_count(), 2);
    drop(group);
    assert_eq!(task.reference_count(), 1);
    Ok(())
}

#[test]
pub fn releasing_a_group_destroys_unreferenced_members() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(3)?;

    let survivor = framework::gpu_task("survivor", &pool, vec![], vec![])?;
    let group = {
        let doomed_a = framework::gpu_task("doomed-a", &pool, vec![], vec![])?;
        let doomed_b = framework::gpu_task("doomed-b", &pool, vec![], vec![])?;
        PresentTask::group(
            "group",
            &[survivor.clone(), doomed_a, doomed_b],
            vec![],
            vec![],
            vec![],
        )?
    };

    // All three buffers are owned by live tasks.
    assert_eq!(pool.available(), 0);
    assert_eq!(survivor.reference_count(), 2);

    drop(group);

    // Exactly the two otherwise unreferenced members were destroyed; their
    // command buffers came back to the pool. The externally retained member
    // survives with its count reduced by one.
    assert_eq!(pool.available(), 2);
    assert_eq!(survivor.reference_count(), 1);
    assert!(survivor.command_buffer().is_some());
    Ok(())
}

#[test]
pub fn dropping_a_gpu_task_returns_its_buffer() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let task = framework::gpu_task("draw", &pool, vec![], vec![])?;
    assert_eq!(pool.available(), 0);
    drop(task);
    assert_eq!(pool.available(), 1);
    Ok(())
}

#[test]
pub fn nested_release_cascades() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(2)?;
    let inner = {
        let a = framework::gpu_task("a", &pool, vec![], vec![])?;
        let b = framework::gpu_task("b", &pool, vec![], vec![])?;
        PresentTask::black_box("inner", &[a, b], BlackBoxPolicy::Parallel)?
    };
    let outer = PresentTask::group("outer", &[inner], vec![], vec![], vec![])?;

    assert_eq!(pool.available(), 0);
    // Releasing the outer group cascades through the inner group down to the
    // leaf GPU tasks and their buffers.
    drop(outer);
    assert_eq!(pool.available(), 2);
    Ok(())
}

#[test]
pub fn released_buffers_are_reset() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    {
        let mut buffer = pool.allocate()?;
        buffer.begin()?;
        buffer.finish()?;
        assert!(buffer.is_recorded());
    }
    // The record was reset on release and can be recorded again.
    let buffer = pool.allocate()?;
    assert_eq!(buffer.state(), CommandBufferState::Initial);
    Ok(())
}

#[test]
pub fn pool_reuses_and_grows() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(2)?;
    assert_eq!(pool.available(), 2);

    let first = pool.allocate()?;
    let second = pool.allocate()?;
    assert_eq!(pool.available(), 0);
    // The free-list is empty, so the pool allocates a fresh record.
    let third = pool.allocate()?;
    assert_eq!(pool.available(), 0);

    drop((first, second, third));
    assert_eq!(pool.available(), 3);
    Ok(())
}

#[test]
pub fn command_buffer_state_machine_rejects_illegal_transitions() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let mut buffer = pool.allocate()?;

    // finish() before begin()
    assert!(buffer.finish().is_err());

    buffer.begin()?;
    // begin() while already recording
    assert!(buffer.begin().is_err());

    buffer.finish()?;
    assert!(buffer.finish().is_err());
    assert!(buffer.is_recorded());

    buffer.reset();
    assert_eq!(buffer.state(), CommandBufferState::Initial);
    Ok(())
}

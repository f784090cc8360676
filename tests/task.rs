use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use deimos::prelude::*;

mod framework;

#[test]
pub fn cpu_task_resolves_declared_io() -> Result<()> {
    let positions = Buffer::new("positions");
    let indirect = Buffer::new("indirect");
    let target = Texture::new("target");
    let unrelated = Buffer::new("unrelated");

    let task = PresentTask::cpu(
        "cull",
        || Ok(()),
        vec![(&positions).into(), (&indirect).into()],
        vec![(&target).into()],
    )?;

    assert_eq!(task.task_type(), TaskType::Cpu);
    assert_eq!(task.io_count(IoDirection::Input)?, 2);
    assert_eq!(task.io_count(IoDirection::Output)?, 1);
    assert_eq!(
        task.io_index(IoDirection::Input, &(&positions).into())?,
        Some(0)
    );
    assert_eq!(
        task.io_index(IoDirection::Input, &(&indirect).into())?,
        Some(1)
    );
    assert_eq!(
        task.io_index(IoDirection::Output, &(&target).into())?,
        Some(0)
    );
    assert_eq!(
        task.io_index(IoDirection::Input, &(&unrelated).into())?,
        None,
        "An object that was never declared should not resolve"
    );
    assert_eq!(task.io_index(IoDirection::Output, &(&positions).into())?, None);
    Ok(())
}

#[test]
pub fn cpu_task_runs_its_callback() -> Result<()> {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let task = PresentTask::cpu(
        "tick",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        vec![],
        vec![],
    )?;

    task.execute_cpu()?;
    task.execute_cpu()?;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
pub fn execute_cpu_rejects_gpu_tasks() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let task = framework::gpu_task("draw", &pool, vec![], vec![])?;
    let result = task.execute_cpu();
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::TaskTypeMismatch {
            ..
        })
    ));
    Ok(())
}

#[test]
pub fn duplicate_io_is_rejected() -> Result<()> {
    let buffer = Buffer::new("buffer");
    let result = PresentTask::cpu(
        "broken",
        || Ok(()),
        vec![(&buffer).into(), (&buffer).into()],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::DuplicateIo(_))
    ));
    Ok(())
}

#[test]
pub fn gpu_task_requires_recorded_buffer() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let buffer = pool.allocate()?;
    assert!(!buffer.is_recorded());

    let result = PresentTask::gpu("draw", buffer, vec![], vec![]);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::CommandBufferNotRecorded)
    ));
    // The rejected buffer was released back to the pool, nothing was
    // partially constructed.
    assert_eq!(pool.available(), 1);
    Ok(())
}

#[test]
pub fn gpu_task_owns_its_buffer() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let task = framework::gpu_task("draw", &pool, vec![], vec![])?;
    let buffer = task.command_buffer().expect("GPU task should own a command buffer");
    assert!(buffer.is_recorded());
    assert_eq!(pool.available(), 0);
    Ok(())
}

#[test]
pub fn io_index_out_of_range_fails() -> Result<()> {
    let task = framework::noop_cpu_task("empty", vec![], vec![])?;
    let result = task.io(IoDirection::Input, 0);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::InvalidIoIndex {
            ..
        })
    ));
    Ok(())
}

#[test]
pub fn group_of_groups_resolves_leaf_io() -> Result<()> {
    let pool = CommandBufferPool::with_capacity(1)?;
    let uniforms = Buffer::new("uniforms");
    let color = Texture::new("color");

    let leaf = framework::gpu_task(
        "leaf",
        &pool,
        vec![(&uniforms).into()],
        vec![(&color).into()],
    )?;
    let inner = PresentTask::group(
        "inner",
        &[leaf.clone()],
        vec![],
        vec![GroupMapping::input(0, 0, 0)],
        vec![GroupMapping::output(0, 0, 0)],
    )?;
    let outer = PresentTask::group(
        "outer",
        &[inner],
        vec![],
        vec![GroupMapping::input(0, 0, 0)],
        vec![GroupMapping::output(0, 0, 0)],
    )?;

    // Resolution recurses through both group levels to the leaf that actually
    // owns the IO, then translates back to an outer group index.
    let index = outer
        .io_index(IoDirection::Output, &(&color).into())?
        .expect("The outer group should expose the leaf's output");
    assert_eq!(index, 0);
    let resolved = outer.io(IoDirection::Output, index)?;
    assert_eq!(resolved.id(), IoResource::from(&color).id());
    assert_eq!(
        outer.io(IoDirection::Input, 0)?.id(),
        IoResource::from(&uniforms).id()
    );
    assert_eq!(leaf.io_count(IoDirection::Input)?, 1);
    Ok(())
}

#[test]
pub fn group_validation_rejects_empty_member_list() -> Result<()> {
    let result = PresentTask::group("empty", &[], vec![], vec![], vec![]);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::EmptyGroup)
    ));
    Ok(())
}

#[test]
pub fn group_validation_rejects_duplicate_members() -> Result<()> {
    let task = framework::noop_cpu_task("task", vec![], vec![])?;
    let result = PresentTask::group("group", &[task.clone(), task], vec![], vec![], vec![]);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::DuplicateSubtask(_))
    ));
    Ok(())
}

#[test]
pub fn group_validation_rejects_invalid_indices() -> Result<()> {
    let buffer = Buffer::new("buffer");
    let task = framework::noop_cpu_task("task", vec![(&buffer).into()], vec![])?;

    // Member index out of range.
    let result = PresentTask::group(
        "group",
        &[task.clone()],
        vec![],
        vec![GroupMapping::input(0, 1, 0)],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::InvalidMemberIndex {
            ..
        })
    ));

    // IO index out of range for the member.
    let result = PresentTask::group(
        "group",
        &[task],
        vec![],
        vec![GroupMapping::input(0, 0, 3)],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::InvalidIoIndex {
            ..
        })
    ));
    Ok(())
}

#[test]
pub fn group_validation_rejects_unmapped_group_io() -> Result<()> {
    let buffer = Buffer::new("buffer");
    let task = framework::noop_cpu_task("task", vec![(&buffer).into()], vec![])?;

    // Group index 1 is referenced, group index 0 has no mapping.
    let result = PresentTask::group(
        "group",
        &[task],
        vec![],
        vec![GroupMapping::input(1, 0, 0)],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::UnmappedGroupIo(0))
    ));
    Ok(())
}

#[test]
pub fn group_validation_rejects_incompatible_fan_in() -> Result<()> {
    let buffer = Buffer::new("buffer");
    let color = Texture::new("color");
    let reader = framework::noop_cpu_task(
        "reader",
        vec![(&buffer).into(), (&color).into()],
        vec![],
    )?;

    // Both mappings target group input 0, but resolve to a buffer and an
    // unrelated texture.
    let result = PresentTask::group(
        "group",
        &[reader],
        vec![],
        vec![GroupMapping::input(0, 0, 0), GroupMapping::input(0, 0, 1)],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::IncompatibleMapping {
            ..
        })
    ));
    Ok(())
}

#[test]
pub fn group_validation_accepts_aliased_fan_in() -> Result<()> {
    let color = Texture::new("color");
    let view = color.view("color-view");
    let reader = framework::noop_cpu_task(
        "reader",
        vec![(&color).into(), (&view).into()],
        vec![],
    )?;

    // A texture and a view over it are the same dependency, so fanning both
    // into one group-level input is legal.
    let group = PresentTask::group(
        "group",
        &[reader],
        vec![],
        vec![GroupMapping::input(0, 0, 0), GroupMapping::input(0, 0, 1)],
        vec![],
    )?;
    assert_eq!(group.io_count(IoDirection::Input)?, 1);
    Ok(())
}

#[test]
pub fn group_validation_rejects_cyclic_connections() -> Result<()> {
    let ping = Buffer::new("ping");
    let pong = Buffer::new("pong");
    let a = framework::noop_cpu_task("a", vec![(&ping).into()], vec![(&pong).into()])?;
    let b = framework::noop_cpu_task("b", vec![(&pong).into()], vec![(&ping).into()])?;

    let result = PresentTask::group(
        "group",
        &[a, b],
        vec![
            IngroupConnection::new(MemberIo::new(0, 0), MemberIo::new(1, 0)),
            IngroupConnection::new(MemberIo::new(1, 0), MemberIo::new(0, 0)),
        ],
        vec![],
        vec![],
    );
    assert!(matches!(
        result.unwrap_err().downcast_ref::<Error>(),
        Some(Error::GraphHasCycle)
    ));
    Ok(())
}

#[test]
pub fn group_introspection() -> Result<()> {
    let color = Texture::new("color");
    let writer = framework::noop_cpu_task("writer", vec![], vec![(&color).into()])?;
    let reader = framework::noop_cpu_task("reader", vec![(&color).into()], vec![])?;

    let group = PresentTask::group(
        "group",
        &[writer.clone(), reader],
        vec![IngroupConnection::new(MemberIo::new(0, 0), MemberIo::new(1, 0))],
        vec![],
        vec![GroupMapping::output(0, 0, 0)],
    )?;

    assert_eq!(group.task_type(), TaskType::Group);
    assert_eq!(group.subtask_count()?, 2);
    assert!(group.subtask(0)?.same_task(&writer));
    assert_eq!(group.ingroup_connections()?.len(), 1);
    assert_eq!(group.io_mappings(IoDirection::Output)?.len(), 1);
    assert!(group.subtask(5).is_err());
    Ok(())
}

//! tally task command implementations (add / list / update / rm).

use chrono::Utc;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{NewTask, SortField, Task, TaskFilter, TaskPatch, TaskView};

pub struct AddOptions {
    pub title: String,
    pub start: String,
    pub end: String,
    pub priority: Option<u8>,
    pub status: Option<String>,
}

pub struct ListOptions {
    pub priority: Option<u8>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

pub struct UpdateOptions {
    pub id: String,
    pub status: Option<String>,
    pub end: Option<String>,
    pub priority: Option<u8>,
}

#[derive(serde::Serialize)]
struct ListReport {
    owner: String,
    count: usize,
    tasks: Vec<TaskView>,
}

#[derive(serde::Serialize)]
struct RmReport {
    owner: String,
    deleted: Task,
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let owner = ctx.owner()?;
    let status = options.status.as_deref().map(str::parse).transpose()?;

    let view = ctx.store().create(
        &owner,
        NewTask {
            title: options.title,
            start_time: options.start,
            end_time: options.end,
            priority: options
                .priority
                .unwrap_or(ctx.config.tasks.default_priority),
            status,
        },
    )?;

    let mut human = HumanOutput::new(format!("Added task {} for {owner}", view.task.seq));
    human.push_summary("title", view.task.title.clone());
    human.push_summary("id", view.task.id.clone());
    human.push_summary("priority", view.task.priority.to_string());
    human.push_summary("status", view.task.status.to_string());
    if let Some(hours) = view.total_hours {
        human.push_summary("total_hours", format!("{hours:.2}"));
    }
    // Accepted but worth surfacing: it produces a negative duration in the
    // statistics (see stats module).
    if let (Some(start), Some(end)) = (view.task.start(), view.task.end()) {
        if end < start {
            human.push_warning("end time is before start time".to_string());
        }
    }

    emit_success(ctx.output, "add", &view, Some(&human))
}

pub fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let owner = ctx.owner()?;

    let filter = TaskFilter {
        priority: options.priority,
        status: options.status.as_deref().map(str::parse).transpose()?,
    };
    let sort: SortField = options
        .sort
        .as_deref()
        .unwrap_or(&ctx.config.tasks.default_sort)
        .parse()?;

    let views = ctx.store().list(&owner, filter, sort)?;

    let mut human = HumanOutput::new(format!("{} task(s) for {owner}", views.len()));
    for view in &views {
        let hours = view
            .total_hours
            .map(|h| format!("{h:.2}h"))
            .unwrap_or_else(|| "?".to_string());
        human.push_detail(format!(
            "#{} [{}] p{} {} ({} -> {}, {hours})",
            view.task.seq,
            view.task.status,
            view.task.priority,
            view.task.title,
            view.task.start_time,
            view.task.end_time,
        ));
    }

    let report = ListReport {
        owner,
        count: views.len(),
        tasks: views,
    };
    emit_success(ctx.output, "list", &report, Some(&human))
}

pub fn run_update(ctx: &Context, options: UpdateOptions) -> Result<()> {
    let owner = ctx.owner()?;

    let patch = TaskPatch {
        status: options.status.as_deref().map(str::parse).transpose()?,
        end_time: options.end,
        priority: options.priority,
    };
    // The clock is read once here and threaded through, so the finish
    // stamp is deterministic under test.
    let view = ctx.store().update(&owner, &options.id, patch, Utc::now())?;

    let mut human = HumanOutput::new(format!("Updated task {}", view.task.seq));
    human.push_summary("status", view.task.status.to_string());
    human.push_summary("priority", view.task.priority.to_string());
    human.push_summary("end_time", view.task.end_time.clone());
    if view
        .task
        .end()
        .zip(view.task.start())
        .is_some_and(|(end, start)| end < start)
    {
        human.push_warning("end time is before start time".to_string());
    }

    emit_success(ctx.output, "update", &view, Some(&human))
}

pub fn run_rm(ctx: &Context, id: String) -> Result<()> {
    let owner = ctx.owner()?;
    let deleted = ctx.store().delete(&owner, &id)?;

    let mut human = HumanOutput::new(format!("Deleted task {}", deleted.seq));
    human.push_summary("title", deleted.title.clone());
    human.push_summary("id", deleted.id.clone());

    let report = RmReport { owner, deleted };
    emit_success(ctx.output, "rm", &report, Some(&human))
}

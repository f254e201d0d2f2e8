//! Task records and the per-owner task store.
//!
//! Each owner's tasks live in one JSON document (`tasks.json`) next to a
//! sequence counter (`seq.json`). Every mutation runs under that owner's
//! file lock, which serializes sequence allocation and keeps the counter
//! the single source of truth for the next human-facing task number.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::TasksConfig;
use crate::error::{Error, FieldError, Result};
use crate::lock::OwnerLock;
use crate::stats::{self, StatsSnapshot};
use crate::storage::Storage;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// Task status. `Pending -> Finished` is the only exposed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Finished,
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "finished" => Ok(Status::Finished),
            other => Err(Error::InvalidArgument(format!(
                "unknown status '{other}' (expected pending|finished)"
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "Pending"),
            Status::Finished => write!(f, "Finished"),
        }
    }
}

/// A stored task record.
///
/// Timestamps are kept as text. They are validated at creation, but a
/// record read back from disk is not revalidated, so readers parse them
/// defensively (see [`Task::start`] / [`Task::end`] and the aggregator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque store identifier (ULID), assigned at creation
    pub id: String,
    /// Owning user, immutable
    pub owner: String,
    /// Per-owner sequence number, starts at 1, immutable
    pub seq: u64,
    pub title: String,
    /// RFC 3339 text, immutable after creation
    pub start_time: String,
    /// RFC 3339 text, mutable via update / finish stamping
    pub end_time: String,
    /// 1 (highest) through 5
    pub priority: u8,
    pub status: Status,
}

impl Task {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_time)
    }

    /// `(end - start)` in hours, rounded to 2 decimals. `None` when either
    /// timestamp fails to parse.
    pub fn total_hours(&self) -> Option<f64> {
        let start = self.start()?;
        let end = self.end()?;
        Some(round2(hours_between(start, end)))
    }
}

/// Response shape for create/list: the record plus derived `total_hours`,
/// which is computed on every read and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<f64>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        let total_hours = task.total_hours();
        Self { task, total_hours }
    }
}

/// Input for task creation. `seq` and `id` are always server-assigned.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub priority: u8,
    pub status: Option<Status>,
}

impl NewTask {
    /// Collect all field-level problems before any store access.
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title is required"));
        }
        if parse_timestamp(&self.start_time).is_none() {
            errors.push(FieldError::new(
                "start_time",
                format!("'{}' is not a valid timestamp", self.start_time),
            ));
        }
        if parse_timestamp(&self.end_time).is_none() {
            errors.push(FieldError::new(
                "end_time",
                format!("'{}' is not a valid timestamp", self.end_time),
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            errors.push(FieldError::new(
                "priority",
                format!(
                    "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {}",
                    self.priority
                ),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// Partial update applied by `TaskStore::update`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<Status>,
    pub end_time: Option<String>,
    pub priority: Option<u8>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.end_time.is_none() && self.priority.is_none()
    }
}

/// Listing filter. Fields combine with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub priority: Option<u8>,
    pub status: Option<Status>,
}

/// Sortable fields for `list`, always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Start,
    End,
    Priority,
    Seq,
    Title,
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" | "start_time" => Ok(SortField::Start),
            "end" | "end_time" => Ok(SortField::End),
            "priority" => Ok(SortField::Priority),
            "seq" => Ok(SortField::Seq),
            "title" => Ok(SortField::Title),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort field '{other}' (expected start|end|priority|seq|title)"
            ))),
        }
    }
}

/// Per-owner sequence counter, persisted as `seq.json`.
///
/// Invariant: `last >= max(seq)` over the owner's tasks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct SeqCounter {
    last: u64,
}

/// Per-owner JSON document store for tasks.
#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(storage: Storage, config: TasksConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create a task: validate, allocate the next sequence number under the
    /// owner's lock, persist, and return the record with `total_hours`.
    pub fn create(&self, owner: &str, new: NewTask) -> Result<TaskView> {
        new.validate()?;

        let _lock = self.lock(owner)?;
        let mut tasks = self.load_tasks(owner)?;
        let seq = self.next_seq(owner, &tasks)?;

        let task = Task {
            id: Ulid::new().to_string().to_lowercase(),
            owner: owner.to_string(),
            seq,
            title: new.title.trim().to_string(),
            start_time: new.start_time.trim().to_string(),
            end_time: new.end_time.trim().to_string(),
            priority: new.priority,
            status: new.status.unwrap_or(Status::Pending),
        };

        tracing::debug!(owner, seq, id = %task.id, "creating task");

        // Counter first: a crash between the two writes leaves a gap in the
        // sequence, which is harmless. The reverse order could hand out a
        // duplicate.
        self.storage
            .write_json(&self.storage.seq_file(owner), &SeqCounter { last: seq })?;
        tasks.push(task.clone());
        self.storage
            .write_json(&self.storage.tasks_file(owner), &tasks)?;

        Ok(task.into())
    }

    /// List an owner's tasks, filtered and sorted ascending by `sort`.
    pub fn list(
        &self,
        owner: &str,
        filter: TaskFilter,
        sort: SortField,
    ) -> Result<Vec<TaskView>> {
        let mut tasks = self.load_tasks(owner)?;

        if let Some(priority) = filter.priority {
            tasks.retain(|task| task.priority == priority);
        }
        if let Some(status) = filter.status {
            tasks.retain(|task| task.status == status);
        }

        sort_tasks(&mut tasks, sort);
        Ok(tasks.into_iter().map(TaskView::from).collect())
    }

    /// Apply a patch to one task. The status state machine allows only
    /// `Pending -> Finished`; finishing without an explicit `end_time`
    /// stamps it from the injected `now`.
    pub fn update(
        &self,
        owner: &str,
        id: &str,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<TaskView> {
        if patch.is_empty() {
            return Err(Error::InvalidArgument(
                "nothing to update (set --status, --end, or --priority)".to_string(),
            ));
        }
        if let Some(priority) = patch.priority {
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
                return Err(Error::Validation(vec![FieldError::new(
                    "priority",
                    format!("priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}"),
                )]));
            }
        }
        if let Some(end) = patch.end_time.as_deref() {
            if parse_timestamp(end).is_none() {
                return Err(Error::Validation(vec![FieldError::new(
                    "end_time",
                    format!("'{end}' is not a valid timestamp"),
                )]));
            }
        }

        let _lock = self.lock(owner)?;
        let mut tasks = self.load_tasks(owner)?;
        let index = match find_index(&tasks, id) {
            Some(index) => index,
            None => return Err(self.classify_missing(owner, id)?),
        };

        let task = &mut tasks[index];
        if let Some(status) = patch.status {
            match (task.status, status) {
                (Status::Pending, Status::Finished) => {
                    task.status = Status::Finished;
                    if patch.end_time.is_none() {
                        task.end_time = now.to_rfc3339_opts(SecondsFormat::Secs, true);
                    }
                }
                (Status::Finished, Status::Pending) => {
                    return Err(Error::InvalidArgument(
                        "a finished task cannot go back to pending".to_string(),
                    ));
                }
                // Setting the current status again is a no-op; in particular
                // re-finishing does not restamp end_time.
                _ => {}
            }
        }
        if let Some(end) = patch.end_time {
            task.end_time = end.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }

        let updated = task.clone();
        self.storage
            .write_json(&self.storage.tasks_file(owner), &tasks)?;

        Ok(updated.into())
    }

    /// Delete one task, gated on ownership before any mutation: the record
    /// is only ever removed from the caller's own store, after it has been
    /// found there.
    pub fn delete(&self, owner: &str, id: &str) -> Result<Task> {
        let _lock = self.lock(owner)?;
        let mut tasks = self.load_tasks(owner)?;
        let index = match find_index(&tasks, id) {
            Some(index) => index,
            None => return Err(self.classify_missing(owner, id)?),
        };

        let removed = tasks.remove(index);
        self.storage
            .write_json(&self.storage.tasks_file(owner), &tasks)?;

        tracing::debug!(owner, id = %removed.id, seq = removed.seq, "deleted task");
        Ok(removed)
    }

    /// Point-in-time statistics over all of the owner's tasks.
    pub fn statistics(&self, owner: &str, now: DateTime<Utc>) -> Result<StatsSnapshot> {
        let tasks = self.load_tasks(owner)?;
        Ok(stats::summarize(&tasks, now))
    }

    pub fn load_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        Ok(self
            .storage
            .read_json(&self.storage.tasks_file(owner))?
            .unwrap_or_default())
    }

    fn lock(&self, owner: &str) -> Result<OwnerLock> {
        OwnerLock::acquire(self.storage.lock_file(owner), self.config.lock_timeout_ms)
    }

    /// Next sequence number for `owner`. Must be called with the owner's
    /// lock held.
    ///
    /// The counter file is authoritative. When it is missing (store created
    /// before counters existed, or hand-copied), it is rebuilt from the
    /// highest sequence number actually present.
    fn next_seq(&self, owner: &str, tasks: &[Task]) -> Result<u64> {
        let max_seq = tasks.iter().map(|task| task.seq).max().unwrap_or(0);
        let counter: Option<SeqCounter> = self.storage.read_json(&self.storage.seq_file(owner))?;
        let last = match counter {
            Some(counter) => counter.last.max(max_seq),
            None => max_seq,
        };
        Ok(last + 1)
    }

    /// Distinguish "no such task" from "someone else's task" for a miss in
    /// the caller's store. Only opaque ids are searched across owners;
    /// sequence numbers are per-owner and collide by design, so a foreign
    /// match on one would be meaningless.
    fn classify_missing(&self, owner: &str, id: &str) -> Result<Error> {
        if id.parse::<u64>().is_err() {
            for other in self.storage.list_owners()? {
                if other == owner {
                    continue;
                }
                let tasks = self.load_tasks(&other)?;
                if tasks.iter().any(|task| task.id.eq_ignore_ascii_case(id)) {
                    return Ok(Error::Forbidden {
                        id: id.to_string(),
                        holder: other,
                    });
                }
            }
        }
        Ok(Error::TaskNotFound(id.to_string()))
    }
}

/// Resolve a task reference: a plain integer matches the per-owner
/// sequence number, anything else matches the opaque id.
fn find_index(tasks: &[Task], id: &str) -> Option<usize> {
    if let Ok(seq) = id.parse::<u64>() {
        return tasks.iter().position(|task| task.seq == seq);
    }
    tasks
        .iter()
        .position(|task| task.id.eq_ignore_ascii_case(id.trim()))
}

fn sort_tasks(tasks: &mut [Task], sort: SortField) {
    match sort {
        // Unparsable timestamps sort first (None < Some).
        SortField::Start => tasks.sort_by_key(|task| (task.start(), task.seq)),
        SortField::End => tasks.sort_by_key(|task| (task.end(), task.seq)),
        SortField::Priority => tasks.sort_by_key(|task| (task.priority, task.seq)),
        SortField::Seq => tasks.sort_by_key(|task| task.seq),
        SortField::Title => {
            tasks.sort_by(|a, b| a.title.cmp(&b.title).then(a.seq.cmp(&b.seq)))
        }
    }
}

/// Lenient timestamp parsing: RFC 3339 first, then naive date-times
/// (assumed UTC) with or without seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Signed duration from `start` to `end` in fractional hours.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! On-demand task statistics.
//!
//! [`summarize`] is a pure function of a task list and an injected `now`,
//! so the CLI reads the clock exactly once per invocation and tests pin it.
//!
//! Semantics worth calling out:
//! - A task whose `start_time` or `end_time` does not parse is counted in
//!   the totals and percentages but contributes to no time sum and to no
//!   priority bucket.
//! - Pending time-lapsed clamps to 0 before the task starts; pending
//!   time-left clamps to 0 once it is overdue.
//! - Finished durations are not clamped: `end < start` contributes a
//!   negative duration and pulls the average down.
//! - The average divisor counts every finished task, including ones whose
//!   timestamps were skipped as malformed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{hours_between, Status, Task};

/// Per-priority breakdown. One record shape regardless of which status
/// shows up first at a priority; unused sides stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriorityBucket {
    pub pending_count: u64,
    pub completed_count: u64,
    /// Hours already spent on pending tasks at this priority
    pub time_lapsed: f64,
    /// Hours remaining until pending deadlines at this priority
    pub time_left: f64,
    /// Hours taken by finished tasks at this priority
    pub total_time_taken: f64,
}

/// Point-in-time summary of one owner's tasks.
///
/// Ratio and hour totals are fixed-point text with exactly two decimals,
/// the shape callers render directly.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_tasks: usize,
    pub completed_percentage: String,
    pub pending_percentage: String,
    pub total_pending_tasks: usize,
    pub stats_by_priority: BTreeMap<u8, PriorityBucket>,
    pub total_time_lapsed: String,
    pub total_time_to_finish: String,
    pub average_time: String,
}

/// Compute the snapshot. Pure; owns no state between calls.
pub fn summarize(tasks: &[Task], now: DateTime<Utc>) -> StatsSnapshot {
    let total_tasks = tasks.len();
    let finished_count = tasks
        .iter()
        .filter(|task| task.status == Status::Finished)
        .count();
    let pending_count = total_tasks - finished_count;

    let mut total_time_lapsed = 0.0;
    let mut total_time_to_finish = 0.0;
    let mut finished_hours = 0.0;
    let mut stats_by_priority: BTreeMap<u8, PriorityBucket> = BTreeMap::new();

    for task in tasks {
        // Malformed timestamps: counted above, excluded from every sum
        // and from the priority buckets.
        let (Some(start), Some(end)) = (task.start(), task.end()) else {
            continue;
        };

        match task.status {
            Status::Pending => {
                let lapsed = if now < start {
                    0.0
                } else {
                    hours_between(start, now)
                };
                let left = if now > end {
                    0.0
                } else {
                    hours_between(now, end)
                };

                total_time_lapsed += lapsed;
                total_time_to_finish += left;

                let bucket = stats_by_priority.entry(task.priority).or_default();
                bucket.pending_count += 1;
                bucket.time_lapsed += lapsed;
                bucket.time_left += left;
            }
            Status::Finished => {
                let taken = hours_between(start, end);
                finished_hours += taken;

                let bucket = stats_by_priority.entry(task.priority).or_default();
                bucket.completed_count += 1;
                bucket.total_time_taken += taken;
            }
        }
    }

    let average_time = finished_hours / finished_count.max(1) as f64;

    StatsSnapshot {
        total_tasks,
        completed_percentage: format_percentage(finished_count, total_tasks),
        pending_percentage: format_percentage(pending_count, total_tasks),
        total_pending_tasks: pending_count,
        stats_by_priority,
        total_time_lapsed: fixed2(total_time_lapsed),
        total_time_to_finish: fixed2(total_time_to_finish),
        average_time: fixed2(average_time),
    }
}

fn format_percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    fixed2(count as f64 / total as f64 * 100.0)
}

fn fixed2(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn task(priority: u8, status: Status, start: &str, end: &str) -> Task {
        Task {
            id: format!("task-{priority}-{start}"),
            owner: "alice".to_string(),
            seq: 1,
            title: "test".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            priority,
            status,
        }
    }

    fn rfc3339(at: DateTime<Utc>) -> String {
        at.to_rfc3339()
    }

    #[test]
    fn empty_input_yields_zero_snapshot() {
        let snapshot = summarize(&[], now());
        assert_eq!(snapshot.total_tasks, 0);
        assert_eq!(snapshot.completed_percentage, "0.00");
        assert_eq!(snapshot.pending_percentage, "0.00");
        assert_eq!(snapshot.total_pending_tasks, 0);
        assert!(snapshot.stats_by_priority.is_empty());
        assert_eq!(snapshot.total_time_lapsed, "0.00");
        assert_eq!(snapshot.total_time_to_finish, "0.00");
        assert_eq!(snapshot.average_time, "0.00");
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let tasks = vec![
            task(
                1,
                Status::Finished,
                "2024-01-01T00:00:00Z",
                "2024-01-01T01:00:00Z",
            ),
            task(
                2,
                Status::Pending,
                "2024-01-01T00:00:00Z",
                "2024-12-01T00:00:00Z",
            ),
            task(
                2,
                Status::Pending,
                "2024-01-01T00:00:00Z",
                "2024-12-01T00:00:00Z",
            ),
        ];
        let snapshot = summarize(&tasks, now());
        assert_eq!(snapshot.completed_percentage, "33.33");
        assert_eq!(snapshot.pending_percentage, "66.67");

        let completed: f64 = snapshot.completed_percentage.parse().unwrap();
        let pending: f64 = snapshot.pending_percentage.parse().unwrap();
        assert!((completed + pending - 100.0).abs() < 0.011);
    }

    #[test]
    fn finished_six_hour_task() {
        // One finished task, priority 3, 00:00 -> 06:00.
        let tasks = vec![task(
            3,
            Status::Finished,
            "2024-01-01T00:00",
            "2024-01-01T06:00",
        )];
        let snapshot = summarize(&tasks, now());

        assert_eq!(snapshot.average_time, "6.00");
        let bucket = &snapshot.stats_by_priority[&3];
        assert_eq!(bucket.completed_count, 1);
        assert_eq!(bucket.total_time_taken, 6.0);
        assert_eq!(bucket.pending_count, 0);
    }

    #[test]
    fn pending_task_lapsed_and_left() {
        // Pending, priority 1, started 2h ago, due in 3h.
        let tasks = vec![task(
            1,
            Status::Pending,
            &rfc3339(now() - Duration::hours(2)),
            &rfc3339(now() + Duration::hours(3)),
        )];
        let snapshot = summarize(&tasks, now());

        assert_eq!(snapshot.total_time_lapsed, "2.00");
        assert_eq!(snapshot.total_time_to_finish, "3.00");
        let bucket = &snapshot.stats_by_priority[&1];
        assert_eq!(bucket.pending_count, 1);
        assert_eq!(bucket.time_lapsed, 2.0);
        assert_eq!(bucket.time_left, 3.0);
    }

    #[test]
    fn future_start_clamps_lapsed_to_zero() {
        let tasks = vec![task(
            2,
            Status::Pending,
            &rfc3339(now() + Duration::hours(1)),
            &rfc3339(now() + Duration::hours(4)),
        )];
        let snapshot = summarize(&tasks, now());
        assert_eq!(snapshot.total_time_lapsed, "0.00");
        assert_eq!(snapshot.total_time_to_finish, "3.00");
    }

    #[test]
    fn overdue_task_clamps_left_to_zero() {
        let tasks = vec![task(
            2,
            Status::Pending,
            &rfc3339(now() - Duration::hours(4)),
            &rfc3339(now() - Duration::hours(1)),
        )];
        let snapshot = summarize(&tasks, now());
        assert_eq!(snapshot.total_time_lapsed, "4.00");
        assert_eq!(snapshot.total_time_to_finish, "0.00");
    }

    #[test]
    fn malformed_timestamp_counts_but_contributes_nothing() {
        let tasks = vec![
            task(1, Status::Pending, "garbage", "2024-12-01T00:00:00Z"),
            task(
                1,
                Status::Pending,
                &rfc3339(now() - Duration::hours(2)),
                &rfc3339(now() + Duration::hours(3)),
            ),
        ];
        let snapshot = summarize(&tasks, now());

        // Both counted...
        assert_eq!(snapshot.total_tasks, 2);
        assert_eq!(snapshot.total_pending_tasks, 2);
        assert_eq!(snapshot.pending_percentage, "100.00");
        // ...but only the valid one reaches the sums and its bucket.
        assert_eq!(snapshot.total_time_lapsed, "2.00");
        assert_eq!(snapshot.stats_by_priority[&1].pending_count, 1);
    }

    #[test]
    fn malformed_finished_task_still_divides_the_average() {
        let tasks = vec![
            task(
                3,
                Status::Finished,
                "2024-01-01T00:00:00Z",
                "2024-01-01T06:00:00Z",
            ),
            task(3, Status::Finished, "garbage", "2024-01-01T06:00:00Z"),
        ];
        let snapshot = summarize(&tasks, now());
        // 6 hours over 2 finished tasks, one of them skipped for time sums.
        assert_eq!(snapshot.average_time, "3.00");
        assert_eq!(snapshot.stats_by_priority[&3].completed_count, 1);
    }

    #[test]
    fn bucket_holds_both_statuses_at_one_priority() {
        let tasks = vec![
            task(
                2,
                Status::Pending,
                &rfc3339(now() - Duration::hours(1)),
                &rfc3339(now() + Duration::hours(1)),
            ),
            task(
                2,
                Status::Finished,
                "2024-01-01T00:00:00Z",
                "2024-01-01T02:00:00Z",
            ),
        ];
        let snapshot = summarize(&tasks, now());

        let bucket = &snapshot.stats_by_priority[&2];
        assert_eq!(bucket.pending_count, 1);
        assert_eq!(bucket.completed_count, 1);
        assert_eq!(bucket.time_lapsed, 1.0);
        assert_eq!(bucket.time_left, 1.0);
        assert_eq!(bucket.total_time_taken, 2.0);
        assert_eq!(snapshot.stats_by_priority.len(), 1);
    }

    #[test]
    fn inverted_finished_duration_goes_negative() {
        let tasks = vec![task(
            4,
            Status::Finished,
            "2024-01-01T06:00:00Z",
            "2024-01-01T00:00:00Z",
        )];
        let snapshot = summarize(&tasks, now());
        assert_eq!(snapshot.average_time, "-6.00");
        assert_eq!(snapshot.stats_by_priority[&4].total_time_taken, -6.0);
    }

    #[test]
    fn no_finished_tasks_guards_average_divisor() {
        let tasks = vec![task(
            1,
            Status::Pending,
            &rfc3339(now() - Duration::hours(1)),
            &rfc3339(now() + Duration::hours(1)),
        )];
        let snapshot = summarize(&tasks, now());
        assert_eq!(snapshot.average_time, "0.00");
    }

    #[test]
    fn snapshot_serializes_with_string_keys() {
        let tasks = vec![task(
            3,
            Status::Finished,
            "2024-01-01T00:00:00Z",
            "2024-01-01T06:00:00Z",
        )];
        let snapshot = summarize(&tasks, now());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stats_by_priority"]["3"]["completed_count"], 1);
        assert_eq!(json["average_time"], "6.00");
    }
}

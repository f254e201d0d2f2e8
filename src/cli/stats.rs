//! tally stats command implementation.

use chrono::Utc;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub fn run_stats(ctx: &Context) -> Result<()> {
    let owner = ctx.owner()?;
    let snapshot = ctx.store().statistics(&owner, Utc::now())?;

    let mut human = HumanOutput::new(format!("Statistics for {owner}"));
    human.push_summary("total tasks", snapshot.total_tasks.to_string());
    human.push_summary("completed", format!("{}%", snapshot.completed_percentage));
    human.push_summary("pending", format!("{}%", snapshot.pending_percentage));
    human.push_summary("pending tasks", snapshot.total_pending_tasks.to_string());
    human.push_summary("time lapsed", format!("{}h", snapshot.total_time_lapsed));
    human.push_summary(
        "time to finish",
        format!("{}h", snapshot.total_time_to_finish),
    );
    human.push_summary("average time", format!("{}h", snapshot.average_time));

    for (priority, bucket) in &snapshot.stats_by_priority {
        human.push_detail(format!(
            "p{priority}: {} pending ({:.2}h lapsed, {:.2}h left), {} completed ({:.2}h taken)",
            bucket.pending_count,
            bucket.time_lapsed,
            bucket.time_left,
            bucket.completed_count,
            bucket.total_time_taken,
        ));
    }

    emit_success(ctx.output, "stats", &snapshot, Some(&human))
}

//! Plain-text timeline output.

use std::fmt::{self, Write};

use crewplan_core::{format_duration, format_hours_as_hmm, BlockStatus, Employee, Schedule};

fn status_label(status: BlockStatus) -> &'static str {
    match status {
        BlockStatus::Completed => "done",
        BlockStatus::Backlog => "backlog",
        BlockStatus::InProgress => "active",
        BlockStatus::Planned => "planned",
    }
}

/// One section per developer, in roster order.
pub fn render_schedule(schedule: &Schedule, roster: &[Employee]) -> Result<String, fmt::Error> {
    let mut out = String::new();

    for e in roster {
        let Some(blocks) = schedule.get(&e.id) else {
            continue;
        };
        let total: f64 = blocks.iter().map(|b| b.hours()).sum();
        writeln!(out, "{} ({})  {}", e.name, e.id, format_duration(total))?;

        if blocks.is_empty() {
            writeln!(out, "  (nothing scheduled)")?;
        }
        for b in blocks {
            writeln!(
                out,
                "  {}  {}-{}  {:<8} #{}{}",
                b.date,
                format_hours_as_hmm(b.start_time),
                format_hours_as_hmm(b.end_time),
                status_label(b.status),
                b.task_id,
                if b.is_session { "  (logged)" } else { "" }
            )?;
        }
        out.push('\n');
    }

    Ok(out)
}

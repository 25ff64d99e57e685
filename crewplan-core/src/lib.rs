//! crewplan-core: task model and the schedule simulation engine.

pub mod block;
pub mod business;
pub mod company;
pub mod duration;
pub mod schedule;
pub mod task;
pub mod time;

pub use block::{BlockStatus, Schedule, TimeBlock};
pub use business::calculate_business_duration;
pub use company::{CompanyConfig, Employee};
pub use duration::{format_duration, format_hours_as_hmm, parse_duration_to_hours, RawDuration};
pub use schedule::{calculate_schedule, ScheduleSimulator};
pub use task::{Priority, Task, TaskStatus, WorkSession};
pub use time::{
    local_date_key, local_hour_of_day, normalize_timestamp, parse_instant,
    parse_session_timestamp,
};

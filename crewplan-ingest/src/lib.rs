//! crewplan-ingest: wire records from the task API and JSON parsers that
//! normalize them into core types.

pub mod parsers;
pub mod types;

pub use parsers::{parse_employees_json, parse_tasks_json};
pub use types::{EmployeeRecord, RawScalar, SessionRecord, TaskRecord};

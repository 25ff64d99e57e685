//! Employee payload parser.

use anyhow::Result;
use crewplan_core::Employee;

use super::parse_records;
use crate::types::EmployeeRecord;

pub fn parse_employees_json(json: &str) -> Result<Vec<Employee>> {
    let records: Vec<EmployeeRecord> = parse_records(json, "employee")?;
    Ok(records.iter().map(EmployeeRecord::normalize).collect())
}

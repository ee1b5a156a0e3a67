//! Related multi-table schema for join and aggregation exercises.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use querylab_core::{Error, Result, Value};

use crate::output::{ColumnDefinition, ForeignKey, SqliteMaterializer, TableDefinition, TableLoad};

const DEPARTMENT_NAMES: [&str; 8] = [
    "Engineering",
    "Sales",
    "Marketing",
    "HR",
    "Finance",
    "Operations",
    "IT",
    "Customer Service",
];

const PROJECT_NAMES: [&str; 10] = [
    "Website Redesign",
    "Mobile App",
    "Database Migration",
    "Marketing Campaign Q1",
    "Sales Automation",
    "Cloud Migration",
    "Security Audit",
    "Performance Optimization",
    "Customer Portal",
    "Analytics Dashboard",
];

const FIRST_NAMES: [&str; 18] = [
    "John",
    "Jane",
    "Michael",
    "Sarah",
    "David",
    "Emily",
    "Robert",
    "Lisa",
    "William",
    "Jennifer",
    "James",
    "Mary",
    "Christopher",
    "Patricia",
    "Daniel",
    "Linda",
    "Matthew",
    "Barbara",
];

const LAST_NAMES: [&str; 18] = [
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
    "Hernandez",
    "Lopez",
    "Wilson",
    "Anderson",
    "Thomas",
    "Taylor",
    "Moore",
    "Jackson",
];

const LOCATIONS: [&str; 8] = [
    "New York",
    "San Francisco",
    "Chicago",
    "Boston",
    "Austin",
    "Seattle",
    "Denver",
    "Atlanta",
];

const PROJECT_STATUSES: [&str; 4] = ["Active", "Completed", "On Hold", "Cancelled"];

const PROJECT_ROLES: [&str; 6] = ["Lead", "Developer", "Analyst", "Designer", "QA", "Support"];

/// Employees with ids up to this value have no manager.
const EXECUTIVE_COUNT: i64 = 5;

/// Managers are drawn from the first ids only.
const MANAGER_POOL: i64 = 10;

/// Sizes and seed of the practice schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeSchema {
    pub seed: u64,
    pub departments: usize,
    pub employees: usize,
    pub projects: usize,
}

impl Default for PracticeSchema {
    fn default() -> Self {
        Self {
            seed: 42,
            departments: DEPARTMENT_NAMES.len(),
            employees: 50,
            projects: PROJECT_NAMES.len(),
        }
    }
}

/// Generated rows of the four practice tables.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeData {
    pub departments: Vec<Vec<Value>>,
    pub employees: Vec<Vec<Value>>,
    pub projects: Vec<Vec<Value>>,
    pub employee_projects: Vec<Vec<Value>>,
}

/// Row counts per table after materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeSummary {
    pub tables: Vec<(String, u64)>,
}

impl PracticeSchema {
    fn check(&self) -> Result<()> {
        if !(1..=DEPARTMENT_NAMES.len()).contains(&self.departments) {
            return Err(Error::Validation(format!(
                "departments must be in 1..={}, got {}",
                DEPARTMENT_NAMES.len(),
                self.departments
            )));
        }
        if !(1..=PROJECT_NAMES.len()).contains(&self.projects) {
            return Err(Error::Validation(format!(
                "projects must be in 1..={}, got {}",
                PROJECT_NAMES.len(),
                self.projects
            )));
        }
        if self.employees == 0 {
            return Err(Error::Validation(
                "at least one employee is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate all rows deterministically from the seed.
    pub fn generate(&self) -> Result<PracticeData> {
        self.check()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let department_ids: Vec<i64> = (1..=self.departments as i64).collect();
        let departments = DEPARTMENT_NAMES
            .iter()
            .take(self.departments)
            .zip(&department_ids)
            .map(|(name, id)| {
                vec![
                    Value::Integer(*id),
                    Value::from(*name),
                    Value::from(pick(&mut rng, &LOCATIONS)),
                    Value::Real(rng.random_range(100_000..=1_000_000) as f64),
                ]
            })
            .collect();

        let hire_base = date(2015, 1, 1)?;
        let employee_ids: Vec<i64> = (1..=self.employees as i64).collect();
        let mut employees = Vec::with_capacity(self.employees);
        for &id in &employee_ids {
            let first = pick(&mut rng, &FIRST_NAMES);
            let last = pick(&mut rng, &LAST_NAMES);
            let email = format!(
                "{}.{}{id}@company.com",
                first.to_lowercase(),
                last.to_lowercase()
            );
            let manager = if id <= EXECUTIVE_COUNT {
                Value::Null
            } else {
                Value::Integer(rng.random_range(1..=(id - 1).min(MANAGER_POOL)))
            };
            let hired = hire_base + Duration::days(rng.random_range(0..=3000));
            employees.push(vec![
                Value::Integer(id),
                Value::from(first),
                Value::from(last),
                Value::Text(email),
                Value::Integer(pick_id(&mut rng, &department_ids)),
                manager,
                Value::Text(hired.format("%Y-%m-%d").to_string()),
                Value::Real(rng.random_range(40_000..=150_000) as f64),
            ]);
        }

        let start_base = date(2020, 1, 1)?;
        let mut projects = Vec::with_capacity(self.projects);
        for (index, name) in PROJECT_NAMES.iter().take(self.projects).enumerate() {
            let start = start_base + Duration::days(rng.random_range(0..=1000));
            let end = start + Duration::days(rng.random_range(30..=365));
            projects.push(vec![
                Value::Integer(index as i64 + 1),
                Value::from(*name),
                Value::Text(start.format("%Y-%m-%d").to_string()),
                Value::Text(end.format("%Y-%m-%d").to_string()),
                Value::Integer(pick_id(&mut rng, &department_ids)),
                Value::Real(rng.random_range(50_000..=500_000) as f64),
                Value::from(pick(&mut rng, &PROJECT_STATUSES)),
            ]);
        }

        let mut employee_projects = Vec::new();
        for project_id in 1..=self.projects as i64 {
            let team_size = rng.random_range(2..=5).min(employee_ids.len());
            let team: Vec<i64> = employee_ids
                .choose_multiple(&mut rng, team_size)
                .copied()
                .collect();
            for employee_id in team {
                employee_projects.push(vec![
                    Value::Integer(employee_id),
                    Value::Integer(project_id),
                    Value::from(pick(&mut rng, &PROJECT_ROLES)),
                    Value::Integer(rng.random_range(10..=40)),
                ]);
            }
        }

        Ok(PracticeData {
            departments,
            employees,
            projects,
            employee_projects,
        })
    }

    /// Rebuild the four practice tables in `db_path` in one transaction.
    pub async fn materialize(&self, db_path: &Path) -> Result<PracticeSummary> {
        let data = self.generate()?;
        let loads = [
            (departments_table(), &data.departments),
            (employees_table(), &data.employees),
            (projects_table(), &data.projects),
            (employee_projects_table(), &data.employee_projects),
        ]
        .into_iter()
        .map(|(definition, rows)| TableLoad {
            definition,
            rows: rows.iter().map(|row| row.iter().collect()).collect(),
        })
        .collect::<Vec<_>>();

        let tables = SqliteMaterializer::new(db_path).replace_tables(&loads).await?;
        info!(
            db = %db_path.display(),
            seed = self.seed,
            departments = self.departments,
            employees = self.employees,
            projects = self.projects,
            "practice schema built"
        );
        Ok(PracticeSummary { tables })
    }
}

fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn pick_id(rng: &mut ChaCha8Rng, ids: &[i64]) -> i64 {
    ids.choose(rng).copied().unwrap_or(1)
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Validation(format!("invalid date {year}-{month}-{day}")))
}

fn key(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| column.to_string()).collect()
}

fn references(column: &str, table: &str, referenced: &str) -> ForeignKey {
    ForeignKey {
        columns: key(&[column]),
        referenced_table: table.to_string(),
        referenced_columns: key(&[referenced]),
    }
}

fn departments_table() -> TableDefinition {
    TableDefinition {
        name: "departments".to_string(),
        columns: vec![
            ColumnDefinition::new("department_id", "INTEGER"),
            ColumnDefinition::new("department_name", "TEXT").not_null(),
            ColumnDefinition::new("location", "TEXT"),
            ColumnDefinition::new("budget", "REAL"),
        ],
        primary_key: key(&["department_id"]),
        foreign_keys: Vec::new(),
    }
}

fn employees_table() -> TableDefinition {
    TableDefinition {
        name: "employees".to_string(),
        columns: vec![
            ColumnDefinition::new("employee_id", "INTEGER"),
            ColumnDefinition::new("first_name", "TEXT").not_null(),
            ColumnDefinition::new("last_name", "TEXT").not_null(),
            ColumnDefinition::new("email", "TEXT").unique(),
            ColumnDefinition::new("department_id", "INTEGER"),
            ColumnDefinition::new("manager_id", "INTEGER"),
            ColumnDefinition::new("hire_date", "DATE"),
            ColumnDefinition::new("salary", "REAL"),
        ],
        primary_key: key(&["employee_id"]),
        foreign_keys: vec![
            references("department_id", "departments", "department_id"),
            references("manager_id", "employees", "employee_id"),
        ],
    }
}

fn projects_table() -> TableDefinition {
    TableDefinition {
        name: "projects".to_string(),
        columns: vec![
            ColumnDefinition::new("project_id", "INTEGER"),
            ColumnDefinition::new("project_name", "TEXT").not_null(),
            ColumnDefinition::new("start_date", "DATE"),
            ColumnDefinition::new("end_date", "DATE"),
            ColumnDefinition::new("department_id", "INTEGER"),
            ColumnDefinition::new("budget", "REAL"),
            ColumnDefinition::new("status", "TEXT"),
        ],
        primary_key: key(&["project_id"]),
        foreign_keys: vec![references("department_id", "departments", "department_id")],
    }
}

fn employee_projects_table() -> TableDefinition {
    TableDefinition {
        name: "employee_projects".to_string(),
        columns: vec![
            ColumnDefinition::new("employee_id", "INTEGER"),
            ColumnDefinition::new("project_id", "INTEGER"),
            ColumnDefinition::new("role", "TEXT"),
            ColumnDefinition::new("hours_allocated", "INTEGER"),
        ],
        primary_key: key(&["employee_id", "project_id"]),
        foreign_keys: vec![
            references("employee_id", "employees", "employee_id"),
            references("project_id", "projects", "project_id"),
        ],
    }
}

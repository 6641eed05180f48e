//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tasktracker_core` linkage with deterministic output.
//! - Print a task database in display order when given its path.
//!
//! Usage: `tasktracker_cli [DB_PATH]`

use mockable::DefaultClock;
use std::path::Path;
use std::process::ExitCode;
use tasktracker_core::db::open_db;
use tasktracker_core::{SqliteTaskStorage, Task, TaskStorage, TaskStore};

type CliStore = TaskStore<SqliteTaskStorage, DefaultClock>;

fn main() -> ExitCode {
    println!("tasktracker_core ping={}", tasktracker_core::ping());
    println!(
        "tasktracker_core version={}",
        tasktracker_core::core_version()
    );

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let store = match open_existing_store(&db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    print_tasks(&store);
    ExitCode::SUCCESS
}

/// Opens a task database that must already exist; `open_db` alone would
/// create an empty one at a mistyped path.
fn open_existing_store(db_path: &str) -> Result<CliStore, String> {
    if !Path::new(db_path).exists() {
        return Err(format!("task database `{db_path}` does not exist"));
    }
    let conn = open_db(db_path)
        .map_err(|err| format!("failed to open `{db_path}`: {err}"))?;
    Ok(TaskStore::open(SqliteTaskStorage::new(conn), DefaultClock))
}

fn print_tasks<S: TaskStorage>(store: &TaskStore<S, DefaultClock>) {
    println!("tasks={}", store.len());
    for task in store.ordered_view() {
        println!("{}", render_row(task, store.is_overdue(task)));
    }
}

fn render_row(task: &Task, overdue: bool) -> String {
    let mut row = format!(
        "[{}] {} {}",
        if task.is_completed { "x" } else { " " },
        task.id,
        task.title
    );
    if let Some(due) = task.due_date {
        row.push_str(&format!(" due={}", due.to_rfc3339()));
    }
    if overdue {
        row.push_str(" overdue");
    }
    row
}

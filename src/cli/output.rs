//! Colored terminal output helpers.
//!
//! Status lines go to stderr.  Stdout carries only note content and
//! tables, so `notelock cat` output can be piped.

use comfy_table::{ContentArrangement, Table};
use console::{style, StyledObject};

use crate::bulk::BulkReport;
use crate::notify::{Notice, NoticeLevel, Notifier};

fn mark(level: NoticeLevel) -> StyledObject<&'static str> {
    match level {
        NoticeLevel::Success => style("\u{2713}").green().bold(),
        NoticeLevel::Info => style("\u{2139}").blue().bold(),
        NoticeLevel::Warning => style("\u{26a0}").yellow().bold(),
        NoticeLevel::Error => style("\u{2717}").red().bold(),
    }
}

fn status(level: NoticeLevel, msg: &str) {
    eprintln!("{} {msg}", mark(level));
}

pub fn success(msg: &str) {
    status(NoticeLevel::Success, msg);
}

pub fn error(msg: &str) {
    status(NoticeLevel::Error, msg);
}

pub fn warning(msg: &str) {
    status(NoticeLevel::Warning, msg);
}

pub fn info(msg: &str) {
    status(NoticeLevel::Info, msg);
}

/// Dimmed follow-up line, e.g. a password hint.
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the outcome counts of a bulk run.
pub fn print_bulk_report(report: &BulkReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Succeeded", "Failed", "Skipped", "Ignored"]);
    table.add_row(vec![
        report.succeeded.to_string(),
        report.failed.to_string(),
        report.skipped.to_string(),
        report.ignored.to_string(),
    ]);
    println!("{table}");
}

/// Print external password file checks (Path, Readable).
pub fn print_path_checks(checks: &[(String, bool)]) {
    if checks.is_empty() {
        info("No external password files configured.");
        tip("Add paths to `external_file_paths` in .notelock.toml.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Path", "Readable"]);
    for (path, ok) in checks {
        let readable = if *ok {
            style("yes").green().to_string()
        } else {
            style("no").red().to_string()
        };
        table.add_row(vec![path.clone(), readable]);
    }
    println!("{table}");
}

/// Routes core notices to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        status(notice.level, &notice.message);
    }
}

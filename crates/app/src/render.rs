//! Plain-text rendering for the terminal.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use checklist_core::model::{STEP_CATALOG, StepIndex, StepStatus, Student};
use services::{Certificate, RosterSummary};

const RULE: &str = "------------------------------------------------------------";

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// `[###----]`, one cell per step.
pub fn progress_bar(student: &Student) -> String {
    let done = student.completed_count();
    format!(
        "[{}{}]",
        "#".repeat(done),
        "-".repeat(StepIndex::COUNT - done)
    )
}

pub fn catalog() -> String {
    let mut out = String::from("Registration checklist\n");
    for entry in &STEP_CATALOG {
        let _ = writeln!(out, "  {}. {} ({})", entry.index, entry.title, entry.location);
        let _ = writeln!(out, "     {}", entry.instructions);
    }
    out
}

fn grade_label(grade: Option<&str>) -> String {
    grade.map_or_else(|| "-".to_owned(), |g| format!("grade {g}"))
}

/// One roster line: short id, name, grade, bar, percent and what comes next.
pub fn roster_line(student: &Student) -> String {
    let next = if student.is_complete() {
        "complete".to_owned()
    } else {
        format!("next: {}", student.current_step_index().entry().title)
    };
    format!(
        "{}  {:<24} {:<9} {} {:>3}%  {}",
        student.id().short(),
        student.name(),
        grade_label(student.grade()),
        progress_bar(student),
        student.percent_complete(),
        next
    )
}

pub fn summary(summary: &RosterSummary) -> String {
    format!(
        "{} students: {} not started, {} in progress, {} complete",
        summary.total, summary.not_started, summary.in_progress, summary.completed
    )
}

/// Full checklist for one student, with the current step marked.
pub fn student_detail(student: &Student) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({})  id {}",
        student.name(),
        grade_label(student.grade()),
        student.id()
    );
    let _ = writeln!(
        out,
        "{} {}% ({}/{} steps)",
        progress_bar(student),
        student.percent_complete(),
        student.completed_count(),
        StepIndex::COUNT
    );

    let current = (!student.is_complete()).then(|| student.current_step_index());
    for (index, status) in student.steps() {
        let entry = index.entry();
        let line = match status {
            StepStatus::Completed(sign_off) => {
                let mut line = format!(
                    "  [x] {index}. {} @ {}  signed {} {}",
                    entry.title,
                    entry.location,
                    sign_off.initials(),
                    stamp(sign_off.completed_at())
                );
                if let Some(note) = sign_off.note() {
                    let _ = write!(line, "  \"{note}\"");
                }
                line
            }
            StepStatus::Pending if current == Some(index) => format!(
                "  [>] {index}. {} @ {}  current: {}",
                entry.title, entry.location, entry.instructions
            ),
            StepStatus::Pending => format!(
                "  [ ] {index}. {} @ {}  locked",
                entry.title, entry.location
            ),
        };
        let _ = writeln!(out, "{line}");
    }
    out
}

/// Certificate of registration, or a progress report when unfinished.
pub fn certificate(cert: &Certificate) -> String {
    let mut out = String::new();
    let heading = if cert.is_complete() {
        "CERTIFICATE OF REGISTRATION"
    } else {
        "REGISTRATION PROGRESS REPORT"
    };
    let _ = writeln!(out, "{RULE}\n{heading:^60}\n{RULE}");
    let _ = writeln!(out, "Student: {}", cert.student_name);
    if let Some(grade) = &cert.grade {
        let _ = writeln!(out, "Grade:   {grade}");
    }
    let _ = writeln!(out, "ID:      {}", cert.student_id);
    let _ = writeln!(out);

    for row in &cert.rows {
        let status = match (&row.initials, row.completed_at) {
            (Some(initials), Some(at)) => format!("{initials:<4} {}", stamp(at)),
            _ if row.locked => "locked".to_owned(),
            _ => "pending".to_owned(),
        };
        let _ = writeln!(
            out,
            "{}. {:<22} {:<20} {status}",
            row.index, row.title, row.location
        );
        if let Some(note) = &row.note {
            let _ = writeln!(out, "   note: {note}");
        }
    }

    let _ = writeln!(out);
    match cert.completed_at {
        Some(at) => {
            let _ = writeln!(out, "All steps complete as of {}.", stamp(at));
        }
        None => {
            let _ = writeln!(
                out,
                "{}% complete. Next stop: step {} ({}).",
                cert.percent_complete,
                cert.current_step,
                cert.current_step.entry().location
            );
        }
    }
    let _ = writeln!(out, "Issued {}", stamp(cert.issued_at));
    let _ = writeln!(out, "{RULE}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_core::model::StudentId;
    use checklist_core::time::fixed_now;

    fn student_with(signed: u8) -> Student {
        let mut student =
            Student::new(StudentId::generate(), "Ana Lopez", Some("9".into()), fixed_now())
                .unwrap();
        for index in StepIndex::all().take(usize::from(signed)) {
            student
                .sign_step(index, "jd", Some("ok"), fixed_now())
                .unwrap();
        }
        student
    }

    #[test]
    fn catalog_lists_every_step() {
        let text = catalog();
        assert_eq!(text.lines().count(), 1 + 2 * StepIndex::COUNT);
        assert!(text.contains("7. Technology & Lockers (Media Center)"));
    }

    #[test]
    fn roster_line_shows_progress_and_next_step() {
        let line = roster_line(&student_with(3));
        assert!(line.contains("[###----]"));
        assert!(line.contains(" 43%"));
        assert!(line.ends_with("next: Counselor Meeting"));
        assert!(roster_line(&student_with(7)).ends_with("complete"));
    }

    #[test]
    fn detail_marks_current_and_locked_steps() {
        let text = student_detail(&student_with(1));
        assert!(text.contains("[x] 1. Check-In @ Main Office  signed JD 2024-09-03 14:00 UTC  \"ok\""));
        assert!(text.contains("[>] 2. Residency & Records"));
        assert!(text.contains("[ ] 3. Health Screening @ Nurse's Office  locked"));
    }

    #[test]
    fn certificate_heading_depends_on_completion() {
        let partial = Certificate::for_student(&student_with(2), fixed_now());
        let text = certificate(&partial);
        assert!(text.contains("REGISTRATION PROGRESS REPORT"));
        assert!(text.contains("29% complete. Next stop: step 3 (Nurse's Office)."));

        let full = Certificate::for_student(&student_with(7), fixed_now());
        let text = certificate(&full);
        assert!(text.contains("CERTIFICATE OF REGISTRATION"));
        assert!(text.contains("All steps complete as of 2024-09-03 14:00 UTC."));
    }

    #[test]
    fn summary_counts_read_naturally() {
        let line = summary(&RosterSummary {
            total: 4,
            not_started: 1,
            in_progress: 2,
            completed: 1,
        });
        assert_eq!(line, "4 students: 1 not started, 2 in progress, 1 complete");
    }
}

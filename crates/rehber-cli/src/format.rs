//! Plain-text rendering of API records for the terminal.

use std::fmt::Write;

use rehber_core::models::{Activity, DashboardStats, Meeting, Student};

/// Width of free-text columns before truncation
const TEXT_COLUMN_WIDTH: usize = 40;

/// Truncate a string to a maximum length in characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "Students:             {}\n\
         Meetings this month:  {}\n\
         Activities this month: {}\n\
         Average progress:     {:.0}%\n",
        stats.student_count,
        stats.meetings_this_month,
        stats.activities_this_month,
        stats.average_progress
    )
}

pub fn students(students: &[Student]) -> String {
    if students.is_empty() {
        return "No students found.\n".to_string();
    }
    let mut out = String::new();
    for s in students {
        let _ = writeln!(
            out,
            "{:>5}  {:<8}  {:<6}  {:<30}  {:>4.0}%",
            s.id,
            s.number,
            s.class_name,
            truncate(&s.display_name(), 30),
            s.overall_progress
        );
    }
    out
}

pub fn student_detail(s: &Student) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", s.display_name(), s.number);
    let _ = writeln!(out, "Class:    {}", s.class_name);
    let _ = writeln!(out, "Gender:   {}", s.gender);
    let _ = writeln!(out, "Phone:    {}", s.phone.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Email:    {}", s.email.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Progress: {:.0}%", s.overall_progress);
    out
}

pub fn meetings(meetings: &[Meeting]) -> String {
    if meetings.is_empty() {
        return "No meetings found.\n".to_string();
    }
    let mut out = String::new();
    for m in meetings {
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:<11}  {:<20}  {}",
            m.id,
            m.date.as_deref().unwrap_or("-"),
            m.time_range().unwrap_or_else(|| "-".to_string()),
            truncate(&m.attendee, 20),
            truncate(&m.topic, TEXT_COLUMN_WIDTH)
        );
    }
    out
}

pub fn activities(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return "No activities found.\n".to_string();
    }
    let mut out = String::new();
    for a in activities {
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:<16}  {:>4} people  {}",
            a.id,
            a.date,
            truncate(&a.activity_type, 16),
            a.participant_count(),
            truncate(&a.description, TEXT_COLUMN_WIDTH)
        );
    }
    out
}

//! Printable exam slip.
//!
//! Renders the document the historical frontend assembled client-side: a
//! bordered card with the student's display name, course, venue, day and
//! the verification banner. Served only for `CONFIRMED` sessions.

use unimerge_protocol::{CourseCode, Slot};

/// The banner stamped on every slip.
pub const VERIFICATION_BANNER: &str = "VERIFIED BY AGENT NEGOTIATION";

/// Render the slip for a confirmed booking as a standalone HTML page.
pub fn render(student: &str, course: &CourseCode, slot: &Slot) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>UniMerge: Exam Slip</title>
</head>
<body>
<div style="border:5px solid #38bdf8; padding:20px; font-family:sans-serif; text-align:center;">
    <h1>UniMerge: Exam Slip</h1>
    <hr>
    <p><strong>Student:</strong> {student}</p>
    <p><strong>Course:</strong> {course}</p>
    <p><strong>Venue:</strong> {venue}</p>
    <p><strong>Day:</strong> {day}</p>
    <h3 style="color:green;">{banner}</h3>
</div>
</body>
</html>
"#,
        student = escape(student),
        course = escape(course.as_str()),
        venue = escape(&slot.venue),
        day = slot.day,
        banner = VERIFICATION_BANNER,
    )
}

/// Minimal HTML escaping for text interpolated into the slip.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

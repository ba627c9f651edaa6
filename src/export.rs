//! CSV and PDF exports of tasks and projects.
//!
//! Column order is fixed, rows follow input order and an empty input still yields a
//! complete document (header row only for CSV, a single header page for PDF). Output
//! depends on nothing but the arguments.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::AppError;
use crate::models::{Project, Task};

pub const TASK_COLUMNS: [&str; 6] = ["id", "title", "status", "priority", "due_date", "assignee"];
pub const PROJECT_COLUMNS: [&str; 6] = ["id", "name", "status", "priority", "updated_at", "owner"];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Maps user ids to the usernames printed in the assignee/owner columns.
pub type UserNames = HashMap<i32, String>;

fn user_label(names: &UserNames, id: i32) -> String {
    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn task_row(task: &Task, names: &UserNames) -> [String; 6] {
    [
        task.id.to_string(),
        task.title.clone(),
        task.status.to_string(),
        task.priority.to_string(),
        task.due_date.as_ref().map(timestamp).unwrap_or_default(),
        task.assigned_to
            .map(|id| user_label(names, id))
            .unwrap_or_default(),
    ]
}

fn project_row(project: &Project, names: &UserNames) -> [String; 6] {
    [
        project.id.to_string(),
        project.name.clone(),
        project.status.to_string(),
        project.priority.to_string(),
        timestamp(&project.updated_at),
        user_label(names, project.owner_id),
    ]
}

fn write_csv<I>(header: &[&str], rows: I) -> Result<Vec<u8>, AppError>
where
    I: IntoIterator<Item = [String; 6]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(format!("Failed to flush CSV: {}", e)))
}

pub fn tasks_to_csv(tasks: &[Task], names: &UserNames) -> Result<Vec<u8>, AppError> {
    write_csv(&TASK_COLUMNS, tasks.iter().map(|t| task_row(t, names)))
}

pub fn projects_to_csv(projects: &[Project], names: &UserNames) -> Result<Vec<u8>, AppError> {
    write_csv(&PROJECT_COLUMNS, projects.iter().map(|p| project_row(p, names)))
}

// Minimal PDF 1.4 writer: A4 pages, built-in Helvetica, one text line per task.

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const LINE_HEIGHT: u32 = 14;
const ROWS_PER_PAGE: usize = 45;
const COLUMN_X: [u32; 6] = [50, 115, 300, 370, 430, 505];
const COLUMN_CHARS: [usize; 6] = [8, 34, 12, 8, 16, 12];

/// Code of `ch` in WinAnsiEncoding, the encoding declared for both fonts.
fn win_ansi(ch: char) -> Option<u8> {
    let code = match ch {
        ' '..='~' | '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(code)
}

/// Escapes `value` for a PDF string literal, truncated to `max_chars`.
/// Non-ASCII WinAnsi characters become octal escapes, anything else `?`.
fn pdf_text(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (i, ch) in value.chars().enumerate() {
        if i == max_chars {
            out.push_str("..");
            break;
        }
        match win_ansi(ch) {
            Some(b'(' | b')' | b'\\') => {
                out.push('\\');
                out.push(ch);
            }
            Some(code) if code.is_ascii() => out.push(ch),
            Some(code) => {
                let _ = write!(out, "\\{:03o}", code);
            }
            None => out.push('?'),
        }
    }
    out
}

fn page_content(page: usize, pages: usize, rows: &[[String; 6]]) -> String {
    let mut content = String::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    let _ = writeln!(
        content,
        "BT /F1 14 Tf {} {} Td (Tasks - page {} of {}) Tj ET",
        MARGIN,
        y,
        page + 1,
        pages
    );
    y -= LINE_HEIGHT * 2;
    for (col, label) in TASK_COLUMNS.iter().enumerate() {
        let _ = writeln!(
            content,
            "BT /F2 9 Tf {} {} Td ({}) Tj ET",
            COLUMN_X[col],
            y,
            pdf_text(label, COLUMN_CHARS[col])
        );
    }
    for row in rows {
        y -= LINE_HEIGHT;
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let _ = writeln!(
                content,
                "BT /F1 9 Tf {} {} Td ({}) Tj ET",
                COLUMN_X[col],
                y,
                pdf_text(cell, COLUMN_CHARS[col])
            );
        }
    }
    content
}

/// Renders `tasks` as a paginated PDF table.
pub fn tasks_to_pdf(tasks: &[Task], names: &UserNames) -> Vec<u8> {
    let rows: Vec<[String; 6]> = tasks
        .iter()
        .map(|t| {
            let mut row = task_row(t, names);
            // dates are shortened to fit the column
            if let Some(due) = &t.due_date {
                row[4] = due.format("%Y-%m-%d %H:%M").to_string();
            }
            row
        })
        .collect();
    let chunks: Vec<&[[String; 6]]> = if rows.is_empty() {
        vec![&rows[..]]
    } else {
        rows.chunks(ROWS_PER_PAGE).collect()
    };
    let pages = chunks.len();

    // 1 catalog, 2 page tree, 3-4 fonts, then a (page, content) pair per page
    let page_obj = |i: usize| 5 + 2 * i;
    let mut objects: Vec<String> = Vec::with_capacity(4 + 2 * pages);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", page_obj(i))).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    for (i, chunk) in chunks.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_obj(i) + 1
        ));
        let content = page_content(i, pages, chunk);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }
    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    out.into_bytes()
}

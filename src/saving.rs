use calamine::{Data, Reader, Xlsx, open_workbook};
use log::warn;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fs;
use std::path::Path;

use crate::reviews::{ReviewRecord, StoreError};

/// Worksheet holding the review records
pub const REVIEW_SHEET: &str = "reviews";

/// Header row of the review worksheet, in column order
pub const REVIEW_COLUMNS: [&str; 5] = ["id", "author", "content", "created_at", "password_hash"];

/// Longest text a workbook cell accepts; longer author or content fails the save
pub const MAX_CELL_CHARS: usize = 32_767;

/// Write every record to `path`, replacing the whole workbook
///
/// The workbook is written next to the target and renamed over it, so a
/// failed write leaves the previous file intact.
pub fn save_reviews(records: &[ReviewRecord], path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut worksheet = Worksheet::new();
    worksheet.set_name(REVIEW_SHEET)?;

    for (col, name) in REVIEW_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = (index + 1) as u32;
        worksheet.write_number(row, 0, record.id as f64)?;
        worksheet.write_string(row, 1, record.author.as_str())?;
        worksheet.write_string(row, 2, record.content.as_str())?;
        worksheet.write_string(row, 3, record.created_at.as_str())?;
        worksheet.write_string(row, 4, record.password_hash.as_str())?;
    }

    let mut workbook = Workbook::new();
    workbook.push_worksheet(worksheet);

    let staging = path.with_extension("xlsx.tmp");
    workbook.save(&staging)?;
    fs::rename(&staging, path)?;

    Ok(())
}

/// Read every record from `path`
///
/// Returns `Ok(None)` when the file is missing or zero bytes long, so the
/// caller can tell "no store yet" apart from "store with no reviews".
/// Rows whose id cell is not a positive integer are skipped.
pub fn load_reviews(path: &Path) -> Result<Option<Vec<ReviewRecord>>, StoreError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => return Ok(None),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;

    if !workbook.sheet_names().iter().any(|name| name == REVIEW_SHEET) {
        return Err(StoreError::MissingSheet(REVIEW_SHEET.to_string()));
    }

    let range = workbook.worksheet_range(REVIEW_SHEET)?;
    let mut records = Vec::new();

    for (index, row) in range.rows().enumerate().skip(1) {
        let cell = |col: usize| row.get(col).map(cell_text).unwrap_or_default();

        let Some(id) = row.get(0).and_then(cell_id) else {
            if !row.iter().all(|c| matches!(c, Data::Empty)) {
                warn!("skipping review row {} with invalid id", index + 1);
            }
            continue;
        };

        records.push(ReviewRecord {
            id,
            author: cell(1),
            content: cell(2),
            created_at: cell(3),
            password_hash: cell(4),
        });
    }

    Ok(Some(records))
}

fn cell_id(cell: &Data) -> Option<u64> {
    let id = match cell {
        Data::Int(i) => u64::try_from(*i).ok()?,
        Data::Float(f) if *f >= 1.0 && f.fract() == 0.0 => *f as u64,
        Data::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id >= 1).then_some(id)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => unescape_ooxml(s),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Undo the `_xHHHH_` escapes the writer applies to control characters
///
/// A literal `_xHHHH_` in the original text is written with its underscore
/// escaped as `_x005F_`, so a single left-to-right pass restores it.
fn unescape_ooxml(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("_x") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match escaped_char(tail) {
            Some(c) => {
                out.push(c);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// The character encoded by a leading `_xHHHH_`, if `text` starts with one
fn escaped_char(text: &str) -> Option<char> {
    let hex = text.get(2..6)?;
    if text.as_bytes().get(6) != Some(&b'_') || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: u64, author: &str) -> ReviewRecord {
        ReviewRecord {
            id,
            author: author.to_string(),
            content: format!("{author}, \"quoted\", 줄바꿈\n포함"),
            created_at: "2024-05-01 09:30:00".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[test]
    fn missing_or_zero_length_file_is_no_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.xlsx");
        assert_eq!(load_reviews(&path).unwrap(), None);

        fs::write(&path, b"").unwrap();
        assert_eq!(load_reviews(&path).unwrap(), None);
    }

    #[test]
    fn saved_records_are_read_back_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("reviews.xlsx");
        let records = vec![record(3, "Kim"), record(1, "이")];

        save_reviews(&records, &path).unwrap();

        assert_eq!(load_reviews(&path).unwrap(), Some(records));
        assert!(!path.with_extension("xlsx.tmp").exists());
    }

    #[test]
    fn empty_store_keeps_header_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.xlsx");
        save_reviews(&[], &path).unwrap();

        let header = crate::tabular::load(&path, REVIEW_SHEET).unwrap();
        assert_eq!(header.column_names(), REVIEW_COLUMNS);
        assert!(header.is_empty());
        assert_eq!(load_reviews(&path).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn escaped_control_characters_are_decoded() {
        assert_eq!(unescape_ooxml("a_x000D_\nb"), "a\r\nb");
        assert_eq!(unescape_ooxml("_x005F_x0041_"), "_x0041_");
        assert_eq!(unescape_ooxml("bell_x0007_x"), "bell\u{7}x");
        assert_eq!(unescape_ooxml("_x12_ _xZZZZ_ 후기_x"), "_x12_ _xZZZZ_ 후기_x");
    }

    #[test]
    fn control_characters_survive_a_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.xlsx");
        let mut review = record(1, "Kim");
        review.content = "줄1\r\n줄2\t_x0041_\u{7}".to_string();

        save_reviews(std::slice::from_ref(&review), &path).unwrap();

        assert_eq!(load_reviews(&path).unwrap(), Some(vec![review]));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.xlsx");
        fs::write(&path, b"not a workbook").unwrap();

        assert!(load_reviews(&path).is_err());
    }
}

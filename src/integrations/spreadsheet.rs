//! Report import and export as sheet rows.
//!
//! A row is a JSON object keyed by column header, the shape a sheet-to-JSON
//! conversion produces. Import accepts both the Thai and English headers seen
//! in instructor gradebooks; export writes the fixed 15-column master layout.

use std::path::Path;
use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, Timelike, Utc};
use serde_json::{Map, Value};
use crate::error::PhyemError;
use crate::lesson::report::{Report, TOTAL_QUIZ_QUESTIONS};
use crate::lesson::session::CerAnswer;

const COLLABORATOR: &str = "spreadsheet";
const IMPORTED_QUESTION: &str = "Imported Question";
const MAX_IMPORTED_QUESTIONS: usize = 1_000;
/// Bangkok has no daylight saving, so a fixed +07:00 is exact
const THAI_UTC_OFFSET_SECS: i32 = 7 * 3600;
const BUDDHIST_ERA_OFFSET: i32 = 543;

pub const EXPORT_COLUMNS: [&str; 15] = [
    "ลำดับ (No.)",
    "รหัสนักเรียน (ID)",
    "ชื่อ-นามสกุล (Name)",
    "คะแนนรวม (%)",
    "คะแนนควิซ (Quiz)",
    "โบนัสตอบเพื่อน (Bonus)",
    "วัสดุที่ทดลอง",
    "บันทึก VDO",
    "CER: Claim",
    "CER: Evidence",
    "CER: Reasoning",
    "จำนวนคำถาม AI",
    "ความพึงพอใจ (Rating)",
    "ข้อความเพิ่มเติม",
    "วันเวลาที่ส่งข้อมูล",
];

/// Truthy the way a loosely typed sheet cell is: no blanks, zeros or nulls
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First truthy cell among the header aliases
fn pick<'a>(row: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|value| is_truthy(value))
}

fn pick_text(row: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    pick(row, aliases).map(cell_text)
}

/// Numeric cell as a non-negative whole number; junk reads as 0
fn pick_count(row: &Map<String, Value>, aliases: &[&str]) -> Option<u32> {
    pick(row, aliases).map(|value| parse_count(&cell_text(value)))
}

fn parse_count(text: &str) -> u32 {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn split_list(row: &Map<String, Value>, alias: &str, separator: &str) -> Vec<String> {
    pick_text(row, &[alias])
        .map(|text| text.split(separator).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Map one sheet row onto a report
pub fn import_row(row: &Map<String, Value>, idx: usize, now: DateTime<Utc>) -> Report {
    let student_id = pick_text(row, &["รหัสนักเรียน", "Student ID", "ID"])
        .unwrap_or_else(|| format!("EXL-{}", idx));
    let user_name = pick_text(row, &["ชื่อ-นามสกุล", "Name"])
        .unwrap_or_else(|| "Unknown Student".to_string());

    let quiz_score = pick_text(row, &["คะแนนควิซ (/5)"])
        .map(|text| parse_count(text.split('/').next().unwrap_or_default()))
        .unwrap_or(0);

    let questions = pick_count(row, &["คำถาม AI ทั้งหมด"])
        .map(|n| (n as usize).min(MAX_IMPORTED_QUESTIONS))
        .unwrap_or(0);

    let star_rating = pick_count(row, &["ความพึงพอใจ (ดาว)"]).unwrap_or(5).clamp(1, 5) as u8;

    Report {
        id: format!("exl-{}-{}", now.timestamp_millis(), idx),
        user_name,
        student_id,
        timestamp: pick_text(row, &["วันที่ส่งข้อมูล"])
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        cer: CerAnswer {
            claim: pick_text(row, &["Claim (CER)"]).unwrap_or_default(),
            evidence: pick_text(row, &["Evidence (CER)"]).unwrap_or_default(),
            reasoning: pick_text(row, &["Reasoning (CER)"]).unwrap_or_default(),
        },
        observations_count: pick_count(row, &["จำนวนบันทึก VDO"]).unwrap_or(0) as usize,
        observation_notes: split_list(row, "บันทึกรายละเอียด", " | "),
        questions_asked: vec![IMPORTED_QUESTION.to_string(); questions],
        ai_feedback: String::new(),
        lms_status: None,
        score: pick_count(row, &["คะแนนรวม (%)", "Score"]).unwrap_or(0),
        quiz_score,
        total_quiz_questions: TOTAL_QUIZ_QUESTIONS,
        materials_tested: split_list(row, "วัสดุที่ทดลองทั้งหมด", ", "),
        collaboration_bonus: pick_count(row, &["โบนัสตอบเพื่อน"]).unwrap_or(0),
        star_rating,
        feedback_comment: pick_text(row, &["ความคิดเห็นเพิ่มเติม"]).unwrap_or_default(),
    }
}

/// Map every object row; anything else in the array is skipped
pub fn import_rows(rows: &[Value], now: DateTime<Utc>) -> Vec<Report> {
    rows.iter()
        .enumerate()
        .filter_map(|(idx, row)| match row.as_object() {
            Some(map) => Some(import_row(map, idx, now)),
            None => {
                tracing::warn!(row = idx, "Skipping non-object sheet row");
                None
            }
        })
        .collect()
}

/// `d/m/yyyy HH:MM:SS` in Bangkok time with a Buddhist-era year.
/// Timestamps that do not parse are passed through unchanged.
pub fn thai_datetime(timestamp: &str) -> String {
    let Some(offset) = FixedOffset::east_opt(THAI_UTC_OFFSET_SECS) else {
        return timestamp.to_string();
    };
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => {
            let local = t.with_timezone(&offset);
            format!(
                "{}/{}/{} {:02}:{:02}:{:02}",
                local.day(),
                local.month(),
                local.year() + BUDDHIST_ERA_OFFSET,
                local.hour(),
                local.minute(),
                local.second()
            )
        }
        Err(_) => timestamp.to_string(),
    }
}

pub fn export_row(report: &Report, idx: usize) -> Map<String, Value> {
    let notes = if report.observation_notes.is_empty() {
        "-".to_string()
    } else {
        report.observation_notes.join(" | ")
    };
    let values: [Value; 15] = [
        Value::from(idx + 1),
        Value::from(report.student_id.clone()),
        Value::from(report.user_name.clone()),
        Value::from(report.score),
        Value::from(format!("{}/{}", report.quiz_score, report.total_quiz_questions)),
        Value::from(report.collaboration_bonus),
        Value::from(report.materials_tested.join(", ")),
        Value::from(notes),
        Value::from(report.cer.claim.clone()),
        Value::from(report.cer.evidence.clone()),
        Value::from(report.cer.reasoning.clone()),
        Value::from(report.questions_asked.len()),
        Value::from(report.star_rating),
        Value::from(report.feedback_comment.clone()),
        Value::from(thai_datetime(&report.timestamp)),
    ];
    EXPORT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .zip(values)
        .collect()
}

pub fn export_rows(reports: &[Report]) -> Vec<Value> {
    reports
        .iter()
        .enumerate()
        .map(|(idx, report)| Value::Object(export_row(report, idx)))
        .collect()
}

/// Suggested export file name, dated the Thai way
pub fn export_file_name(now: DateTime<Utc>) -> String {
    let date = thai_datetime(&now.to_rfc3339());
    let day = date.split(' ').next().unwrap_or_default().replace('/', "-");
    format!("PhyEM_Master_Data_{}.json", day)
}

pub async fn read_rows(path: &Path) -> Result<Vec<Value>, PhyemError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        PhyemError::new(format!("Failed to read sheet file: {}", e), "io")
            .with_collaborator(COLLABORATOR)
            .with_context(format!("path: {:?}", path))
    })?;
    serde_json::from_str::<Vec<Value>>(&text).map_err(|e| {
        PhyemError::new(format!("Sheet file is not a JSON array of rows: {}", e), "json_parse")
            .with_collaborator(COLLABORATOR)
            .with_context(format!("path: {:?}", path))
    })
}

pub async fn write_rows(path: &Path, rows: &[Value]) -> Result<(), PhyemError> {
    let json = serde_json::to_string_pretty(rows)?;
    tokio::fs::write(path, json).await.map_err(|e| {
        PhyemError::new(format!("Failed to write sheet file: {}", e), "io")
            .with_collaborator(COLLABORATOR)
            .with_context(format!("path: {:?}", path))
    })
}

/// Read every file and map its rows. A file that cannot be read is logged and skipped.
pub async fn import_files(paths: &[impl AsRef<Path>], now: DateTime<Utc>) -> Vec<Report> {
    let mut imported = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match read_rows(path).await {
            Ok(rows) => {
                let reports = import_rows(&rows, now);
                tracing::info!(path = ?path, rows = reports.len(), "Sheet imported");
                imported.extend(reports);
            }
            Err(e) => tracing::error!(error = %e, "Sheet import failed"),
        }
    }
    imported
}

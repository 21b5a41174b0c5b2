use chrono::{DateTime, Utc};
use phyem_lib::integrations::spreadsheet::{
    export_rows, import_files, import_rows, read_rows, write_rows, EXPORT_COLUMNS,
};
use phyem_lib::lesson::{LearnerIdentity, LessonController, StarRating};
use serde_json::json;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-10T03:00:00Z").unwrap().with_timezone(&Utc)
}

#[test]
fn test_thai_headers_import() {
    let rows = vec![json!({ "รหัสนักเรียน": "S1", "Score": 85 })];
    let reports = import_rows(&rows, now());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].student_id, "S1");
    assert_eq!(reports[0].score, 85);
    assert_eq!(reports[0].user_name, "Unknown Student");
    assert_eq!(reports[0].star_rating, 5);
    assert_eq!(reports[0].id, format!("exl-{}-0", now().timestamp_millis()));
}

#[test]
fn test_full_row_import() {
    let rows = vec![json!({
        "ชื่อ-นามสกุล": "สมชาย ใจดี",
        "Student ID": "6601",
        "คะแนนรวม (%)": "104",
        "คะแนนควิซ (/5)": "4/5",
        "โบนัสตอบเพื่อน": 4,
        "จำนวนบันทึก VDO": 2,
        "บันทึกรายละเอียด": "ไข่ไม่สุก | กระทะร้อน",
        "วัสดุที่ทดลองทั้งหมด": "iron, glass",
        "ความพึงพอใจ (ดาว)": 4,
        "ความคิดเห็นเพิ่มเติม": "ดีมาก",
        "คำถาม AI ทั้งหมด": 3,
        "วันที่ส่งข้อมูล": "2026-01-15T10:00:00.000Z",
        "Claim (CER)": "ไข่ไม่สุก",
        "Evidence (CER)": "วิดีโอ",
        "Reasoning (CER)": "ไม่เกิดกระแสวน"
    })];
    let r = &import_rows(&rows, now())[0];
    assert_eq!(r.user_name, "สมชาย ใจดี");
    assert_eq!(r.student_id, "6601");
    assert_eq!(r.score, 104);
    assert_eq!(r.quiz_score, 4);
    assert_eq!(r.total_quiz_questions, 5);
    assert_eq!(r.collaboration_bonus, 4);
    assert_eq!(r.observations_count, 2);
    assert_eq!(r.observation_notes, vec!["ไข่ไม่สุก", "กระทะร้อน"]);
    assert_eq!(r.materials_tested, vec!["iron", "glass"]);
    assert_eq!(r.star_rating, 4);
    assert_eq!(r.questions_asked, vec!["Imported Question"; 3]);
    assert_eq!(r.timestamp, "2026-01-15T10:00:00.000Z");
    assert_eq!(r.cer.reasoning, "ไม่เกิดกระแสวน");
}

#[test]
fn test_missing_fields_get_placeholders() {
    let rows = vec![json!({}), json!({ "Name": "Dee" })];
    let reports = import_rows(&rows, now());
    assert_eq!(reports[0].student_id, "EXL-0");
    assert_eq!(reports[1].student_id, "EXL-1");
    assert_eq!(reports[1].user_name, "Dee");
    assert_eq!(reports[0].timestamp, "2026-02-10T03:00:00.000Z");
    assert!(reports[0].observation_notes.is_empty());
}

#[test]
fn test_export_columns_in_order() {
    let mut lesson = LessonController::new();
    lesson.login(LearnerIdentity::new("Ann", "S1").unwrap());
    lesson.record_quiz_score(3);
    lesson.add_material_tested("iron");
    lesson.add_material_tested("stainless");
    let report = lesson.finalize_report(StarRating::new(5).unwrap(), "").unwrap();

    let rows = export_rows(&[report]);
    let row = rows[0].as_object().unwrap();
    let headers: Vec<&str> = row.keys().map(String::as_str).collect();
    assert_eq!(headers, EXPORT_COLUMNS.to_vec());
    assert_eq!(row["ลำดับ (No.)"], 1);
    assert_eq!(row["คะแนนควิซ (Quiz)"], "3/5");
    assert_eq!(row["วัสดุที่ทดลอง"], "iron, stainless");
    assert_eq!(row["บันทึก VDO"], "-");
    assert_eq!(row["คะแนนรวม (%)"], 100);
}

#[tokio::test]
async fn test_files_round_trip_and_bad_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("class.json");
    let bad = dir.path().join("broken.json");
    write_rows(&good, &[json!({ "ID": "A1", "Score": 90 }), json!({ "ID": "A2" })]).await.unwrap();
    tokio::fs::write(&bad, "not rows").await.unwrap();

    assert_eq!(read_rows(&good).await.unwrap().len(), 2);
    assert!(read_rows(&bad).await.is_err());

    let reports = import_files(&[bad, good], now()).await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].student_id, "A1");
    assert_eq!(reports[0].score, 90);
    assert_eq!(reports[1].score, 0);
}

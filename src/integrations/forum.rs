use std::path::{Path, PathBuf};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use crate::error::PhyemError;
use crate::lesson::session::new_short_id;

const COLLABORATOR: &str = "forum";
pub const LEARNER_AUTHOR: &str = "You (Researcher)";
const SEED_AUTHOR: &str = "Researcher_Phy";
const BOT_AUTHOR: &str = "PhyEM_Bot";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumReply {
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumQuestion {
    pub id: String,
    pub author: String,
    pub question: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<ForumReply>,
}

/// Starter discussion shown the first time the board is opened
pub fn seed_questions(now: DateTime<Utc>) -> Vec<ForumQuestion> {
    let seeded = |n: u32, hours_ago: i64, question: &str, replies: Vec<ForumReply>| ForumQuestion {
        id: format!("q-induction-{}", n),
        author: SEED_AUTHOR.to_string(),
        question: question.to_string(),
        timestamp: now - Duration::hours(hours_ago),
        replies,
    };
    vec![
        seeded(
            1,
            0,
            "ถ้าเราเพิ่มจำนวนรอบของขดลวดในเตา จะส่งผลต่อความร้อนที่เกิดขึ้นกับวัตถุอย่างไร?",
            vec![ForumReply {
                id: "r1".to_string(),
                author: BOT_AUTHOR.to_string(),
                text: "การเพิ่มจำนวนรอบจะช่วยเพิ่มความเข้มข้นของฟลักซ์แม่เหล็ก ซึ่งจะส่งผลให้เกิดกระแส Eddy Current ที่รุนแรงขึ้นและความร้อนจะเพิ่มขึ้นครับ!".to_string(),
                timestamp: now,
            }],
        ),
        seeded(
            2,
            1,
            "ทำไมกระทะสแตนเลสบางชนิดถึงใช้กับเตาแม่เหล็กไฟฟ้าไม่ได้ ทั้งที่มันเป็นโลหะเหมือนกัน?",
            Vec::new(),
        ),
        seeded(
            3,
            2,
            "ถ้าเราเปลี่ยนวัสดุจาก \"เหล็ก\" เป็น \"ทองแดง\" ที่นำไฟฟ้าได้ดีกว่า จะเกิดความร้อนมากกว่าหรือน้อยกว่า? ลองใช้ PhET สังเกตดูนะ",
            Vec::new(),
        ),
        seeded(
            4,
            3,
            "การวางไข่บน \"ฟอยล์อลูมิเนียม\" จะช่วยให้ไข่สุกได้จริงหรือไม่? ใครเห็นหลักฐานในวิดีโอบ้างว่าเกิดอะไรขึ้น?",
            Vec::new(),
        ),
    ]
}

/// Peer question board persisted as one JSON file
#[derive(Debug)]
pub struct ForumStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ForumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ForumStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored questions, or None when the board has never been written
    async fn read_raw(&self) -> Result<Option<Vec<ForumQuestion>>, PhyemError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                PhyemError::new(format!("Forum file is corrupt: {}", e), "json_parse")
                    .with_collaborator(COLLABORATOR)
                    .with_context(format!("path: {:?}", self.path))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PhyemError::new(format!("Failed to read forum: {}", e), "io")
                .with_collaborator(COLLABORATOR)
                .with_context(format!("path: {:?}", self.path))),
        }
    }

    async fn write_raw(&self, questions: &[ForumQuestion]) -> Result<(), PhyemError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_string_pretty(questions)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            PhyemError::new(format!("Failed to write forum: {}", e), "io")
                .with_collaborator(COLLABORATOR)
                .with_context(format!("path: {:?}", self.path))
        })
    }

    /// Load, seeding the board on first use
    async fn load_or_seed(&self) -> Result<Vec<ForumQuestion>, PhyemError> {
        match self.read_raw().await? {
            Some(questions) => Ok(questions),
            None => {
                let seeded = seed_questions(Utc::now());
                self.write_raw(&seeded).await?;
                tracing::info!(path = ?self.path, "Forum seeded");
                Ok(seeded)
            }
        }
    }

    /// All questions, newest first
    pub async fn list(&self) -> Result<Vec<ForumQuestion>, PhyemError> {
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_or_seed().await?;
        questions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(questions)
    }

    /// Blank questions are not posted
    pub async fn post_question(&self, author: &str, text: &str) -> Result<Option<ForumQuestion>, PhyemError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_or_seed().await?;
        let question = ForumQuestion {
            id: new_short_id(),
            author: author.to_string(),
            question: text.to_string(),
            timestamp: Utc::now(),
            replies: Vec::new(),
        };
        questions.insert(0, question.clone());
        self.write_raw(&questions).await?;
        tracing::info!(question_id = %question.id, "Forum question posted");
        Ok(Some(question))
    }

    /// Append a reply. Ok(None) for blank text; unknown question ids are an error.
    pub async fn reply(&self, question_id: &str, author: &str, text: &str) -> Result<Option<ForumReply>, PhyemError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_or_seed().await?;
        let question = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                PhyemError::new("No such forum question", "not_found")
                    .with_collaborator(COLLABORATOR)
                    .with_context(format!("question_id: {}", question_id))
            })?;
        let reply = ForumReply {
            id: new_short_id(),
            author: author.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        question.replies.push(reply.clone());
        self.write_raw(&questions).await?;
        tracing::info!(question_id = question_id, "Forum reply posted");
        Ok(Some(reply))
    }
}

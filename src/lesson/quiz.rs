use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub title: &'static str,
    pub correct_id: &'static str,
    /// Empty when the question has no hint
    pub hint: &'static str,
    pub explanation: &'static str,
    pub options: Vec<QuizOption>,
}

fn stove_options() -> Vec<QuizOption> {
    vec![
        QuizOption { id: "gas", label: "เตาแก๊ส" },
        QuizOption { id: "electric", label: "เตาไฟฟ้าเซรามิก" },
        QuizOption { id: "induction", label: "เตาแม่เหล็กไฟฟ้า" },
        QuizOption { id: "infrared", label: "เตาอินฟราเรด" },
    ]
}

/// The five Engagement questions in presentation order
pub fn engagement_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            title: "ข้อ 1: เตานี้คือเตาอะไร?",
            correct_id: "gas",
            hint: "สังเกตหัวเตาที่มีลักษณะยกสูงและมีช่องปล่อยแก๊สเพื่อจุดไฟ",
            explanation: "เตาแก๊ส (Gas Stove) ให้ความร้อนจากการเผาไหม้เชื้อเพลิงแก๊สโดยตรง เกิดเป็นเปลวไฟที่ถ่ายโอนความร้อนสู่ภาชนะ",
            options: stove_options(),
        },
        QuizQuestion {
            title: "ข้อ 2: เตานี้คือเตาอะไร?",
            correct_id: "infrared",
            hint: "สังเกตแผ่นเซรามิกที่มีรูพรุนขนาดเล็กจำนวนมากเพื่อแผ่ความร้อนแบบอินฟราเรด",
            explanation: "เตาอินฟราเรด (Infrared Stove) ใช้การแผ่รังสีอินฟราเรดจากแผ่นเซรามิก ทำให้ไม่มีเปลวไฟพุ่งออกมาเหมือนเตาแก๊สปกติ แต่ให้ความร้อนสูง",
            options: stove_options(),
        },
        QuizQuestion {
            title: "ข้อ 3: เตานี้คือเตาอะไร?",
            correct_id: "electric",
            hint: "หน้าเตาแบนเรียบ มีวงกลมแสดงตำแหน่งขดลวดความร้อนใต้กระจกเซรามิก",
            explanation: "เตาไฟฟ้า (Electric Ceramic Stove) ใช้ความร้อนจากขดลวดไฟฟ้าใต้กระจก หน้าเตาจะร้อนจัดจนเป็นสีแดงเมื่อทำงาน",
            options: stove_options(),
        },
        QuizQuestion {
            title: "ข้อ 4: เตานี้คือเตาอะไร?",
            correct_id: "induction",
            hint: "ดีไซน์หรูหรา หน้าเตาไม่ร้อนจัดขณะทำงาน (ยกเว้นความร้อนสะท้อนจากภาชนะ)",
            explanation: "เตาแม่เหล็กไฟฟ้า (Induction Stove) ใช้สนามแม่เหล็กเหนี่ยวนำให้เกิดความร้อนในภาชนะโลหะโดยตรง หน้าเตาไม่ได้ร้อนด้วยตัวเอง",
            options: stove_options(),
        },
        QuizQuestion {
            title: "ข้อ 5: เตาแม่เหล็กไฟฟ้า กับ เตาไฟฟ้า ต่างกันอย่างไร?",
            correct_id: "induction_diff",
            hint: "",
            explanation: "เตาไฟฟ้าใช้ 'การนำความร้อน' จากหน้าเตาที่ร้อนจัด ส่วนเตาแม่เหล็กไฟฟ้าใช้ 'การเหนี่ยวนำ' ให้เกิดความร้อนที่ก้นภาชนะโดยตรง ทำให้หน้าเตาไม่ร้อนและประหยัดพลังงานกว่า",
            options: vec![
                QuizOption { id: "induction_diff", label: "การนำความร้อน vs การเหนี่ยวนำ" },
                QuizOption { id: "gas_diff", label: "การใช้แก๊ส vs การใช้ไฟฟ้า" },
                QuizOption { id: "temp_diff", label: "การแผ่รังสี vs การพาความร้อน" },
                QuizOption { id: "no_diff", label: "ไม่มีความแตกต่างกัน" },
            ],
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum QuizProgress {
    /// Index of the question now showing
    Question(usize),
    /// Final number of correct answers
    Finished(u32),
}

/// One pass through the Engagement quiz
#[derive(Debug, Clone)]
pub struct QuizRun {
    questions: Vec<QuizQuestion>,
    step: usize,
    selected: Option<String>,
    revealed: bool,
    score: u32,
}

impl QuizRun {
    pub fn new() -> Self {
        Self::with_questions(engagement_questions())
    }

    pub fn with_questions(questions: Vec<QuizQuestion>) -> Self {
        QuizRun {
            questions,
            step: 0,
            selected: None,
            revealed: false,
            score: 0,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.step)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Choose an option. Locked once the answer is revealed.
    pub fn select(&mut self, option_id: impl Into<String>) {
        if !self.revealed {
            self.selected = Some(option_id.into());
        }
    }

    /// Show the answer. Returns whether the selection was correct, or None
    /// when there was nothing to reveal.
    pub fn reveal(&mut self) -> Option<bool> {
        if self.revealed {
            return None;
        }
        let selected = self.selected.as_deref()?;
        let correct = self.current()?.correct_id == selected;
        if correct {
            self.score += 1;
        }
        self.revealed = true;
        Some(correct)
    }

    pub fn next(&mut self) -> QuizProgress {
        if self.step + 1 < self.questions.len() {
            self.step += 1;
            self.selected = None;
            self.revealed = false;
            QuizProgress::Question(self.step)
        } else {
            QuizProgress::Finished(self.score)
        }
    }
}

impl Default for QuizRun {
    fn default() -> Self {
        Self::new()
    }
}

use std::time::Instant;
use anyhow::{Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Duration;
use crate::cache::ResponseCache;
use crate::config::settings::TutorConfig;
use crate::error::PhyemError;
use crate::integrations::http::http_client;
use crate::logging::log_collaborator_call;
use crate::metrics::Metrics;

const COLLABORATOR: &str = "ai_tutor";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Sample rate of the PCM the TTS model returns
pub const TTS_SAMPLE_RATE: u32 = 24_000;

pub const GREETING: &str = "สวัสดีครับ! ผมคือ PhyEM ผู้นำทางด้านฟิสิกส์ของคุณ 🎯 มีจุดไหนที่ยังสงสัย หรืออยากให้ผมช่วยไกด์วิธีสังเกตในการทดลองไหมครับ?";
pub const EMPTY_ANSWER_FALLBACK: &str = "ขออภัยครับ ลองถามใหม่อีกครั้งนะ";
pub const CONNECTION_FALLBACK: &str = "เกิดข้อผิดพลาดในการเชื่อมต่อครับ";
pub const REASONING_PROMPT: &str = "กรุณาระบุเหตุผลของคุณ";
pub const REASONING_EMPTY_FALLBACK: &str = "เยี่ยมมาก! อย่าลืมเน้นย้ำเรื่องความแตกต่างระหว่างตัวนำโลหะและไข่นะ";
pub const REASONING_ERROR_FALLBACK: &str = "กำลังตรวจสอบเหตุผลของคุณ...";

pub const FALLBACK_STARTERS: [&str; 5] = [
    "จากหลักการทำงานของเตาแม่เหล็กไฟฟ้า...",
    "สาเหตุที่ไข่ไม่สุกเนื่องจาก...",
    "ความร้อนจะเกิดขึ้นได้ก็ต่อเมื่อ...",
    "การที่ไข่ไม่ใช่โลหะส่งผลให้...",
    "สรุปได้ว่ากระแสไฟฟ้าเหนี่ยวนำ...",
];

const GUIDE_INSTRUCTION: &str = r#"คุณคือ "PhyEM Guide" ผู้ช่วยสอนฟิสิกส์ที่ทำหน้าที่ "ผู้นำทาง" ห้ามเป็น "ผู้เฉลย" โดยเด็ดขาด

เป้าหมายของคุณ: กระตุ้นให้นักเรียนคิดและค้นพบคำตอบด้วยตนเองผ่านการสังเกตและวิเคราะห์ทฤษฎี

กฎเหล็กของการเป็นไกด์:
1. ห้ามเฉลยคำตอบตรงๆ (NO DIRECT ANSWERS): แม้นักเรียนจะขอร้องหรือถามตรงๆ ให้ตอบเลี่ยงไปใช้การตั้งคำถามแทน
2. ใช้การตั้งคำถามย้อนกลับ (Socratic Method): ถามกลับถึงสิ่งที่นักเรียนเห็นใน Simulation หรือในวิดีโอ
3. การให้คำใบ้เป็นลำดับขั้น (Scaffolding): สังเกตปรากฏการณ์ ทบทวนหลักการพื้นฐาน แล้วจึงเชื่อมโยงความสัมพันธ์
4. สนับสนุนการเขียน CER: ไกด์วิธีหา Evidence จากวิดีโอ และวิธีเขียน Reasoning โดยไม่เขียนประโยคให้ทั้งหมด

โทนเสียงและสไตล์: ให้กำลังใจ สนุกสนาน ใช้สัญลักษณ์ 🎯 💡 🧪 📊"#;

const STARTERS_PROMPT: &str = "Generate 5 scientific sentence starters in Thai for explaining why an egg doesn't cook on an induction stove without a pan. Focus on induction, metal vs non-metal, and heat generation. Format as a simple list.";

fn reasoning_prompt(reasoning: &str) -> String {
    format!(
        "You are PhyEM, a high-school physics AI assistant. Evaluate this student's reasoning in Thai about an egg not cooking on an induction stove without a pan: \"{}\".\n\
         Requirements:\n\
         1. Provide a short, vibrant, and encouraging feedback.\n\
         2. Mention if they used concepts like Eddy Current or Induction correctly.\n\
         3. Give one tip for improvement.",
        reasoning
    )
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<PartRequest>,
}

#[derive(Serialize)]
struct PartRequest {
    text: String,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Content {
            role: role.map(str::to_string),
            parts: vec![PartRequest { text: text.to_string() }],
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(self) -> Vec<PartResponse> {
        self.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default()
    }

    fn text(self) -> Option<String> {
        let text: String = self
            .first_parts()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    fn inline_audio(self) -> Option<String> {
        self.first_parts()
            .into_iter()
            .find_map(|part| part.inline_data)
            .map(|inline| inline.data)
    }
}

/// Decode little-endian 16-bit mono PCM into samples in [-1, 1).
/// A trailing odd byte is ignored.
pub fn pcm16_to_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Pull a JSON string array out of a model reply, tolerating code fences
pub fn parse_string_array(raw: &str) -> Option<Vec<String>> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end <= start {
        return None;
    }
    let items: Vec<String> = serde_json::from_str(&cleaned[start..=end]).ok()?;
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

pub fn fallback_starters() -> Vec<String> {
    FALLBACK_STARTERS.iter().map(|s| s.to_string()).collect()
}

/// Spoken reply ready for playback
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Socratic physics guide backed by the Gemini REST API.
/// Calls are single attempts; any failure becomes a fixed Thai message.
pub struct GeminiTutor {
    config: TutorConfig,
    api_key: Option<String>,
    base_url: String,
    cache: ResponseCache,
    metrics: Metrics,
}

impl GeminiTutor {
    pub fn new(config: TutorConfig, metrics: Metrics) -> Self {
        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "No Gemini API key set, tutor will answer with fallbacks");
        }
        GeminiTutor {
            config,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            cache: ResponseCache::default(),
            metrics,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Gemini API key is not configured")?;
        let url = format!("{}/{}:generateContent?key={}", self.base_url, model, api_key);

        let response = http_client()
            .post(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Gemini model '{}'", model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini model '{}' returned {}: {}", model, status, body);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .with_context(|| format!("Failed to parse Gemini response from '{}'", model))
    }

    /// Text generation with the response cache in front
    async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        generation_config: Option<serde_json::Value>,
    ) -> Result<Option<String>, PhyemError> {
        let model = self.config.text_model.as_str();
        let cache_prompt = format!("{}\n{}", system_instruction.unwrap_or_default(), prompt);
        if let Some(hit) = self.cache.get(model, &cache_prompt) {
            return Ok(Some(hit));
        }

        self.metrics.record_tutor_request();
        let request = GenerateContentRequest {
            contents: vec![Content::text(Some("user"), prompt)],
            system_instruction: system_instruction.map(|text| Content::text(None, text)),
            generation_config,
        };

        let start = Instant::now();
        let result = self.generate(model, &request).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                log_collaborator_call(COLLABORATOR, true, Some(latency_ms));
                let text = response.text();
                if let Some(text) = &text {
                    self.cache.put(model, &cache_prompt, text);
                }
                Ok(text)
            }
            Err(e) => {
                log_collaborator_call(COLLABORATOR, false, Some(latency_ms));
                self.metrics.record_collaborator_failure();
                Err(PhyemError::from(e).with_collaborator(COLLABORATOR).with_context(format!("model: {}", model)))
            }
        }
    }

    /// Guide-style answer to a learner question
    pub async fn ask(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_ANSWER_FALLBACK.to_string();
        }
        match self.generate_text(question, Some(GUIDE_INSTRUCTION), None).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_ANSWER_FALLBACK.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Tutor question failed");
                CONNECTION_FALLBACK.to_string()
            }
        }
    }

    /// Five Thai sentence starters for the CER reasoning box
    pub async fn sentence_starters(&self) -> Vec<String> {
        let generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": { "type": "ARRAY", "items": { "type": "STRING" } }
        });
        match self.generate_text(STARTERS_PROMPT, None, Some(generation_config)).await {
            Ok(Some(text)) => parse_string_array(&text).unwrap_or_else(|| {
                tracing::warn!("Sentence starters were not a JSON string array");
                fallback_starters()
            }),
            Ok(None) => fallback_starters(),
            Err(e) => {
                tracing::error!(error = %e, "Fetching sentence starters failed");
                fallback_starters()
            }
        }
    }

    /// Short encouraging feedback on the learner's reasoning
    pub async fn evaluate_reasoning(&self, reasoning: &str) -> String {
        if reasoning.trim().is_empty() {
            return REASONING_PROMPT.to_string();
        }
        match self.generate_text(&reasoning_prompt(reasoning), None, None).await {
            Ok(Some(text)) => text,
            Ok(None) => REASONING_EMPTY_FALLBACK.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Evaluating reasoning failed");
                REASONING_ERROR_FALLBACK.to_string()
            }
        }
    }

    /// Read a message aloud. None when speech is unavailable; playback is skipped then.
    pub async fn speak(&self, text: &str) -> Option<SpeechClip> {
        if text.trim().is_empty() {
            return None;
        }
        self.metrics.record_tutor_request();
        let model = self.config.tts_model.as_str();
        let request = GenerateContentRequest {
            contents: vec![Content::text(None, text)],
            system_instruction: None,
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.config.voice } }
                }
            })),
        };

        let start = Instant::now();
        let result = self.generate(model, &request).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let audio = match result {
            Ok(response) => response.inline_audio(),
            Err(e) => {
                log_collaborator_call(COLLABORATOR, false, Some(latency_ms));
                self.metrics.record_collaborator_failure();
                tracing::error!(error = %e, "Text to speech failed");
                return None;
            }
        };
        log_collaborator_call(COLLABORATOR, true, Some(latency_ms));

        let bytes = match BASE64_STANDARD.decode(audio?.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Speech payload was not valid base64");
                return None;
            }
        };
        Some(SpeechClip {
            sample_rate: TTS_SAMPLE_RATE,
            samples: pcm16_to_samples(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_tutor() -> (GeminiTutor, Metrics) {
        let metrics = Metrics::new();
        let mut tutor = GeminiTutor::new(TutorConfig::default(), metrics.clone());
        tutor.api_key = None;
        (tutor, metrics)
    }

    #[test]
    fn pcm_decoding_is_little_endian_and_scaled() {
        let samples = pcm16_to_samples(&[0x00, 0x80, 0xff, 0x7f, 0x00, 0x00, 0x01]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], -1.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < 1e-6);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn parses_fenced_string_arrays() {
        let raw = "```json\n[\"a\", \" b \", \"\"]\n```";
        assert_eq!(parse_string_array(raw), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(parse_string_array("[]"), None);
        assert_eq!(parse_string_array("not json"), None);
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "สวัส" }, { "text": "ดี" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("สวัสดี"));
    }

    #[test]
    fn response_audio_reads_inline_data() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "audio/L16", "data": "AAA=" } }] } }]
        }))
        .unwrap();
        assert_eq!(response.inline_audio().as_deref(), Some("AAA="));
    }

    #[tokio::test]
    async fn empty_reasoning_asks_for_reasoning_without_a_call() {
        let (tutor, metrics) = offline_tutor();
        assert_eq!(tutor.evaluate_reasoning("  ").await, REASONING_PROMPT);
        assert_eq!(metrics.snapshot().tutor_requests, 0);
    }

    #[tokio::test]
    async fn missing_key_falls_back_everywhere() {
        let (tutor, metrics) = offline_tutor();
        assert_eq!(tutor.ask("ทำไมไข่ไม่สุก").await, CONNECTION_FALLBACK);
        assert_eq!(tutor.sentence_starters().await, fallback_starters());
        assert_eq!(tutor.evaluate_reasoning("eddy current").await, REASONING_ERROR_FALLBACK);
        assert!(tutor.speak("hello").await.is_none());
        assert_eq!(metrics.snapshot().collaborator_failures, 4);
    }

    #[tokio::test]
    async fn cached_answer_skips_the_network() {
        let (tutor, metrics) = offline_tutor();
        let cache_prompt = format!("{}\n{}", GUIDE_INSTRUCTION, "why?");
        tutor.cache().put(&TutorConfig::default().text_model, &cache_prompt, "ลองสังเกตดูสิ 🎯");
        assert_eq!(tutor.ask("why?").await, "ลองสังเกตดูสิ 🎯");
        assert_eq!(metrics.snapshot().tutor_requests, 0);
    }
}

use rand::Rng;

use exam_core::model::{Question, QuestionId};

use super::QuestionRequest;

const FALLBACK_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];

/// Placeholder questions used when the generator cannot be reached, so an exam
/// can still be taken end to end.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackQuestions;

impl FallbackQuestions {
    #[must_use]
    pub fn generate(request: &QuestionRequest) -> Vec<Question> {
        Self::generate_with(&mut rand::rng(), request)
    }

    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, request: &QuestionRequest) -> Vec<Question> {
        let slug = request.subject.trim().to_ascii_lowercase().replace(' ', "-");
        (1..=request.count)
            .map(|n| {
                let text = format!(
                    "[FALLBACK] Sample {} question for {} #{n}. (Backend unavailable)",
                    request.difficulty, request.subject
                );
                Question::new(
                    QuestionId::new(format!("fallback-{slug}-{n}")),
                    text,
                    FALLBACK_OPTIONS.iter().map(|o| (*o).to_string()).collect(),
                    rng.random_range(0..FALLBACK_OPTIONS.len()),
                )
                .with_explanation(
                    "This is a fallback question because the backend could not be reached.",
                )
                .with_subject(request.subject.clone())
            })
            .collect()
    }
}

use crate::models::quiz::QuestionType;

pub const DEFAULT_NUM_QUESTIONS: usize = 10;

/// What the provider is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub question_type: QuestionType,
    pub num_questions: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            question_type: QuestionType::MultipleChoice,
            num_questions: DEFAULT_NUM_QUESTIONS,
        }
    }
}

/// Renders the instruction sent to the provider. The source text is embedded
/// verbatim between triple quotes.
pub fn build_prompt(source_text: &str, params: &GenerationParams) -> String {
    let mut prompt = String::with_capacity(source_text.len() + 1024);

    prompt.push_str("You are an assistant that writes quizzes from source text.\n");
    prompt.push_str("The source text is given below. Build the quiz only from it.\n");
    prompt.push_str("Rules:\n");
    prompt.push_str("- Respond with ONLY a valid JSON object. No prose, no markdown fences.\n");
    prompt.push_str("- The object has exactly two keys: \"title\" (string) and \"questions\" (array).\n");
    prompt.push_str("- Every element of \"questions\" is an object with:\n");
    prompt.push_str("  - \"questionText\": string,\n");
    prompt.push_str("  - \"options\": array of strings for multiple-choice, otherwise null,\n");
    prompt.push_str("  - \"correctAnswer\": string (for multiple-choice, the exact text of one option),\n");
    prompt.push_str("  - \"type\": \"multiple-choice\" or \"text\".\n");
    if params.question_type == QuestionType::MultipleChoice {
        prompt.push_str("- Give each question 3 to 5 plausible options.\n");
    }
    prompt.push_str(&format!(
        "- Write exactly {} questions of type \"{}\".\n",
        params.num_questions, params.question_type
    ));
    prompt.push_str("- Use facts, definitions and examples from the source text.\n");
    prompt.push_str("- Make sure the JSON parses without errors.\n\n");
    prompt.push_str("Source text:\n\"\"\"\n");
    prompt.push_str(source_text);
    prompt.push_str("\n\"\"\"\n\nReturn the JSON object now.");

    prompt
}

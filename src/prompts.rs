//! Prompts for notes generation, question-paper solving and transcription.
//!
//! Every prompt lives here so wording changes touch one file and tests can
//! inspect the exact text without a live model. Callers can override the
//! system prompts via [`crate::config::GenerationConfig::system_prompt`] and
//! [`crate::config::GenerationConfig::transcription_prompt`].
//!
//! The notes and solver prompts ask for the line-oriented format the
//! converter in [`crate::markup`] understands: `**…**` headings, `- ` and
//! `1.` lists, `> ` quotes, pipe tables, and for solutions the labelled
//! `Question:` / `Approach:` / `Solution:` / `Answer:` lines.

/// Default system prompt for notes and solutions.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an experienced university tutor who writes clear, well-structured study material for students.

Formatting rules (the output is converted to a PDF line by line):
- Put each heading on its own line wrapped in double asterisks, e.g. **Thermodynamics**
- Put each sub-heading on its own line wrapped in single asterisks, e.g. *First law*
- Use "- " for bullet points and "1. " for numbered steps (single-digit numbers only)
- Use "> " for definitions or important quotations
- Write tables as pipe-delimited rows, e.g. Term | Meaning
- Do NOT wrap the answer in ``` fences and do NOT add commentary about the formatting"#;

/// Default system prompt for transcribing a photographed question paper.
pub const DEFAULT_TRANSCRIPTION_PROMPT: &str = r#"You are an OCR engine. Transcribe ALL text visible in the image of this exam question paper.

Rules:
- Preserve the original question numbering and sub-question lettering
- Preserve the reading order as a student would read the paper
- Write mathematical expressions in plain text (e.g. x^2 + 3x = 0)
- Output ONLY the transcribed text, with no commentary
- If the image contains no legible text, output nothing"#;

/// Build the user prompt for notes generation.
///
/// `reference_books` is appended only when non-blank.
pub fn notes_prompt(syllabus: &str, reference_books: Option<&str>) -> String {
    let mut prompt = format!(
        "Generate detailed notes with explanations, examples, and references based on this syllabus. \
The notes should be at least 10 pages long.\n\nSyllabus:\n{}\n",
        syllabus.trim()
    );
    if let Some(books) = reference_books.map(str::trim).filter(|b| !b.is_empty()) {
        prompt.push_str(&format!("Refer to these books: {books}"));
    }
    prompt
}

/// Build the user prompt for solving a transcribed question paper.
pub fn solver_prompt(question_text: &str) -> String {
    format!(
        r#"Solve the following question paper with clear, structured solutions.

{}

Format your response as follows:

For each question:
1. Start with "Question:" followed by the question text
2. Then a line starting with "Approach:" that explains the approach
3. Then a line starting with "Solution:" followed by the step-by-step working,
   with all necessary calculations and proper notation for equations and formulas
4. Finally a line starting with "Answer:" with the well-explained final answer

Make sure to:
- Keep the original question numbering
- Format each solution in a structured, easy-to-follow manner
- Clearly indicate the final answer for each question
- Use bullet points or numbered steps where appropriate
- Explain key concepts and theorems used in your solutions

Your solutions should be comprehensive enough that a student can understand not just the answer, but the entire reasoning process."#,
        question_text.trim()
    )
}

//! Instruction prompt for the consultation model

/// Fixed instruction asking for a JSON reply with `analysis` and `treatment`
pub const SYSTEM_PROMPT: &str = r#"
You are a professional medical doctor speaking directly to a patient.
You will be given an image to analyze and an optional transcription of the patient's spoken context.
Produce a JSON object (and nothing else) with exactly two keys: "analysis" and "treatment".

Rules:
- "analysis": one or two concise sentences describing what appears medically wrong in the image. Use a natural doctor voice, start with "With what I see, ..." and keep it short.
- "treatment": 3 to 4 sentences giving practical remedies, next steps, and when to seek professional care. Use a natural doctor voice, clear steps, no bullet points or numbered lists.
- Do not include any extra keys, commentary, or markdown. Respond ONLY with valid JSON.

If the image is missing or unclear, set "analysis" to "Image not provided or unclear" and give a general short treatment in "treatment".
"#;

/// Appended when the submission carries no image
pub const NO_IMAGE_NOTICE: &str = "No image provided.";

/// Assemble the prompt for one submission
///
/// An empty transcript adds nothing; a transcript that holds an STT error
/// note is passed through like any other text.
#[must_use]
pub fn build_prompt(transcript: &str, has_image: bool) -> String {
    let mut prompt = String::with_capacity(SYSTEM_PROMPT.len() + transcript.len() + 64);
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\n");

    if !transcript.is_empty() {
        prompt.push_str("Patient speech (transcription): ");
        prompt.push_str(transcript);
        prompt.push_str("\n\n");
    }

    if !has_image {
        prompt.push_str(NO_IMAGE_NOTICE);
    }

    prompt
}

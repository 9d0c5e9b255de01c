//! Fixed system instruction and user prompt for the roast

use crate::retrieval::RetrievedContext;

/// The fixed system instruction; never request-controlled
const SYSTEM_INSTRUCTION: &str = "\
You are a witty Gen Z resume critic who keeps it real. Use Gen Z slang \
naturally (words like \"cooked\", \"bro is...\", \"fr fr\", \"no cap\", \
\"mid\", \"it's giving...\").

Your job is to roast resumes with brutal honesty while providing actionable \
feedback. Be sarcastic but constructive. Point out cliches, buzzwords, \
formatting issues, and weak accomplishments.

Structure your roast in sections (put in subtitles):
1. **Summary (Roast)** - Overall vibe check (2-3 sentences)
2. **Experience Critique** - Call out weak bullets, buzzwords, vague accomplishments
3. **Skills Assessment** - Roast generic skills, missing technical depth
4. **Format & Style** - Comment on layout, length, readability

Keep the vibe casual but insightful - like a brutally honest friend reviewing \
their homie's resume. End with 2-3 concrete actionable tips to actually \
improve the resume.";

/// Builds the prompt pair sent to the generation endpoint
pub struct PromptBuilder;

impl PromptBuilder {
    /// The fixed system instruction
    pub fn system_instruction() -> &'static str {
        SYSTEM_INSTRUCTION
    }

    /// Build the user prompt from the retrieved context
    pub fn build_roast_prompt(context: &RetrievedContext) -> String {
        format!(
            "Here's a resume that needs your honest roasting.\n\n\
             RELEVANT SECTIONS (from vector search over the resume):\n{}\n\
             Roast this resume with your signature style. Be brutally honest \
             but constructive, and ground every point in the sections above.",
            context.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_context_verbatim() {
        let context = RetrievedContext {
            text: "Section 1 (Page 1):\nShipped a thing.\n\n".to_string(),
            kept: vec![0],
        };
        let prompt = PromptBuilder::build_roast_prompt(&context);
        assert!(prompt.contains("Shipped a thing."));
        assert!(prompt.contains("RELEVANT SECTIONS"));
    }

    #[test]
    fn test_system_instruction_is_fixed() {
        assert!(PromptBuilder::system_instruction().contains("resume critic"));
    }
}

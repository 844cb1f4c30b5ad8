//! Answer generation and prompt assembly.

use async_trait::async_trait;

use crate::error::Result;

/// Delimiter placed between chunk texts in the assembled context.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Prompt template. The model must answer only from the supplied context and
/// say so when the context is insufficient.
pub const RAG_PROMPT_TEMPLATE: &str = "\
You are a helpful assistant that answers questions based on the provided context.
Use ONLY the information in the context below to answer the question.
If the context does not contain enough information to answer, say so clearly.
Do not make up information.

Context:
{context}

Question: {question}

Answer:";

/// A language model that turns a prompt into free text.
///
/// Implementations do not retry; a failed call is reported once.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// A short label used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    ///
    /// Fails with [`RagError::GenerationUnavailable`](crate::RagError::GenerationUnavailable)
    /// when the model cannot be reached and with
    /// [`RagError::GenerationError`](crate::RagError::GenerationError) otherwise.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Join chunk texts, in ranked order, with [`CONTEXT_DELIMITER`].
pub fn assemble_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(CONTEXT_DELIMITER)
}

/// Fill [`RAG_PROMPT_TEMPLATE`] with the context and question.
pub fn build_prompt(context: &str, question: &str) -> String {
    // Substitute the question first so braces inside chunk text are never
    // mistaken for a placeholder.
    let (head, tail) =
        RAG_PROMPT_TEMPLATE.split_once("{context}").unwrap_or((RAG_PROMPT_TEMPLATE, ""));
    format!("{head}{context}{}", tail.replace("{question}", question))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_ranked_order_with_delimiters() {
        let context = assemble_context(&["first", "second", "third"]);
        assert_eq!(context, "first\n\n---\n\nsecond\n\n---\n\nthird");
    }

    #[test]
    fn single_chunk_context_has_no_delimiter() {
        assert_eq!(assemble_context(&["only"]), "only");
    }

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("Fire is covered.", "Is fire covered?");
        assert!(prompt.starts_with("You are a helpful assistant"));
        assert!(prompt.contains("Use ONLY the information in the context"));
        assert!(prompt.contains("say so clearly"));
        assert!(prompt.contains("Context:\nFire is covered.\n\nQuestion: Is fire covered?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn placeholders_inside_context_are_left_alone() {
        let prompt = build_prompt("template uses {question} literally", "real question");
        assert!(prompt.contains("template uses {question} literally"));
        assert!(prompt.contains("Question: real question"));
    }
}

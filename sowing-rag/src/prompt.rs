//! Grounding prompt assembly.

use crate::document::RetrievedChunk;

/// Context used when retrieval returns nothing.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";

const INSTRUCTIONS: &str = "\
Use only the information provided below to answer the user's query.
If the answer is not contained in the information provided, reply with \"I don't know.\"
Do not make up an answer.";

/// Build the prompt sent to the generative model.
///
/// Chunk texts are concatenated in rank order, separated by a blank line.
pub fn build_prompt(query: &str, chunks: &[RetrievedChunk]) -> String {
    let context = if chunks.is_empty() {
        NO_RELEVANT_INFORMATION.to_string()
    } else {
        chunks.iter().map(|c| c.document.as_str()).collect::<Vec<_>>().join("\n\n")
    };

    format!(
        "{INSTRUCTIONS}\n\n\
         Relevant Information from Retrieved Documents:\n{context}\n\n\
         User Query:\n{query}\n\n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            document: text.to_string(),
            filename: "crops.md".to_string(),
            chunk_index: 0,
            score: 0.5,
        }
    }

    #[test]
    fn empty_retrieval_uses_placeholder() {
        let prompt = build_prompt("When to sow rice?", &[]);
        assert!(prompt.contains(
            "Relevant Information from Retrieved Documents:\nNo relevant information found.\n\n"
        ));
        assert!(prompt.contains("User Query:\nWhen to sow rice?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn chunks_joined_in_rank_order() {
        let prompt = build_prompt("q", &[chunk("first"), chunk("second")]);
        assert!(prompt.contains("Retrieved Documents:\nfirst\n\nsecond\n\nUser Query:"));
    }

    #[test]
    fn instructions_come_first() {
        let prompt = build_prompt("q", &[chunk("c")]);
        assert!(prompt.starts_with("Use only the information provided below"));
        assert!(prompt.contains("\"I don't know.\""));
        assert!(prompt.contains("Do not make up an answer."));

        let instructions = prompt.find("Do not make up").unwrap();
        let context = prompt.find("Relevant Information").unwrap();
        let query = prompt.find("User Query:").unwrap();
        let answer = prompt.find("Answer:").unwrap();
        assert!(instructions < context && context < query && query < answer);
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "sowing", version, about = "Grounded answers over sowing advisories")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command. Each can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding the vector store.
    #[arg(long, global = true, env = "SOWING_STORE_PATH", default_value = "./rag_store")]
    pub store: PathBuf,

    /// Collection chunks are stored in.
    #[arg(long, global = true, env = "SOWING_COLLECTION", default_value = "doc_chunks")]
    pub collection: String,

    /// Maximum words per chunk.
    #[arg(long, global = true, env = "SOWING_MAX_TOKENS", default_value_t = 50)]
    pub max_tokens: usize,

    /// Chunks retrieved per question.
    #[arg(long, global = true, env = "SOWING_TOP_K", default_value_t = 5)]
    pub top_k: usize,

    /// Embedding backend.
    #[arg(long, global = true, env = "SOWING_EMBEDDER", value_enum, default_value_t = EmbedderKind::Hash)]
    pub embedder: EmbedderKind,

    /// Embedding dimensionality.
    #[arg(long, global = true, env = "SOWING_EMBEDDING_DIMENSIONS", default_value_t = 384)]
    pub dimensions: usize,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, env = "SOWING_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and store every text document under a directory.
    Ingest {
        /// Directory of extracted `.md`, `.markdown` or `.txt` files.
        dir: PathBuf,
    },

    /// Show the chunks most similar to a query.
    Query {
        /// The text to search for.
        text: String,
        /// Number of results to return (defaults to --top-k).
        #[arg(short, long)]
        k: Option<usize>,
        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the stored documents.
    Ask {
        /// The question.
        text: String,
    },

    /// Print a JSON health report.
    Health,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder.
    Hash,
    /// OpenAI-compatible embeddings endpoint.
    Openai,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_with_k_and_json() {
        let cli = Cli::try_parse_from(["sowing", "query", "rice sowing", "-k", "3", "--json"])
            .unwrap();
        match cli.command {
            Command::Query { text, k, json } => {
                assert_eq!(text, "rice sowing");
                assert_eq!(k, Some(3));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sowing",
            "ingest",
            "./docs",
            "--store",
            "/tmp/store",
            "--max-tokens",
            "20",
            "--embedder",
            "openai",
        ])
        .unwrap();
        assert_eq!(cli.global.store, PathBuf::from("/tmp/store"));
        assert_eq!(cli.global.max_tokens, 20);
        assert_eq!(cli.global.embedder, EmbedderKind::Openai);
        assert!(matches!(cli.command, Command::Ingest { .. }));
    }

    #[test]
    fn unknown_embedder_rejected() {
        assert!(Cli::try_parse_from(["sowing", "--embedder", "bert", "health"]).is_err());
    }

    #[test]
    fn ask_requires_text() {
        assert!(Cli::try_parse_from(["sowing", "ask"]).is_err());
    }
}

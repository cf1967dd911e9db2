/// bridgechat: centralized constants.
/// Model defaults, endpoints, generation parameters and user-facing strings.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const API_KEY_HEADER: &str = "x-goog-api-key";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
    pub const MODEL: &str = super::models::DEFAULT_GEMINI_MODEL;
    pub const CONFIG_DIR: &str = "bridgechat";
    pub const CONFIG_FILE: &str = "config.toml";
}

// ─── Generation ───────────────────────────────────────────────────────────────

pub mod generation {
    /// Low randomness; accuracy over creativity.
    pub const TEMPERATURE: f32 = 0.4;
    pub const TOP_P: f32 = 0.95;
    pub const THINKING_BUDGET: u32 = 2048;
    /// Number of prior messages sent along with each prompt.
    pub const HISTORY_WINDOW: usize = 6;

    pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert assistant for the \"Bridge to Practice\" course.
Follow these rules strictly to keep your answers accurate:

1. Cite your sources: base your answer on the supplied documents and state, \
wherever possible, which document (and which part of it) supports each claim.
2. Reason first: work through the logical steps internally before giving \
your final answer.
3. Mark the boundary: when the documents do not cover something, you may use \
your own knowledge, but say explicitly that the information is not from the \
supplied documents.
4. Structure: explain technical terms plainly and organise the answer with \
headings and bullet points so it is easy to read.
5. Language: always answer in polite Japanese (desu/masu form).";
}

// ─── Ingestion ────────────────────────────────────────────────────────────────

pub mod ingest {
    pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";
    pub const HIDDEN_PREFIX: char = '.';
}

// ─── User-facing messages ─────────────────────────────────────────────────────

pub mod messages {
    pub const PROVIDER_FAILURE: &str = "AIとの通信中にエラーが発生しました。";
    /// Used when a failure carries no description at all.
    pub const UNKNOWN_FAILURE: &str = "Something went wrong.";
    pub const ERROR_PREFIX: &str = "Error: ";
}

// src/prompt.rs - Prompt templates for the recommendation check

/// Persona instruction sent as the system turn of every check.
pub const SYSTEM_PROMPT: &str = "あなたは優秀なSEOコンサルタントです。ユーザーの質問に対し、特定のブランドが推奨されているかをシミュレーションして答えてください。";

/// Builds the user turn embedding the search keyword and the brand name.
///
/// The model is asked to answer 「推奨されています」 with reasons when the
/// brand appears favorably, or 「推奨されていません」 with countermeasures
/// when it does not.
pub fn user_prompt(keyword: &str, brand_name: &str) -> String {
    format!(
        "質問：「{}」について教えて。\n\nこの回答の中に、「{}」という名前は好意的に登場しますか？\n登場する場合は「推奨されています」と理由を、登場しない場合は「推奨されていません」と対策を簡潔に答えて。",
        keyword, brand_name
    )
}

/// The system prompt asking a model to turn recipe text into a meal document.
///
/// Loaded from `prompt.txt` at compile time so it can be edited without
/// dealing with Rust string syntax.
pub const MEAL_PARSER_PROMPT: &str = include_str!("prompt.txt");

use serde_json::{Value, json};

use crate::config::Cefr;

pub const SYSTEM_PROMPT: &str = r#"
You are an English teacher preparing study material for learners whose first language is Traditional Chinese.
Follow the requested output format exactly and do not add commentary.
"#;

const JSON_INSTRUCTIONS: &str = "Reply with JSON that satisfies the schema above. \
Wrap the whole reply in a ```json block and add nothing outside it.";

const PLAIN_INSTRUCTIONS: &str =
    "Reply in plain English text only, without a title, explanation or markdown formatting.";

pub fn vocabulary_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "word": { "type": "string" },
                "part_of_speech": { "type": "string" },
                "zh-Hant_definition": { "type": "string" },
                "example_sentence": { "type": "string" }
            },
            "required": ["word", "part_of_speech", "zh-Hant_definition", "example_sentence"]
        }
    })
}

pub fn usage_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "word": { "type": "string" },
                "is_correct": { "type": "boolean" },
                "explanation": { "type": "string" }
            },
            "required": ["word", "is_correct", "explanation"]
        }
    })
}

pub fn mind_map_schema() -> Value {
    let node_properties = json!({
        "id": { "type": "string", "description": "The id of the node, e.g. n1, n1-1" },
        "text": { "type": "string", "description": "The text of the node" },
        "children": {
            "type": "array",
            "description": "The child nodes of this node",
            "items": { "$ref": "#/definitions/node" },
            "default": []
        }
    });
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": "The id of the root node, e.g. 'root'" },
            "text": { "type": "string", "description": "The text of the root node" },
            "children": node_properties["children"].clone()
        },
        "required": ["id", "text", "children"],
        "additionalProperties": false,
        "definitions": {
            "node": {
                "type": "object",
                "properties": node_properties,
                "required": ["id", "text", "children"],
                "additionalProperties": false
            }
        }
    })
}

pub fn reading_quiz_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "type": { "type": "string", "enum": ["Multiple_Answer", "True_Or_False"] },
                "question": { "type": "string" },
                "choices": { "type": "array", "items": { "type": "string" }, "minItems": 2 },
                "correct_choices": {
                    "type": "array",
                    "items": { "type": "integer", "minimum": 0 },
                    "minItems": 1
                },
                "answer": { "type": "boolean" },
                "explanation": { "type": "string" }
            },
            "required": ["type", "question"],
            "oneOf": [
                {
                    "properties": { "type": { "const": "Multiple_Answer" } },
                    "required": ["choices", "correct_choices"]
                },
                {
                    "properties": { "type": { "const": "True_Or_False" } },
                    "required": ["answer"]
                }
            ],
            "additionalProperties": false
        }
    })
}

fn with_schema(body: String, schema: &Value) -> String {
    let schema_str = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!("{body}\nThe JSON Schema of the reply:\n```json\n{schema_str}\n```\n{JSON_INSTRUCTIONS}")
}

pub fn vocabulary_prompt(article: &str, cefr: Cefr, count: usize) -> String {
    let fallback = match cefr.easier() {
        Some(easier) => format!(" If there are not enough words at {cefr}, take the rest from {easier}."),
        None => String::new(),
    };
    let body = format!(
        "{article}\n\nFrom the English article above, pick exactly {count} words at CEFR level {cefr}.{fallback}\n\
         For each word give its part of speech, a Traditional Chinese definition and an example sentence."
    );
    with_schema(body, &vocabulary_schema())
}

pub fn usage_prompt(words: &[String], sentences: &[String]) -> String {
    let body = format!(
        "Check whether each word is used correctly in the sentence at the same position, \
         and explain why in Traditional Chinese.\n\n\
         word_list = {}\nsentences_list = {}\n",
        json!(words),
        json!(sentences)
    );
    with_schema(body, &usage_schema())
}

pub fn cloze_passage_prompt(words: &[String], cefr: Cefr) -> String {
    format!(
        "Write a short English passage that uses every word in the list below exactly once.\n\
         The difficulty must match CEFR level {cefr}.\n\
         {PLAIN_INSTRUCTIONS}\n\n\
         Word list: {}",
        json!(words)
    )
}

pub fn hangman_hint_prompt(word: &str, cefr: Cefr) -> String {
    format!(
        "Describe the word '{word}' in one or two English sentences at CEFR level {cefr}. \
         Do not mention the word itself or any of its inflected forms.\n\
         {PLAIN_INSTRUCTIONS}"
    )
}

pub fn mind_map_prompt(article: &str) -> String {
    let body = format!(
        "{article}\n\nBuild an English mind map of the article above.\n\
         - The root node is the topic of the article.\n\
         - Each child of the root is a main branch of the topic.\n\
         - Split each main branch into sub-branches in its children.\n\
         - Go down to a third or fourth level where it helps."
    );
    with_schema(body, &mind_map_schema())
}

pub fn reading_quiz_prompt(article: &str, questions: usize) -> String {
    let body = format!(
        "{article}\n\nWrite an English reading comprehension quiz of {questions} questions about the article above. \
         Each question is either Multiple_Answer or True_Or_False. \
         correct_choices holds zero-based indices into choices."
    );
    with_schema(body, &reading_quiz_schema())
}

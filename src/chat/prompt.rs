use serde::{Deserialize, Serialize};

pub mod template;

use template::{numbered_list, render};

pub const DEFAULT_INTRODUCTION: &str = "You are a {personality} chatbot";

pub const DEFAULT_SYSTEM: &str = "Answer the user's question using the context between the \
<context></context> tags and obeying the restrictions between the \
<restrictions></restrictions> tags.

<context>
{context}
</context>

<restrictions>
{restrictions}
</restrictions>
";

/// Templates for the two system messages the chatbot writes.
///
/// `introduction` takes `{personality}`, `system` takes `{context}` and
/// `{restrictions}`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct PromptTemplates {
    pub introduction: String,
    pub system: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            introduction: DEFAULT_INTRODUCTION.to_string(),
            system: DEFAULT_SYSTEM.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn introduction(&self, personality: &str) -> String {
        render(&self.introduction, &[("personality", personality)])
    }

    pub fn system_prompt(&self, contexts: &[String], restrictions: &[String]) -> String {
        let context = numbered_list(contexts);
        let restrictions = numbered_list(restrictions);

        render(
            &self.system,
            &[("context", &context), ("restrictions", &restrictions)],
        )
    }
}

//! Prompts for the professor recommendation assistant. The retrieved
//! reviews are rendered with Handlebars which can't do much without
//! registered helpers, so review text pulled from the index can't
//! change how the template behaves.

use std::fmt;

use anyhow::{Error, Result};
use handlebars::Handlebars;
use serde::Serialize;

use super::services::RetrievedItem;

#[derive(Debug)]
pub enum Prompt {
    RetrievedReviews,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub const SYSTEM_PROMPT: &str = r"
# Rate My Professor Assistant

You help students find professors that fit what they are looking for. Each student message is followed by the professor reviews that were retrieved for it from a database of reviews. Base your answer on those reviews.

## Your Response Should
1. Be concise and focus on the details that matter for the student's request.
2. Include each professor's name, subject, star rating and a short summary of what reviewers say about them.
3. Call out anything the student asked about specifically, such as teaching style, difficulty or grading.
4. Mention drawbacks as well as strengths when the reviews support it.

## Response Format
1. A short introduction addressing the student's request.
2. Up to 3 professor recommendations, each as:
    - Professor Name (Subject) - Star Rating
    - A brief summary based on the reviews.
3. A short conclusion with any further advice.

## Guidelines
- Stay neutral and stick to what the reviews say.
- If the request is too vague, ask a clarifying question.
- If no professor matches, suggest the closest alternatives and say why.
- Only recommend professors that appear in the retrieved reviews. Never invent professors, ratings or reviews. If the data is not enough, say so.
- Do not share personal information about professors beyond what is in the reviews.
";

const RETRIEVED_REVIEWS_PROMPT: &str = r"

Returned results from vector db (done automatically):
{{#each items}}

Professor: {{id}}
Review: {{review}}
Subject: {{subject}}
Stars: {{stars}}
{{/each}}
";

#[derive(Serialize)]
struct ReviewContext<'a> {
    id: &'a str,
    review: &'a str,
    subject: &'a str,
    // Pre-formatted so whole ratings render as "5" rather than "5.0"
    stars: String,
}

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Output goes to the model, not a browser
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(
            &Prompt::RetrievedReviews.to_string(),
            RETRIEVED_REVIEWS_PROMPT,
        )
        .expect("Failed to register template");
    registry
}

/// Serialize the retrieved reviews into the context block appended to
/// the student's message. No items renders just the header.
pub fn render_retrieved_reviews(items: &[RetrievedItem]) -> Result<String, Error> {
    let items: Vec<ReviewContext> = items
        .iter()
        .map(|item| ReviewContext {
            id: &item.id,
            review: &item.review,
            subject: &item.subject,
            stars: item.stars.to_string(),
        })
        .collect();
    let context = serde_json::json!({ "items": items });
    let rendered = templates().render(&Prompt::RetrievedReviews.to_string(), &context)?;
    Ok(rendered)
}

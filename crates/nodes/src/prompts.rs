//! Prompt templates for the writer and reviewer.
//!
//! Templates use `{placeholder}` markers filled by the `render_*` functions.
//! Every template ends by demanding bare output, because whatever the model
//! returns is stored as the article (or the review) verbatim.

/// First draft, from the topic and the research findings.
pub const FIRST_DRAFT: &str = r#"You are an engaging tech storyteller. Write a blog post about "{topic}" using this research:
{research_data}

STYLE GUIDELINES:
- Write in a natural, conversational tone (avoid sounding robotic or academic).
- Start with a hook that grabs attention immediately.
- Avoid generic headers and stock transition phrases (e.g. "In conclusion", "Moreover", "Furthermore").
- Use analogies to explain complex concepts.
- Ask questions to engage the reader.
- Vary sentence length.
- Keep paragraphs short and punchy.

Return ONLY the blog post. No preamble, no notes, no commentary."#;

/// Revision of an earlier draft, driven by the reviewer's feedback.
pub const REVISION: &str = r#"You are an engaging tech storyteller, writing for a human audience.
Update your previous blog post based strictly on this feedback.

FEEDBACK: {review_feedback}
ORIGINAL POST: {blog_post}

STYLE GUIDELINES:
- Write in a natural, conversational tone (like you're talking to a friend).
- Avoid stock transition phrases like "Moreover", "Furthermore" or "In conclusion".
- Use rhetorical questions, analogies, and varied sentence lengths.
- Keep paragraphs short.
- Show personality. It's okay to be slightly opinionated or enthusiastic.

Return ONLY the updated blog post. No preamble, no notes, no commentary."#;

/// Editorial review against the fixed rubric.
pub const REVIEW: &str = r#"You are a senior editor. Review the following blog post.

CRITERIA:
1. Is it comprehensive?
2. Is the tone engaging and conversational (human-like)?
3. Are there any robotic transitions (e.g. "In conclusion", "Moreover")? If so, flag them.
4. Does it use varied sentence structure?

BLOG POST:
{blog_post}

If the post meets every criterion, reply with exactly: APPROVE
Reply with nothing else in that case.
If it needs work, list the specific critique and the concrete changes required."#;

pub fn render_first_draft(topic: &str, research_data: &[String]) -> String {
    let findings = research_data.join("\n\n");
    fill(
        FIRST_DRAFT,
        &[("topic", topic), ("research_data", findings.as_str())],
    )
}

pub fn render_revision(blog_post: &str, review_feedback: &str) -> String {
    fill(
        REVISION,
        &[("review_feedback", review_feedback), ("blog_post", blog_post)],
    )
}

pub fn render_review(blog_post: &str) -> String {
    fill(REVIEW, &[("blog_post", blog_post)])
}

/// Single-pass substitution: text inserted for one placeholder is never
/// scanned for another.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let marker = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| marker.starts_with(key) && marker[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &marker[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = marker;
            }
        }
    }
    out.push_str(rest);
    out
}

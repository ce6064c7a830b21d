//! Rendering documentation content with the shared highlighter.
//!
//! Without a highlighter, or for a language it doesn't know, code falls back
//! to an escaped `<pre><code>` block.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use tracing::debug;

use crate::highlighter::Highlighter;

pub fn plain_code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(code))
}

/// Render one code block. An empty or missing `language` means the
/// highlighter's own grammar.
pub fn render_code_block(
    highlighter: Option<&Highlighter>,
    language: Option<&str>,
    code: &str,
) -> String {
    let Some(highlighter) = highlighter else {
        return plain_code_block(code);
    };

    let language = language.map(str::trim).filter(|lang| !lang.is_empty());
    match highlighter.highlight_html(code, language) {
        Ok(html) => html,
        Err(e) => {
            debug!(error = %e, "falling back to plain code block");
            plain_code_block(code)
        }
    }
}

/// Markdown to HTML, with fenced and indented code blocks routed through
/// [`render_code_block`].
pub fn render_markdown(source: &str, highlighter: Option<&Highlighter>) -> String {
    let parser = Parser::new_ext(source, Options::all());

    let events: Vec<Event> = parser.collect();
    let mut processed_events = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_string)
                    }
                    CodeBlockKind::Indented => None,
                };

                // Collect all text events until the end of the code block
                let mut code = String::new();
                i += 1;
                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }

                let block = render_code_block(highlighter, language.as_deref(), &code);
                processed_events.push(Event::Html(block.into()));
            }
            _ => processed_events.push(events[i].clone()),
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, processed_events.into_iter());

    out
}

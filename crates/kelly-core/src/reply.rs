//! Response assembly: backend result + caller entitlements -> outbound reply.

use crate::{
    domain::{CallerContext, ChatResponse, RenderedReply, SourceEntry},
    formatting::{code_span, escape_markdown_v2},
};

/// User-safe answer substituted whenever the backend could not produce one.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I could not reach the main system right now. Please try again.";

/// Assemble the final reply text and rendering mode.
///
/// Sources are appended only when the caller is both in the configured
/// debug-user set AND has the per-user toggle on. Authorization alone must not
/// leak sources: an authorized user who has not opted in sees exactly what a
/// normal user sees.
pub fn render(result: &ChatResponse, caller: &CallerContext) -> RenderedReply {
    // Defensive: the backend adapter never returns an empty answer, but the
    // assembler does not trust callers blindly. An empty answer also forces an
    // empty source list for this render.
    let (answer, sources): (&str, &[SourceEntry]) = if result.answer.is_empty() {
        (FALLBACK_ANSWER, &[])
    } else {
        (result.answer.as_str(), result.sources.as_slice())
    };

    let show_debug = caller.authorized_for_debug && caller.debug_enabled;
    if !show_debug {
        return RenderedReply {
            text: answer.to_string(),
            rich: false,
        };
    }

    // Debug block: blank line, horizontal rule, bold header, bulleted sources.
    // Everything literal inside the block is MarkdownV2-escaped; source ids go
    // in code spans so embedded punctuation renders as-is.
    let mut text = String::from(answer);
    text.push_str("\n\n");
    text.push_str(&escape_markdown_v2("---"));
    text.push('\n');
    text.push_str(&format!("*{}*", escape_markdown_v2("Sources (Debug):")));

    if sources.is_empty() {
        text.push_str(" None");
    } else {
        for src in sources {
            text.push_str("\n • ");
            text.push_str(&source_line(src));
        }
    }

    RenderedReply { text, rich: true }
}

fn source_line(src: &SourceEntry) -> String {
    match src.score {
        Some(score) => format!(
            "{} {}",
            code_span(&src.source_id),
            escape_markdown_v2(&format!("({score:.3})"))
        ),
        None => code_span(&src.source_id),
    }
}

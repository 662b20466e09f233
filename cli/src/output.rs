//! Rendering answers for the terminal.

use std::fmt::Write;

use docqa_rag::AnswerPackage;

/// Renders the answer followed by a numbered `Sources:` list.
///
/// ```text
/// Total B2C orders were 1.2 billion (Page 3).
///
/// Sources:
/// [1] Page 3: Total B2C orders: 1.2 billion...
/// ```
#[must_use]
pub fn render_answer(package: &AnswerPackage) -> String {
    let mut out = String::new();
    out.push_str(&package.answer);
    out.push('\n');
    if package.source_chunks.is_empty() {
        return out;
    }
    out.push_str("\nSources:\n");
    out.push_str(&render_sources(package));
    out
}

/// One `[i] Page N: excerpt` line per source chunk, numbered from 1.
#[must_use]
pub fn render_sources(package: &AnswerPackage) -> String {
    package
        .citations()
        .enumerate()
        .fold(String::new(), |mut out, (i, (page, excerpt))| {
            let excerpt = excerpt.replace('\n', " ");
            let _ = writeln!(out, "[{}] Page {page}: {excerpt}", i + 1);
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_rag::Chunk;

    fn package() -> AnswerPackage {
        AnswerPackage {
            answer: "1.2 billion (Page 3)".into(),
            source_chunks: vec![
                Chunk::new("report#chunk_4", "Total B2C orders:\n1.2 billion", 3, 4),
                Chunk::new("report#chunk_9", "Average order value", 5, 9),
            ],
        }
    }

    #[test]
    fn sources_are_numbered_with_pages() {
        assert_eq!(
            render_sources(&package()),
            "[1] Page 3: Total B2C orders: 1.2 billion\n[2] Page 5: Average order value\n"
        );
    }

    #[test]
    fn answer_precedes_sources() {
        let rendered = render_answer(&package());
        assert!(rendered.starts_with("1.2 billion (Page 3)\n\nSources:\n[1] Page 3:"));
    }

    #[test]
    fn long_excerpts_are_cut() {
        let long = "x".repeat(500);
        let package = AnswerPackage {
            answer: "a".into(),
            source_chunks: vec![Chunk::new("d#chunk_0", long, 1, 0)],
        };
        let line = render_sources(&package);
        assert!(line.trim_end().ends_with("..."));
        assert!(line.len() < 500);
    }

    #[test]
    fn no_sources_no_heading() {
        let package = AnswerPackage {
            answer: "nothing".into(),
            source_chunks: Vec::new(),
        };
        assert_eq!(render_answer(&package), "nothing\n");
    }
}

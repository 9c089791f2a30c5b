//! Builder-pattern printer rendering parse errors as annotated snippets.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use crate::result::ParseResult;

/// Renders a result's error list against its source. The plain
/// `message (line:column)` listing lives on [`ParseResult`] itself; this
/// printer produces the annotated form.
pub struct ErrorPrinter<'r, 'a> {
    result: &'r ParseResult<'a>,
    path: Option<&'r str>,
    colored: bool,
}

impl<'r, 'a> ErrorPrinter<'r, 'a> {
    pub fn new(result: &'r ParseResult<'a>) -> ErrorPrinter<'r, 'a> {
        ErrorPrinter {
            result,
            path: None,
            colored: false,
        }
    }

    pub fn path(mut self, path: &'r str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, out: &mut impl Write) -> std::fmt::Result {
        if self.result.errors.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (index, error) in self.result.errors.iter().enumerate() {
            let range = adjust_range(
                error.source_start as usize,
                error.source_end as usize,
                self.result.src.len(),
            );

            let mut snippet = Snippet::source(self.result.src).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(range)
                    .label(error.message),
            );
            if let Some(path) = self.path {
                snippet = snippet.path(path);
            }

            let report = [Level::ERROR.primary_title(error.message).element(snippet)];

            if index > 0 {
                out.write_char('\n')?;
            }
            write!(out, "{}", renderer.render(&report))?;
        }

        Ok(())
    }
}

impl<'a> ParseResult<'a> {
    pub fn printer(&self) -> ErrorPrinter<'_, 'a> {
        ErrorPrinter::new(self)
    }
}

fn adjust_range(start: usize, end: usize, limit: usize) -> std::ops::Range<usize> {
    let start = start.min(limit);
    let end = end.min(limit);
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}

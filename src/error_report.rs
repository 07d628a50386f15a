//! Human readable rendering of compilation errors.

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::{
    codegen::error::{Error, ErrorCategory},
    common::Span,
};

/// Render `error` as an annotated excerpt of `source`.
///
/// Errors which are not tied to the source (I/O failures) are rendered
/// as their plain message. Errors without a location (unexpected end of
/// input) point at the last character of the source.
pub fn render(file_path: &str, source: &str, error: &Error) -> String {
    if matches!(error.category(), ErrorCategory::Input | ErrorCategory::Output) {
        return error.to_string();
    }

    let span = error
        .span()
        .unwrap_or(source.len().saturating_sub(1)..source.len());
    let span = to_char_span(source, &span);

    let mut output = Vec::new();

    let written = Report::build(ReportKind::Error, file_path, span.start)
        .with_config(Config::default().with_color(false))
        .with_message(format!("{} error", error.category()))
        .with_label(Label::new((file_path, span)).with_message(error.to_string()))
        .finish()
        .write((file_path, Source::from(source)), &mut output);

    match (written, String::from_utf8(output)) {
        (Ok(()), Ok(report)) => report,
        _ => error.to_string(),
    }
}

/// Reports are located by characters, while tokens are located by bytes.
fn to_char_span(source: &str, span: &Span) -> Span {
    let to_char_offset = |byte_offset: usize| {
        source
            .get(..byte_offset)
            .map_or_else(|| source.chars().count(), |prefix| prefix.chars().count())
    };

    to_char_offset(span.start)..to_char_offset(span.end)
}

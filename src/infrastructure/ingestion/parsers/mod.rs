//! Document parser implementations

mod pdf;
mod plain_text;

pub use pdf::PdfParser;
pub use plain_text::PlainTextParser;

#[cfg(test)]
pub(crate) use pdf::fixtures;

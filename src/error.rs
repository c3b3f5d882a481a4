use locspan::Span;
use std::{convert::Infallible, io};

/// Error kind.
///
/// `E` is the error type of the underlying character source.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind<E = Infallible> {
	#[error("unexpected character `{}`", .0.escape_debug())]
	UnexpectedCharacter(char),

	#[error("unexpected end of file")]
	UnexpectedEof,

	#[error("invalid unicode codepoint expression")]
	InvalidCodepoint,

	#[error("unterminated quad, expecting `.`")]
	UnterminatedQuad,

	#[error("relative IRI <{0}>")]
	RelativeIri(String),

	#[error("invalid IRI <{0}>")]
	InvalidIri(String),

	#[error("invalid language tag `{0}`")]
	InvalidLangTag(String),

	#[error(transparent)]
	Stream(E),
}

/// Reading error.
///
/// Wraps an [`ErrorKind`] with the position at which it occurred.
/// The first line is 1, the first column is 0. Columns count characters,
/// a `\r\n` sequence counting as one.
#[derive(Debug, thiserror::Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct Error<E = Infallible> {
	line: usize,
	column: usize,
	span: Span,
	#[source]
	kind: ErrorKind<E>,
}

impl<E> Error<E> {
	pub(crate) fn new(line: usize, column: usize, span: Span, kind: ErrorKind<E>) -> Self {
		Self {
			line,
			column,
			span,
			kind,
		}
	}

	/// Line where the error occurred.
	pub fn line(&self) -> usize {
		self.line
	}

	/// Column (character index in the line) where the error occurred.
	pub fn column(&self) -> usize {
		self.column
	}

	/// Byte range of the offending character in the whole input.
	///
	/// Empty when the error is located at the end of the input.
	pub fn span(&self) -> Span {
		self.span
	}

	pub fn kind(&self) -> &ErrorKind<E> {
		&self.kind
	}

	pub fn into_kind(self) -> ErrorKind<E> {
		self.kind
	}
}

impl From<Error<io::Error>> for io::Error {
	fn from(error: Error<io::Error>) -> Self {
		match error.kind {
			ErrorKind::Stream(e) => e,
			_ => Self::new(io::ErrorKind::InvalidData, error),
		}
	}
}

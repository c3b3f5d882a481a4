use crate::{
	error::{Error, ErrorKind},
	lexing::Lexer,
	source::{ReadChars, StrChars},
	Literal, Quad, Term,
};
use decoded_char::DecodedChar;
use iref::IriBuf;
use langtag::LangTagBuf;
use std::{convert::Infallible, fmt, io::BufRead};

/// Reader options.
///
/// By default IRIs in absolute positions are only required to contain a `:`,
/// and language tags to follow the N-Quads `LANGTAG` production.
#[derive(Default, Clone, Copy, Debug)]
#[must_use]
pub struct ReaderOptions {
	validate_iris: bool,
	validate_lang_tags: bool,
}

impl ReaderOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Checks that every IRI is a valid absolute IRI (RFC 3987).
	pub fn validate_iris(mut self) -> Self {
		self.validate_iris = true;
		self
	}

	/// Checks that every language tag is a well-formed BCP47 tag.
	pub fn validate_lang_tags(mut self) -> Self {
		self.validate_lang_tags = true;
		self
	}

	pub fn reader<C: Iterator<Item = Result<DecodedChar, E>>, E>(self, chars: C) -> Reader<C, E> {
		Reader {
			lexer: Lexer::new(chars),
			options: self,
			state: State::Ready,
			quad: Quad::default(),
			count: 0,
		}
	}

	pub fn reader_from_str(self, s: &str) -> Reader<StrChars, Infallible> {
		self.reader(StrChars::new(s))
	}

	pub fn reader_from_read<R: BufRead>(self, read: R) -> Reader<ReadChars<R>, std::io::Error> {
		self.reader(ReadChars::new(read))
	}
}

enum State<E> {
	Ready,

	/// An error occurred, no more quads will be read.
	Failed(Error<E>),

	/// End of stream, or error already handed over.
	Done,
}

/// N-Quads reader.
///
/// Reads one quad per call to [`Reader::advance`]. The first error ends the
/// reading session: every following call returns `false`.
pub struct Reader<C, E> {
	lexer: Lexer<C>,
	options: ReaderOptions,
	state: State<E>,
	quad: Quad,
	count: usize,
}

impl<C: Iterator<Item = Result<DecodedChar, E>>, E> Reader<C, E> {
	pub fn new(chars: C) -> Self {
		ReaderOptions::new().reader(chars)
	}
}

impl<'a> Reader<StrChars<'a>, Infallible> {
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &'a str) -> Self {
		ReaderOptions::new().reader_from_str(s)
	}
}

impl<R: BufRead> Reader<ReadChars<R>, std::io::Error> {
	pub fn from_read(read: R) -> Self {
		ReaderOptions::new().reader_from_read(read)
	}
}

impl<E: fmt::Display, C: Iterator<Item = Result<DecodedChar, E>>> Reader<C, E> {
	/// Reads the next quad.
	///
	/// Returns `false` if no quad could be read, either because the end of
	/// the stream is reached or because an error occurred. The error is then
	/// available through [`Reader::error`].
	pub fn advance(&mut self) -> bool {
		match self.step() {
			Some(quad) => {
				self.quad = quad;
				true
			}
			None => {
				self.quad = Quad::default();
				false
			}
		}
	}

	/// Error that stopped the reader, if any.
	pub fn error(&self) -> Option<&Error<E>> {
		match &self.state {
			State::Failed(e) => Some(e),
			_ => None,
		}
	}

	/// Last quad read.
	///
	/// This is the empty quad (all terms [`Term::Unknown`]) if the last call to
	/// [`Reader::advance`] returned `false`.
	pub fn quad(&self) -> &Quad {
		&self.quad
	}

	/// Current line and column.
	pub fn position(&self) -> (usize, usize) {
		self.lexer.position()
	}

	fn step(&mut self) -> Option<Quad> {
		if !matches!(self.state, State::Ready) {
			return None;
		}

		match self.next_quad() {
			Ok(Some(quad)) => {
				self.count += 1;
				log::trace!("quad {}: {quad}", self.count);
				Some(quad)
			}
			Ok(None) => {
				log::debug!("end of stream after {} quads", self.count);
				self.state = State::Done;
				None
			}
			Err(e) => {
				log::debug!("reading stopped: {e}");
				self.state = State::Failed(e);
				None
			}
		}
	}

	/// Skips blank lines and comments until the beginning of a statement.
	///
	/// Returns `false` at the end of the stream.
	fn begin_statement(&mut self) -> Result<bool, Error<E>> {
		loop {
			match self.lexer.skip_spaces()? {
				None => break Ok(false),
				Some('\n' | '\r') => self.lexer.new_line(),
				Some('#') => match self.lexer.skip_comment()? {
					Some(_) => self.lexer.new_line(),
					None => break Ok(false),
				},
				Some(_) => {
					self.lexer.unread();
					break Ok(true);
				}
			}
		}
	}

	/// Reads the rest of the line after the final `.` of a statement.
	fn end_statement(&mut self) -> Result<(), Error<E>> {
		match self.lexer.skip_spaces()? {
			None => Ok(()),
			Some('\n' | '\r') => {
				self.lexer.new_line();
				Ok(())
			}
			Some('#') => {
				if self.lexer.skip_comment()?.is_some() {
					self.lexer.new_line()
				}

				Ok(())
			}
			Some(c) => Err(self.lexer.unexpected(Some(c))),
		}
	}

	fn next_quad(&mut self) -> Result<Option<Quad>, Error<E>> {
		if !self.begin_statement()? {
			return Ok(None);
		}

		let subject = self.lexer.next_iri_or_blank()?;
		self.check_term(&subject)?;

		let predicate = self.lexer.next_iri_or_blank()?;
		self.check_term(&predicate)?;

		let object = self.lexer.next_term()?;
		self.check_term(&object)?;

		let graph = match self.lexer.next_graph_or_end()? {
			Some(graph) => {
				self.check_term(&graph)?;
				match self.lexer.skip_spaces()? {
					Some('.') => graph,
					Some(c) => return Err(self.lexer.unexpected(Some(c))),
					None => return Err(self.lexer.error(ErrorKind::UnterminatedQuad)),
				}
			}
			None => Term::Unknown,
		};

		self.end_statement()?;

		Ok(Some(Quad {
			subject,
			predicate,
			object,
			graph,
		}))
	}

	/// Checks the IRIs and language tag of a term.
	fn check_term(&self, term: &Term) -> Result<(), Error<E>> {
		match term {
			Term::Iri(iri) | Term::Literal(Literal::TypedString(_, iri)) => self.check_iri(iri),
			Term::Literal(Literal::LangString(_, tag)) if self.options.validate_lang_tags => {
				match LangTagBuf::new(tag.clone()) {
					Ok(_) => Ok(()),
					Err(_) => Err(self.lexer.error(ErrorKind::InvalidLangTag(tag.clone()))),
				}
			}
			_ => Ok(()),
		}
	}

	fn check_iri(&self, iri: &str) -> Result<(), Error<E>> {
		if !iri.contains(':') {
			return Err(self.lexer.error(ErrorKind::RelativeIri(iri.to_string())));
		}

		if self.options.validate_iris && IriBuf::new(iri.to_string()).is_err() {
			return Err(self.lexer.error(ErrorKind::InvalidIri(iri.to_string())));
		}

		Ok(())
	}
}

/// Iterates over the quads, then over the error that stopped the reader, if
/// any.
///
/// The error is moved out of the reader: [`Reader::error`] returns `None`
/// once it has been yielded.
impl<E: fmt::Display, C: Iterator<Item = Result<DecodedChar, E>>> Iterator
	for Reader<C, E>
{
	type Item = Result<Quad, Error<E>>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.step() {
			Some(quad) => Some(Ok(quad)),
			None => match std::mem::replace(&mut self.state, State::Done) {
				State::Failed(e) => Some(Err(e)),
				_ => None,
			},
		}
	}
}

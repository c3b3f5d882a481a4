use crate::{
	error::{Error, ErrorKind},
	Literal, Term,
};
use decoded_char::DecodedChar;
use locspan::Span;
use std::{collections::VecDeque, iter::Fuse};

/// Location of the last character examined by the cursor.
#[derive(Clone, Copy, Default)]
struct Mark {
	column: usize,
	span: Span,
}

/// Characters cursor.
///
/// Folds `\r\n` into a single `\n`, supports pushing back the last read
/// character and peeking at the next one.
struct Cursor<C> {
	chars: Fuse<C>,

	/// Raw characters pulled from the source but not yet consumed.
	ahead: VecDeque<DecodedChar>,

	/// Character pushed back by `unread`.
	pushback: Option<DecodedChar>,

	/// Last character read, if it can be pushed back.
	last: Option<DecodedChar>,

	line: usize,

	/// Number of characters consumed on the current line.
	column: usize,

	/// Number of bytes consumed.
	offset: usize,

	mark: Mark,
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Cursor<C> {
	fn new(chars: C) -> Self {
		Self {
			chars: chars.fuse(),
			ahead: VecDeque::with_capacity(2),
			pushback: None,
			last: None,
			line: 1,
			column: 0,
			offset: 0,
			mark: Mark::default(),
		}
	}

	fn raw_peek(&mut self, n: usize) -> Result<Option<DecodedChar>, E> {
		while self.ahead.len() <= n {
			match self.chars.next() {
				Some(c) => self.ahead.push_back(c?),
				None => return Ok(None),
			}
		}

		Ok(self.ahead.get(n).copied())
	}

	fn raw_next(&mut self) -> Result<Option<DecodedChar>, E> {
		match self.ahead.pop_front() {
			Some(c) => Ok(Some(c)),
			None => self.chars.next().transpose(),
		}
	}

	fn pull(&mut self) -> Result<Option<DecodedChar>, E> {
		match self.raw_next()? {
			Some(c) if *c == '\r' => match self.raw_peek(0)? {
				Some(n) if *n == '\n' => {
					self.ahead.pop_front();
					Ok(Some(DecodedChar::new('\n', c.len() + n.len())))
				}
				_ => Ok(Some(c)),
			},
			c => Ok(c),
		}
	}

	fn next(&mut self) -> Result<Option<char>, E> {
		let c = match self.pushback.take() {
			Some(c) => c,
			None => match self.pull()? {
				Some(c) => c,
				None => {
					self.last = None;
					self.mark = Mark {
						column: self.column,
						span: Span::new(self.offset, self.offset),
					};
					return Ok(None);
				}
			},
		};

		self.mark = Mark {
			column: self.column,
			span: Span::new(self.offset, self.offset + c.len()),
		};
		self.column += 1;
		self.offset += c.len();
		self.last = Some(c);
		Ok(Some(*c))
	}

	/// Pushes back the last read character.
	///
	/// Does nothing if the last read hit the end of the stream or if the
	/// character has already been pushed back.
	fn unread(&mut self) {
		if let Some(c) = self.last.take() {
			self.column -= 1;
			self.offset -= c.len();
			self.pushback = Some(c)
		}
	}

	/// Returns the next logical character without consuming it.
	fn peek(&mut self) -> Result<Option<char>, E> {
		if let Some(c) = self.pushback {
			return Ok(Some(*c));
		}

		match self.raw_peek(0)? {
			Some(c) if *c == '\r' => match self.raw_peek(1)? {
				Some(n) if *n == '\n' => Ok(Some('\n')),
				_ => Ok(Some('\r')),
			},
			c => Ok(c.map(DecodedChar::into_char)),
		}
	}
}

/// Term lexer.
///
/// Every `next_*` method reading a term starts right after the character
/// that selected it (`<`, `_` or `"`).
pub(crate) struct Lexer<C> {
	cursor: Cursor<C>,
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Lexer<C> {
	pub fn new(chars: C) -> Self {
		Self {
			cursor: Cursor::new(chars),
		}
	}

	/// Current line and column.
	pub fn position(&self) -> (usize, usize) {
		(self.cursor.line, self.cursor.column)
	}

	/// Builds an error located at the last examined character.
	pub fn error(&self, kind: ErrorKind<E>) -> Error<E> {
		Error::new(
			self.cursor.line,
			self.cursor.mark.column,
			self.cursor.mark.span,
			kind,
		)
	}

	pub fn unexpected(&self, c: Option<char>) -> Error<E> {
		match c {
			Some(c) => self.error(ErrorKind::UnexpectedCharacter(c)),
			None => self.error(ErrorKind::UnexpectedEof),
		}
	}

	fn stream_error(&self, e: E) -> Error<E> {
		Error::new(
			self.cursor.line,
			self.cursor.column,
			Span::new(self.cursor.offset, self.cursor.offset),
			ErrorKind::Stream(e),
		)
	}

	pub fn next_char(&mut self) -> Result<Option<char>, Error<E>> {
		self.cursor.next().map_err(|e| self.stream_error(e))
	}

	fn expect_char(&mut self) -> Result<char, Error<E>> {
		self.next_char()?.ok_or_else(|| self.unexpected(None))
	}

	fn peek_char(&mut self) -> Result<Option<char>, Error<E>> {
		self.cursor.peek().map_err(|e| self.stream_error(e))
	}

	pub fn unread(&mut self) {
		self.cursor.unread()
	}

	/// Registers that a line terminator has just been consumed.
	pub fn new_line(&mut self) {
		self.cursor.line += 1;
		self.cursor.column = 0;
	}

	/// Skips spaces and tabulations, and returns the first other character.
	pub fn skip_spaces(&mut self) -> Result<Option<char>, Error<E>> {
		loop {
			match self.next_char()? {
				Some(c) if is_space(c) => (),
				c => break Ok(c),
			}
		}
	}

	/// Skips the rest of a comment, after the first `#` character.
	///
	/// Returns the line terminator ending the comment, or `None` at the end of
	/// the stream.
	pub fn skip_comment(&mut self) -> Result<Option<char>, Error<E>> {
		loop {
			match self.next_char()? {
				Some(c) if is_line_terminator(c) => break Ok(Some(c)),
				Some(_) => (),
				None => break Ok(None),
			}
		}
	}

	/// Parses a `\u` or `\U` escape sequence, after the `u` or `U`.
	fn next_uchar(&mut self, len: u8) -> Result<char, Error<E>> {
		let mut codepoint = 0;

		for _ in 0..len {
			let c = self.expect_char()?;
			match c.to_digit(16) {
				Some(d) => codepoint = codepoint << 4 | d,
				None => return Err(self.error(ErrorKind::InvalidCodepoint)),
			}
		}

		char::from_u32(codepoint).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint))
	}

	/// Parses an IRI, starting after the first `<` until the closing `>`.
	fn next_iri(&mut self) -> Result<String, Error<E>> {
		let mut iri = String::new();

		loop {
			match self.next_char()? {
				Some('>') => {
					if iri.is_empty() {
						return Err(self.unexpected(Some('>')));
					}

					break Ok(iri);
				}
				Some('\\') => {
					let c = match self.next_char()? {
						Some('u') => self.next_uchar(4)?,
						Some('U') => self.next_uchar(8)?,
						unexpected => return Err(self.unexpected(unexpected)),
					};

					iri.push(c)
				}
				Some(c) if is_iri_forbidden(c) => return Err(self.unexpected(Some(c))),
				Some(c) => iri.push(c),
				None => return Err(self.unexpected(None)),
			}
		}
	}

	/// Parses a blank node label, starting after the first `_`.
	///
	/// The returned label does not include the `_:` prefix.
	fn next_blank_node_label(&mut self) -> Result<String, Error<E>> {
		match self.next_char()? {
			Some(':') => (),
			unexpected => return Err(self.unexpected(unexpected)),
		}

		let mut label = String::new();
		match self.next_char()? {
			Some(c) if is_pn_chars_u(c) || is_numeral(c) => label.push(c),
			unexpected => return Err(self.unexpected(unexpected)),
		}

		loop {
			match self.next_char()? {
				Some(c) if is_pn_chars(c) => label.push(c),
				Some('.') => {
					// Periods belong to the label only if it goes on after them.
					let mut dots = 1;
					while let Some('.') = self.peek_char()? {
						self.next_char()?;
						dots += 1;
					}

					match self.peek_char()? {
						Some(c) if is_pn_chars(c) => {
							label.extend(std::iter::repeat('.').take(dots))
						}
						_ if dots == 1 => {
							self.unread();
							break;
						}
						_ => return Err(self.unexpected(Some('.'))),
					}
				}
				Some(_) => {
					self.unread();
					break;
				}
				None => return Err(self.unexpected(None)),
			}
		}

		Ok(label)
	}

	/// Parses a string literal, starting after the first `"` until the closing `"`.
	fn next_string_literal(&mut self) -> Result<String, Error<E>> {
		let mut string = String::new();

		loop {
			match self.next_char()? {
				Some('"') => break Ok(string),
				Some('\\') => {
					let c = match self.next_char()? {
						Some('u') => self.next_uchar(4)?,
						Some('U') => self.next_uchar(8)?,
						Some('t') => '\t',
						Some('b') => '\u{08}',
						Some('n') => '\n',
						Some('r') => '\r',
						Some('f') => '\u{0c}',
						Some('\'') => '\'',
						Some('"') => '"',
						Some('\\') => '\\',
						unexpected => return Err(self.unexpected(unexpected)),
					};

					string.push(c)
				}
				Some(c) if is_line_terminator(c) => return Err(self.unexpected(Some(c))),
				Some(c) => string.push(c),
				None => return Err(self.unexpected(None)),
			}
		}
	}

	/// Parses the rest of a lang tag, after the first `@` character.
	///
	/// The first subtag is made of letters, the following ones of letters and
	/// digits.
	fn next_langtag(&mut self) -> Result<String, Error<E>> {
		let mut tag = String::new();
		let mut major = true;
		let mut empty_subtag = true;

		loop {
			match self.next_char()? {
				Some(c) if is_alpha(c) || (!major && is_numeral(c)) => {
					tag.push(c);
					empty_subtag = false
				}
				Some('-') if !empty_subtag => {
					tag.push('-');
					major = false;
					empty_subtag = true
				}
				Some(c) if !empty_subtag && is_term_follower(c) => {
					self.unread();
					break Ok(tag);
				}
				unexpected => return Err(self.unexpected(unexpected)),
			}
		}
	}

	/// Parses a literal, starting after the first `"`, including its
	/// language tag or datatype.
	fn next_literal(&mut self) -> Result<Literal, Error<E>> {
		let string = self.next_string_literal()?;

		match self.next_char()? {
			Some('@') => Ok(Literal::LangString(string, self.next_langtag()?)),
			Some('^') => {
				for expected in ['^', '<'] {
					match self.next_char()? {
						Some(c) if c == expected => (),
						unexpected => return Err(self.unexpected(unexpected)),
					}
				}

				Ok(Literal::TypedString(string, self.next_iri()?))
			}
			Some(c) if is_term_follower(c) => {
				self.unread();
				Ok(Literal::String(string))
			}
			unexpected => Err(self.unexpected(unexpected)),
		}
	}

	/// Parses an IRI or a blank node, the only terms allowed as subject or
	/// predicate.
	pub fn next_iri_or_blank(&mut self) -> Result<Term, Error<E>> {
		match self.skip_spaces()? {
			Some('<') => Ok(Term::Iri(self.next_iri()?)),
			Some('_') => Ok(Term::Blank(self.next_blank_node_label()?)),
			unexpected => Err(self.unexpected(unexpected)),
		}
	}

	/// Parses any term.
	pub fn next_term(&mut self) -> Result<Term, Error<E>> {
		match self.skip_spaces()? {
			Some('<') => Ok(Term::Iri(self.next_iri()?)),
			Some('_') => Ok(Term::Blank(self.next_blank_node_label()?)),
			Some('"') => Ok(Term::Literal(self.next_literal()?)),
			unexpected => Err(self.unexpected(unexpected)),
		}
	}

	/// Parses a graph label, or the final `.` of a statement without graph
	/// label (in which case `None` is returned).
	pub fn next_graph_or_end(&mut self) -> Result<Option<Term>, Error<E>> {
		match self.skip_spaces()? {
			Some('.') => Ok(None),
			Some('<') => Ok(Some(Term::Iri(self.next_iri()?))),
			Some('_') => Ok(Some(Term::Blank(self.next_blank_node_label()?))),
			Some(c) => Err(self.unexpected(Some(c))),
			None => Err(self.error(ErrorKind::UnterminatedQuad)),
		}
	}
}

/// Characters that can directly follow a literal without separator.
fn is_term_follower(c: char) -> bool {
	is_space(c) || matches!(c, '.' | '<' | '_')
}

fn is_line_terminator(c: char) -> bool {
	matches!(c, '\n' | '\r')
}

fn is_iri_forbidden(c: char) -> bool {
	matches!(
		c,
		'\u{00}'..='\u{20}' | '<' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'
	)
}

pub fn is_alpha(c: char) -> bool {
	c.is_ascii_alphabetic()
}

pub fn is_numeral(c: char) -> bool {
	c.is_ascii_digit()
}

/// Space or tabulation.
///
/// Line terminators are not spaces: they end statements.
pub fn is_space(c: char) -> bool {
	matches!(c, ' ' | '\t')
}

pub fn is_pn_chars_base(c: char) -> bool {
	matches!(c, 'A'..='Z' | 'a'..='z' | '\u{00c0}'..='\u{00d6}' | '\u{00d8}'..='\u{00f6}' | '\u{00f8}'..='\u{02ff}' | '\u{0370}'..='\u{037d}' | '\u{037f}'..='\u{1fff}' | '\u{200c}'..='\u{200d}' | '\u{2070}'..='\u{218f}' | '\u{2c00}'..='\u{2fef}' | '\u{3001}'..='\u{d7ff}' | '\u{f900}'..='\u{fdcf}' | '\u{fdf0}'..='\u{fffd}' | '\u{10000}'..='\u{effff}')
}

pub fn is_pn_chars_u(c: char) -> bool {
	is_pn_chars_base(c) || matches!(c, '_' | ':')
}

pub fn is_pn_chars(c: char) -> bool {
	is_pn_chars_u(c)
		|| is_numeral(c)
		|| matches!(c, '-' | '\u{00b7}' | '\u{0300}'..='\u{036f}' | '\u{203f}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::StrChars;

	fn lexer(s: &str) -> Lexer<StrChars<'_>> {
		Lexer::new(StrChars::new(s))
	}

	fn kind(e: Error) -> ErrorKind {
		e.into_kind()
	}

	#[test]
	fn cursor_folds_crlf() {
		let mut l = lexer("a\r\nb\rc");
		assert_eq!(l.next_char().unwrap(), Some('a'));
		assert_eq!(l.peek_char().unwrap(), Some('\n'));
		assert_eq!(l.next_char().unwrap(), Some('\n'));
		assert_eq!(l.cursor.offset, 3);
		assert_eq!(l.next_char().unwrap(), Some('b'));
		assert_eq!(l.next_char().unwrap(), Some('\r'));
		assert_eq!(l.next_char().unwrap(), Some('c'));
		assert_eq!(l.next_char().unwrap(), None);
		assert_eq!(l.position(), (1, 5))
	}

	#[test]
	fn cursor_unread() {
		let mut l = lexer("ab");
		assert_eq!(l.next_char().unwrap(), Some('a'));
		l.unread();
		assert_eq!(l.position(), (1, 0));
		assert_eq!(l.peek_char().unwrap(), Some('a'));
		assert_eq!(l.next_char().unwrap(), Some('a'));
		assert_eq!(l.next_char().unwrap(), Some('b'));
		assert_eq!(l.position(), (1, 2))
	}

	#[test]
	fn iri() {
		let mut l = lexer("<http://example.org/\\u00E9>");
		assert_eq!(
			l.next_term().unwrap(),
			Term::Iri("http://example.org/é".to_string())
		)
	}

	#[test]
	fn iri_errors() {
		assert!(matches!(
			kind(lexer("<>").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('>')
		));
		assert!(matches!(
			kind(lexer("<a b>").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter(' ')
		));
		assert!(matches!(
			kind(lexer("<a{b}>").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('{')
		));
		assert!(matches!(
			kind(lexer("<a\\nb>").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('n')
		));
		assert!(matches!(
			kind(lexer("<http://a").next_term().unwrap_err()),
			ErrorKind::UnexpectedEof
		))
	}

	#[test]
	fn blank_node_trailing_period() {
		let mut l = lexer("_:a.");
		assert_eq!(l.next_term().unwrap(), Term::Blank("a".to_string()));
		assert_eq!(l.next_char().unwrap(), Some('.'));

		let mut l = lexer("_:a. ");
		assert_eq!(l.next_term().unwrap(), Term::Blank("a".to_string()));

		let mut l = lexer("_:a.b ");
		assert_eq!(l.next_term().unwrap(), Term::Blank("a.b".to_string()));

		let mut l = lexer("_:a..b ");
		assert_eq!(l.next_term().unwrap(), Term::Blank("a..b".to_string()));

		assert!(matches!(
			kind(lexer("_:a.. ").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('.')
		))
	}

	#[test]
	fn blank_node_labels() {
		let mut l = lexer("_:0a-b\u{00b7}c<");
		assert_eq!(l.next_term().unwrap(), Term::Blank("0a-b\u{00b7}c".to_string()));
		assert_eq!(l.next_char().unwrap(), Some('<'));

		assert!(matches!(
			kind(lexer("_abc ").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('a')
		));
		assert!(matches!(
			kind(lexer("_:-abc ").next_term().unwrap_err()),
			ErrorKind::UnexpectedCharacter('-')
		));
		assert!(matches!(
			kind(lexer("_:").next_term().unwrap_err()),
			ErrorKind::UnexpectedEof
		));
		assert!(matches!(
			kind(lexer("_:abc").next_term().unwrap_err()),
			ErrorKind::UnexpectedEof
		))
	}

	#[test]
	fn literal_escapes() {
		let mut l = lexer(r#""a\tb\n\"c\\d" "#);
		assert_eq!(
			l.next_term().unwrap(),
			Term::Literal(Literal::String("a\tb\n\"c\\d".to_string()))
		);

		let mut l = lexer(r#""é\U0001F600" "#);
		assert_eq!(
			l.next_term().unwrap(),
			Term::Literal(Literal::String("é😀".to_string()))
		)
	}

	#[test]
	fn invalid_codepoints() {
		for input in [r#""\uZZZZ""#, r#""\UZZZZZZZZ""#, r#""\uD800""#, r#""\U00110000""#] {
			assert!(matches!(
				kind(lexer(input).next_term().unwrap_err()),
				ErrorKind::InvalidCodepoint
			))
		}

		assert!(matches!(
			kind(lexer(r#""\u00"#).next_term().unwrap_err()),
			ErrorKind::UnexpectedEof
		))
	}

	#[test]
	fn literal_annotations() {
		let mut l = lexer("\"chat\"@en-GB .");
		assert_eq!(
			l.next_term().unwrap(),
			Term::Literal(Literal::LangString(
				"chat".to_string(),
				"en-GB".to_string()
			))
		);

		let mut l = lexer("\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>.");
		assert_eq!(
			l.next_term().unwrap(),
			Term::Literal(Literal::TypedString(
				"1".to_string(),
				"http://www.w3.org/2001/XMLSchema#integer".to_string()
			))
		);
		assert_eq!(l.next_char().unwrap(), Some('.'))
	}

	#[test]
	fn literal_annotation_errors() {
		for (input, c) in [
			("\"foo\"@ .", ' '),
			("\"foo\"@1en .", '1'),
			("\"foo\"@en- .", ' '),
			("\"foo\"@en--gb .", '-'),
			("\"foo\"^ .", ' '),
			("\"foo\"^^< .", ' '),
			("\"foo\"^^<> .", '>'),
			("\"foo\"x .", 'x'),
			("\"foo\nbar\" .", '\n'),
		] {
			match kind(lexer(input).next_term().unwrap_err()) {
				ErrorKind::UnexpectedCharacter(found) => assert_eq!(found, c, "{input}"),
				other => panic!("unexpected error {other} for {input}"),
			}
		}

		assert!(matches!(
			kind(lexer("\"foo\"@en").next_term().unwrap_err()),
			ErrorKind::UnexpectedEof
		))
	}

	#[test]
	fn subject_dispatch_rejects_literals() {
		assert!(matches!(
			kind(lexer("  \"a\"").next_iri_or_blank().unwrap_err()),
			ErrorKind::UnexpectedCharacter('"')
		))
	}

	#[test]
	fn graph_or_end() {
		assert_eq!(lexer(" \t.").next_graph_or_end().unwrap(), None);
		assert_eq!(
			lexer("<http://g>").next_graph_or_end().unwrap(),
			Some(Term::Iri("http://g".to_string()))
		);
		assert!(matches!(
			kind(lexer("  ").next_graph_or_end().unwrap_err()),
			ErrorKind::UnterminatedQuad
		));
		assert!(matches!(
			kind(lexer("\"g\" .").next_graph_or_end().unwrap_err()),
			ErrorKind::UnexpectedCharacter('"')
		))
	}

	#[test]
	fn error_location() {
		let err = lexer("  <a b>").next_term().unwrap_err();
		assert_eq!((err.line(), err.column()), (1, 4));
		assert_eq!((err.span().start, err.span().end), (4, 5));

		let err = lexer("<é").next_term().unwrap_err();
		assert_eq!((err.line(), err.column()), (1, 2));
		assert_eq!((err.span().start, err.span().end), (3, 3))
	}

	#[test]
	fn pn_chars_classes() {
		assert!(is_pn_chars_base('\u{00c0}'));
		assert!(!is_pn_chars_base('\u{00d7}'));
		assert!(!is_pn_chars_base('\u{00f7}'));
		assert!(is_pn_chars_base('\u{10000}'));
		assert!(!is_pn_chars_base('\u{f0000}'));
		assert!(is_pn_chars_u('_') && is_pn_chars_u(':'));
		assert!(!is_pn_chars_u('-') && !is_pn_chars_u('0'));
		assert!(is_pn_chars('-') && is_pn_chars('0') && is_pn_chars('\u{00b7}'));
		assert!(is_pn_chars('\u{0300}') && is_pn_chars('\u{2040}'));
		assert!(!is_pn_chars('.') && !is_pn_chars(' '));
		assert!(is_space('\t') && !is_space('\n'))
	}
}

//! Character sources.
//!
//! A [`Reader`](crate::Reader) reads from any iterator of fallible
//! [`DecodedChar`]s. This module provides such iterators for string slices
//! and buffered byte readers.
use decoded_char::DecodedChar;
use std::{convert::Infallible, io::BufRead, str::Chars};

/// Characters of a string slice.
pub struct StrChars<'a>(Chars<'a>);

impl<'a> StrChars<'a> {
	pub fn new(s: &'a str) -> Self {
		Self(s.chars())
	}
}

impl<'a> Iterator for StrChars<'a> {
	type Item = Result<DecodedChar, Infallible>;

	fn next(&mut self) -> Option<Self::Item> {
		self.0
			.next()
			.map(|c| Ok(DecodedChar::new(c, c.len_utf8())))
	}
}

/// Characters of a UTF-8 encoded byte stream.
///
/// The stream is read one line at a time. Invalid UTF-8 is reported as an
/// [`std::io::ErrorKind::InvalidData`] error.
pub struct ReadChars<R> {
	read: R,
	line: String,
	pos: usize,
	failed: bool,
}

impl<R: BufRead> ReadChars<R> {
	pub fn new(read: R) -> Self {
		Self {
			read,
			line: String::new(),
			pos: 0,
			failed: false,
		}
	}
}

impl<R: BufRead> Iterator for ReadChars<R> {
	type Item = Result<DecodedChar, std::io::Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}

		if self.pos >= self.line.len() {
			self.line.clear();
			self.pos = 0;
			match self.read.read_line(&mut self.line) {
				Ok(0) => return None,
				Ok(_) => (),
				Err(e) => {
					self.failed = true;
					return Some(Err(e));
				}
			}
		}

		let c = self.line[self.pos..].chars().next()?;
		self.pos += c.len_utf8();
		Some(Ok(DecodedChar::new(c, c.len_utf8())))
	}
}

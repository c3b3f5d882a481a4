//! Streaming reader for the [N-Quads](https://www.w3.org/TR/n-quads/) RDF
//! serialization format.
//!
//! ```
//! use nquads_reader::{Reader, Term};
//!
//! let mut reader = Reader::from_str(
//! 	"# people\n<http://example.com/foo> <http://schema.org/name> \"Foo\" <http://example.com/g> .\n",
//! );
//!
//! assert!(reader.advance());
//! assert_eq!(reader.quad().graph, Term::Iri("http://example.com/g".to_string()));
//! assert!(!reader.advance());
//! assert!(reader.error().is_none());
//! ```
use std::fmt;

mod error;
pub mod lexing;
mod parsing;
pub mod source;

pub use error::{Error, ErrorKind};
pub use parsing::{Reader, ReaderOptions};

/// RDF term.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Term {
	/// IRI, without the enclosing `<` and `>`.
	Iri(String),

	/// Blank node, identified by its label without the `_:` prefix.
	Blank(String),

	Literal(Literal),

	/// No term, such as the graph label of a triple in the default graph.
	#[default]
	Unknown,
}

impl Term {
	pub fn is_iri(&self) -> bool {
		matches!(self, Self::Iri(_))
	}

	pub fn is_blank(&self) -> bool {
		matches!(self, Self::Blank(_))
	}

	pub fn is_literal(&self) -> bool {
		matches!(self, Self::Literal(_))
	}

	pub fn is_typed_literal(&self) -> bool {
		matches!(self, Self::Literal(Literal::TypedString(_, _)))
	}

	pub fn is_language_literal(&self) -> bool {
		matches!(self, Self::Literal(Literal::LangString(_, _)))
	}

	pub fn is_unknown(&self) -> bool {
		matches!(self, Self::Unknown)
	}
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{}>", DisplayIri(iri)),
			Self::Blank(label) => write!(f, "_:{label}"),
			Self::Literal(lit) => lit.fmt(f),
			Self::Unknown => Ok(()),
		}
	}
}

/// RDF literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
	/// Plain literal, implicitly typed as a string.
	String(String),

	/// Language tagged string (lexical form, language tag).
	LangString(String, String),

	/// Typed string (lexical form, datatype IRI).
	TypedString(String, String),
}

impl Literal {
	pub fn lexical_form(&self) -> &str {
		match self {
			Self::String(s) | Self::LangString(s, _) | Self::TypedString(s, _) => s,
		}
	}

	pub fn language(&self) -> Option<&str> {
		match self {
			Self::LangString(_, tag) => Some(tag),
			_ => None,
		}
	}

	pub fn datatype(&self) -> Option<&str> {
		match self {
			Self::TypedString(_, iri) => Some(iri),
			_ => None,
		}
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "\"{}\"", DisplayStringLiteral(self.lexical_form()))?;
		match self {
			Self::String(_) => Ok(()),
			Self::LangString(_, tag) => write!(f, "@{tag}"),
			Self::TypedString(_, iri) => write!(f, "^^<{}>", DisplayIri(iri)),
		}
	}
}

/// Wrapper to display string literals.
pub struct DisplayStringLiteral<'a>(pub &'a str);

impl<'a> fmt::Display for DisplayStringLiteral<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for c in self.0.chars() {
			match c {
				'"' => write!(f, "\\\""),
				'\\' => write!(f, "\\\\"),
				'\n' => write!(f, "\\n"),
				'\r' => write!(f, "\\r"),
				'\t' => write!(f, "\\t"),
				'\u{08}' => write!(f, "\\b"),
				'\u{0c}' => write!(f, "\\f"),
				'\0'..='\u{1f}' | '\u{7f}' => write!(f, "\\u{:04X}", u32::from(c)),
				c => c.fmt(f),
			}?
		}

		Ok(())
	}
}

/// Wrapper to display IRIs.
///
/// Characters that cannot appear raw in an IRI are escaped.
struct DisplayIri<'a>(&'a str);

impl<'a> fmt::Display for DisplayIri<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for c in self.0.chars() {
			match c {
				'\0'..='\u{20}' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
					write!(f, "\\u{:04X}", u32::from(c))
				}
				c => c.fmt(f),
			}?
		}

		Ok(())
	}
}

/// RDF Quad.
///
/// The graph is [`Term::Unknown`] for triples of the default graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quad {
	pub subject: Term,
	pub predicate: Term,
	pub object: Term,
	pub graph: Term,
}

impl fmt::Display for Quad {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} {} {} ", self.subject, self.predicate, self.object)?;
		if !self.graph.is_unknown() {
			write!(f, "{} ", self.graph)?;
		}

		write!(f, ".")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_term(s: &str) -> Term {
		let input = format!("<http://s> <http://p> {s} .");
		let mut reader = Reader::from_str(&input);
		assert!(reader.advance(), "{:?}", reader.error());
		reader.quad().object.clone()
	}

	#[test]
	fn render_round_trip() {
		let terms = [
			Term::Iri("http://example.org/a b>".to_string()),
			Term::Blank("b0.x".to_string()),
			Term::Literal(Literal::String("a\tb\n\"c\\d\u{01}é".to_string())),
			Term::Literal(Literal::LangString("chat".to_string(), "fr".to_string())),
			Term::Literal(Literal::TypedString(
				"1".to_string(),
				"http://www.w3.org/2001/XMLSchema#integer".to_string(),
			)),
		];

		for term in terms {
			let rendered = term.to_string();
			assert_eq!(parse_term(&rendered), term);
			assert_eq!(parse_term(&rendered).to_string(), rendered)
		}
	}

	#[test]
	fn render_quad() {
		let mut quad = Quad {
			subject: Term::Blank("s".to_string()),
			predicate: Term::Iri("http://p".to_string()),
			object: Term::Literal(Literal::String("o".to_string())),
			graph: Term::Unknown,
		};
		assert_eq!(quad.to_string(), "_:s <http://p> \"o\" .");

		quad.graph = Term::Iri("http://g".to_string());
		assert_eq!(quad.to_string(), "_:s <http://p> \"o\" <http://g> .")
	}

	#[test]
	fn term_predicates() {
		let lit = Term::Literal(Literal::LangString("chat".to_string(), "en".to_string()));
		assert!(lit.is_literal() && lit.is_language_literal() && !lit.is_typed_literal());
		assert!(Term::default().is_unknown());
		assert!(Term::Iri("http://a".to_string()).is_iri());
		assert!(Term::Blank("a".to_string()).is_blank());
		assert_eq!(
			Literal::TypedString("1".to_string(), "http://dt".to_string()).datatype(),
			Some("http://dt")
		)
	}
}

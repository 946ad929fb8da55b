use std::collections::HashSet;
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// English stop words. "on" is kept: it is the brand name.
const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Longest token kept, in bytes.
pub const MAX_TOKEN_LEN: usize = 40;
/// Distinct query tokens considered per query.
pub const MAX_QUERY_TOKENS: usize = 64;

/// Shared tokenizer for entry fields and queries.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Analyzer {
	pub fn new() -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
			.build();
		Self { inner }
	}

	/// Tokens in input order, first occurrence only.
	pub fn tokens(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut seen = HashSet::new();
		let mut out = Vec::new();
		while stream.advance() {
			let token = &stream.token().text;
			if token.chars().count() >= 2 && seen.insert(token.clone()) {
				out.push(token.clone());
			}
		}
		out
	}

	pub fn query_tokens(&self, text: &str) -> Vec<String> {
		let mut tokens = self.tokens(text);
		tokens.truncate(MAX_QUERY_TOKENS);
		tokens
	}

	pub fn token_set<'a, I>(&self, texts: I) -> HashSet<String>
	where
		I: IntoIterator<Item = &'a str>,
	{
		texts.into_iter().flat_map(|t| self.tokens(t)).collect()
	}
}

impl Default for Analyzer {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_drops_stopwords_and_short_tokens() {
		let a = Analyzer::new();
		assert_eq!(a.tokens("The Cloud-X for a Trail Run, x"), vec!["cloud", "trail", "run"]);
	}

	#[test]
	fn brand_name_on_survives() {
		let a = Analyzer::new();
		assert_eq!(a.tokens("On running shoes"), vec!["on", "running", "shoes"]);
	}

	#[test]
	fn dedupes_and_caps_query_tokens() {
		let a = Analyzer::new();
		assert_eq!(a.tokens("red RED red shoe"), vec!["red", "shoe"]);
		let long: String = (0..100).map(|i| format!("w{i} ")).collect();
		assert_eq!(a.query_tokens(&long).len(), MAX_QUERY_TOKENS);
	}

	#[test]
	fn overlong_tokens_are_removed() {
		let a = Analyzer::new();
		let word = "z".repeat(MAX_TOKEN_LEN + 1);
		assert!(a.tokens(&format!("{word} ok")).iter().all(|t| t == "ok"));
	}
}

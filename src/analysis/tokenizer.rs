//! Regex-based tokenization.

use std::sync::Arc;

use regex::Regex;

use crate::analysis::token::{Token, TokenStream};
use crate::error::{BridgeError, Result};

/// Splits text into a stream of tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Name of this tokenizer.
    fn name(&self) -> &'static str;
}

/// A tokenizer that emits every match of a regular expression.
///
/// The default pattern `[a-zA-Z0-9]+` splits on anything that is not
/// alphanumeric.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a tokenizer with the default alphanumeric pattern.
    pub fn new() -> Result<Self> {
        Self::with_pattern("[a-zA-Z0-9]+")
    }

    /// Create a tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| BridgeError::analysis(format!("invalid regex pattern: {e}")))?;
        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// The pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new().expect("default regex pattern is valid")
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .pattern
            .find_iter(text)
            .enumerate()
            .map(|(position, mat)| Token::new(mat.as_str(), position, mat.start(), mat.end()))
            .collect();
        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

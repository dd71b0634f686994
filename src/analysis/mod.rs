//! Text analysis: splitting field values into tokens.

pub mod token;
pub mod tokenizer;

pub use token::{Token, TokenStream};
pub use tokenizer::{RegexTokenizer, Tokenizer};

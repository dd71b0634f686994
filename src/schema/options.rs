//! Field options describing how text and numeric fields are handled.

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Indexing options for a text field, from "not indexed at all" up to
/// "tokenized with term frequencies and positions".
///
/// The variants form a ladder: combining two options with `|` yields the
/// more expressive of the two.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TextIndexing {
    /// The field is not indexed.
    #[default]
    Unindexed,
    /// The raw value is indexed as a single token.
    Untokenized,
    /// The value is tokenized; only term presence is recorded.
    TokenizedNoFreq,
    /// The value is tokenized and term frequencies are recorded.
    TokenizedWithFreq,
    /// The value is tokenized with term frequencies and positions.
    TokenizedWithFreqAndPosition,
}

impl TextIndexing {
    /// True if the option records term frequencies.
    pub fn is_termfreq_enabled(&self) -> bool {
        matches!(
            self,
            TextIndexing::TokenizedWithFreq | TextIndexing::TokenizedWithFreqAndPosition
        )
    }

    /// True if the option tokenizes the value.
    pub fn is_tokenized(&self) -> bool {
        matches!(
            self,
            TextIndexing::TokenizedNoFreq
                | TextIndexing::TokenizedWithFreq
                | TextIndexing::TokenizedWithFreqAndPosition
        )
    }

    /// True if the option records token positions.
    pub fn is_position_enabled(&self) -> bool {
        matches!(self, TextIndexing::TokenizedWithFreqAndPosition)
    }

    /// True if the field is indexed at all.
    pub fn is_indexed(&self) -> bool {
        !matches!(self, TextIndexing::Unindexed)
    }
}

impl BitOr for TextIndexing {
    type Output = TextIndexing;

    fn bitor(self, other: TextIndexing) -> TextIndexing {
        self.max(other)
    }
}

/// Options associated with a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TextOptions {
    indexing: TextIndexing,
    stored: bool,
}

impl TextOptions {
    /// Create a new set of text options.
    pub const fn new(indexing: TextIndexing, stored: bool) -> Self {
        TextOptions { indexing, stored }
    }

    /// The indexing option.
    pub fn indexing(&self) -> TextIndexing {
        self.indexing
    }

    /// True if the field value is stored in the document store.
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Return a copy with the given indexing option.
    pub fn with_indexing(mut self, indexing: TextIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    /// Return a copy marked as stored.
    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }
}

impl BitOr for TextOptions {
    type Output = TextOptions;

    fn bitor(self, other: TextOptions) -> TextOptions {
        TextOptions {
            indexing: self.indexing | other.indexing,
            stored: self.stored || other.stored,
        }
    }
}

/// Options associated with a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NumericOptions {
    indexed: bool,
    fast: bool,
    stored: bool,
}

impl NumericOptions {
    /// Create a new set of numeric options.
    pub const fn new(indexed: bool, fast: bool, stored: bool) -> Self {
        NumericOptions {
            indexed,
            fast,
            stored,
        }
    }

    /// True if the field is indexed.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// True if the field is available for fast columnar access.
    pub fn is_fast(&self) -> bool {
        self.fast
    }

    /// True if the field value is stored in the document store.
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Return a copy marked as indexed.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Return a copy marked as fast.
    pub fn fast(mut self) -> Self {
        self.fast = true;
        self
    }

    /// Return a copy marked as stored.
    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }
}

impl BitOr for NumericOptions {
    type Output = NumericOptions;

    fn bitor(self, other: NumericOptions) -> NumericOptions {
        NumericOptions {
            indexed: self.indexed || other.indexed,
            fast: self.fast || other.fast,
            stored: self.stored || other.stored,
        }
    }
}

/// A text field indexed as a single untokenized token.
pub const STRING: TextOptions = TextOptions::new(TextIndexing::Untokenized, false);

/// A text field tokenized with term frequencies and positions.
pub const TEXT: TextOptions = TextOptions::new(TextIndexing::TokenizedWithFreqAndPosition, false);

/// A text field that is only stored. Useful just for query results;
/// reading stored fields back is comparatively slow.
pub const STORED: TextOptions = TextOptions::new(TextIndexing::Unindexed, true);

/// A numeric field with fast columnar access.
pub const FAST: NumericOptions = NumericOptions::new(false, true, false);

/// A plain numeric field.
pub const NUMERIC: NumericOptions = NumericOptions::new(false, false, false);

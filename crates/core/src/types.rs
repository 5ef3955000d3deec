//! Domain types for representing slide decks and their shape text.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parsed slide deck with the text of its shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Original filename (may include a path inside an archive).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create an empty deck with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// All shape texts from all slides, flattened in slide order.
    pub fn shape_texts(&self) -> impl Iterator<Item = &str> {
        self.slides
            .iter()
            .flat_map(|s| s.shapes.iter().map(|t| t.text.as_str()))
    }
}

/// A single slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Top-level shapes with a text frame, in document order.
    pub shapes: Vec<ShapeText>,
}

impl Slide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Record the text of a shape that has a text frame.
    pub fn add_shape(&mut self, text: impl Into<String>) {
        self.shapes.push(ShapeText { text: text.into() });
    }
}

/// Text of one shape: its paragraphs joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeText {
    pub text: String,
}

/// Kind of file a clue source arrives as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A single PPTX deck.
    Pptx,
    /// A ZIP archive holding PPTX decks.
    Zip,
}

impl SourceKind {
    /// Detect the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    /// Detect the kind from a filename or archive entry path.
    pub fn from_filename(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

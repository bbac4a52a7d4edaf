use std::borrow::Cow;
use std::sync::Arc;

/// How many leading bytes are inspected when sniffing for binary content.
const BINARY_SNIFF_LENGTH: usize = 8000;

/// Content of one output asset.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AssetSource {
	/// Textual content.
	Text(String),
	/// Raw bytes, which may or may not be text.
	Bytes(Vec<u8>),
	/// Original text plus a set of pending range edits.
	Replaced(ReplaceSource),
}

/// A borrowed view of an asset's current content.
#[derive(Debug)]
pub enum SourceContent<'a> {
	Text(Cow<'a, str>),
	Bytes(&'a [u8]),
}

impl AssetSource {
	/// Wrap bytes read from disk, keeping them as text when they decode and
	/// are not binary. Binary content stays as bytes even when it happens to
	/// be valid UTF-8.
	pub fn from_bytes(bytes: Vec<u8>) -> Self {
		if is_binary(&bytes) {
			return Self::Bytes(bytes);
		}

		match String::from_utf8(bytes) {
			Ok(text) => Self::Text(text),
			Err(e) => Self::Bytes(e.into_bytes()),
		}
	}

	pub fn content(&self) -> SourceContent<'_> {
		match self {
			Self::Text(text) => SourceContent::Text(Cow::Borrowed(text)),
			Self::Bytes(bytes) => SourceContent::Bytes(bytes),
			Self::Replaced(overlay) => SourceContent::Text(Cow::Owned(overlay.source())),
		}
	}

	/// The textual content, or `None` when the asset holds binary data or
	/// bytes that are not valid UTF-8.
	pub fn text(&self) -> Option<Cow<'_, str>> {
		match self.content() {
			SourceContent::Text(text) => (!is_binary(text.as_bytes())).then_some(text),
			SourceContent::Bytes(bytes) => {
				if is_binary(bytes) {
					return None;
				}
				std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
			}
		}
	}

	/// The materialized content as bytes.
	pub fn to_bytes(&self) -> Cow<'_, [u8]> {
		match self.content() {
			SourceContent::Text(Cow::Borrowed(text)) => Cow::Borrowed(text.as_bytes()),
			SourceContent::Text(Cow::Owned(text)) => Cow::Owned(text.into_bytes()),
			SourceContent::Bytes(bytes) => Cow::Borrowed(bytes),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Text(text) => text.len(),
			Self::Bytes(bytes) => bytes.len(),
			Self::Replaced(overlay) => overlay.source().len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl From<String> for AssetSource {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&str> for AssetSource {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<ReplaceSource> for AssetSource {
	fn from(value: ReplaceSource) -> Self {
		Self::Replaced(value)
	}
}

/// Sniff whether `bytes` hold binary data.
///
/// A NUL byte in the leading window marks the content as binary, as does a
/// byte sequence in that window that can never be valid UTF-8. A multi-byte
/// character cut off by the window boundary is not counted.
pub fn is_binary(bytes: &[u8]) -> bool {
	let window = &bytes[..bytes.len().min(BINARY_SNIFF_LENGTH)];

	if window.contains(&0) {
		return true;
	}

	match std::str::from_utf8(window) {
		Ok(_) => false,
		Err(e) => e.error_len().is_some(),
	}
}

#[derive(Debug, Clone)]
struct Replacement {
	start: usize,
	end: usize,
	content: String,
	order: usize,
}

/// Text plus a list of byte-range replacements anchored to the original.
///
/// Edits never touch the original buffer. Every range refers to offsets in
/// the original text, so independent passes can each record edits without
/// accounting for the others. [`ReplaceSource::source`] materializes the
/// result.
#[derive(Debug, Clone)]
pub struct ReplaceSource {
	original: Arc<str>,
	replacements: Vec<Replacement>,
}

impl ReplaceSource {
	pub fn new(original: impl Into<Arc<str>>) -> Self {
		Self {
			original: original.into(),
			replacements: Vec::new(),
		}
	}

	pub fn original(&self) -> &str {
		&self.original
	}

	/// A cheap handle on the original text, usable while recording edits.
	pub fn shared_original(&self) -> Arc<str> {
		Arc::clone(&self.original)
	}

	/// Replace the half-open byte range `[start, end)` of the original text.
	/// Offsets past the end are clamped and offsets inside a multi-byte
	/// character move back to its first byte.
	pub fn replace(&mut self, start: usize, end: usize, content: impl Into<String>) {
		let start = self.floor_char_boundary(start);
		let end = self.floor_char_boundary(end).max(start);
		let order = self.replacements.len();
		self.replacements.push(Replacement {
			start,
			end,
			content: content.into(),
			order,
		});
	}

	/// Insert `content` before byte `position` of the original text.
	pub fn insert(&mut self, position: usize, content: impl Into<String>) {
		self.replace(position, position, content);
	}

	fn floor_char_boundary(&self, offset: usize) -> usize {
		let mut offset = offset.min(self.original.len());
		while !self.original.is_char_boundary(offset) {
			offset -= 1;
		}
		offset
	}

	pub fn edit_count(&self) -> usize {
		self.replacements.len()
	}

	pub fn has_edits(&self) -> bool {
		!self.replacements.is_empty()
	}

	/// Materialize the original text with every edit applied.
	///
	/// Edits apply in order of their start offset, ties broken by the order
	/// they were recorded. An edit starting inside text already consumed by an
	/// earlier edit still emits its content and consumes up to its own end.
	pub fn source(&self) -> String {
		let original = self.original();
		let length = original.len();
		let mut ordered: Vec<&Replacement> = self.replacements.iter().collect();
		ordered.sort_by_key(|replacement| (replacement.start, replacement.order));

		let mut output = String::with_capacity(length);
		let mut cursor = 0;

		for replacement in ordered {
			let start = replacement.start.min(length);
			let end = replacement.end.min(length);

			if start > cursor {
				output.push_str(&original[cursor..start]);
				cursor = start;
			}

			output.push_str(&replacement.content);
			cursor = cursor.max(end);
		}

		if cursor < length {
			output.push_str(&original[cursor..]);
		}

		output
	}
}

use regex::Regex;

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 5_000;
pub const MAX_TAGS: usize = 32;
pub const MAX_TAG_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
	RejectEmpty,
	RejectTooShort,
	RejectTooLong,
	RejectMissingSource,
	RejectTooManyTags,
	RejectTagTooLong,
	RejectSecret,
}
impl RejectCode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::RejectEmpty => "REJECT_EMPTY",
			Self::RejectTooShort => "REJECT_TOO_SHORT",
			Self::RejectTooLong => "REJECT_TOO_LONG",
			Self::RejectMissingSource => "REJECT_MISSING_SOURCE",
			Self::RejectTooManyTags => "REJECT_TOO_MANY_TAGS",
			Self::RejectTagTooLong => "REJECT_TAG_TOO_LONG",
			Self::RejectSecret => "REJECT_SECRET",
		}
	}
}

pub struct FragmentInput<'a> {
	pub content: &'a str,
	pub tags: &'a [String],
	pub source: &'a str,
}

/// Write-time checks for knowledge fragments. The retriever trusts whatever passed here.
pub fn writegate(input: &FragmentInput<'_>) -> Result<(), RejectCode> {
	let content = input.content.trim();

	if content.is_empty() {
		return Err(RejectCode::RejectEmpty);
	}

	let chars = content.chars().count();

	if chars < MIN_CONTENT_CHARS {
		return Err(RejectCode::RejectTooShort);
	}
	if chars > MAX_CONTENT_CHARS {
		return Err(RejectCode::RejectTooLong);
	}
	if input.source.trim().is_empty() {
		return Err(RejectCode::RejectMissingSource);
	}
	if input.tags.len() > MAX_TAGS {
		return Err(RejectCode::RejectTooManyTags);
	}
	if input.tags.iter().any(|tag| tag.trim().chars().count() > MAX_TAG_CHARS) {
		return Err(RejectCode::RejectTagTooLong);
	}
	if contains_secrets(content) {
		return Err(RejectCode::RejectSecret);
	}

	Ok(())
}

/// Trims tags, drops blanks, and removes case-insensitive duplicates keeping the first spelling.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(tags.len());

	for tag in tags {
		let trimmed = tag.trim();

		if trimmed.is_empty() {
			continue;
		}
		if out.iter().any(|existing| existing.eq_ignore_ascii_case(trimmed)) {
			continue;
		}

		out.push(trimmed.to_string());
	}

	out
}

fn contains_secrets(text: &str) -> bool {
	let patterns = [
		r"(?i)-----BEGIN (RSA|OPENSSH|EC|DSA) PRIVATE KEY-----",
		r"(?i)sk-[a-z0-9]{20,}",
		r"(?i)api[_-]?key\s*[:=]\s*\S+",
		r"(?i)password\s*[:=]\s*\S+",
		r"(?i)secret\s*[:=]\s*\S+",
	];

	for pattern in patterns {
		if Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false) {
			return true;
		}
	}

	false
}

#[cfg(test)]
mod tests {
	use super::*;

	fn input<'a>(content: &'a str, tags: &'a [String], source: &'a str) -> FragmentInput<'a> {
		FragmentInput { content, tags, source }
	}

	#[test]
	fn accepts_regular_fragment() {
		let tags = vec!["react".to_string()];

		assert_eq!(
			writegate(&input("Mai has 3 years of experience with React.", &tags, "resume")),
			Ok(())
		);
	}

	#[test]
	fn enforces_content_length_bounds() {
		assert_eq!(writegate(&input("   ", &[], "resume")), Err(RejectCode::RejectEmpty));
		assert_eq!(writegate(&input("too short", &[], "resume")), Err(RejectCode::RejectTooShort));

		let long = "a".repeat(MAX_CONTENT_CHARS + 1);

		assert_eq!(writegate(&input(&long, &[], "resume")), Err(RejectCode::RejectTooLong));
	}

	#[test]
	fn requires_source() {
		assert_eq!(
			writegate(&input("A perfectly fine fragment.", &[], " ")),
			Err(RejectCode::RejectMissingSource)
		);
	}

	#[test]
	fn rejects_secrets() {
		assert_eq!(
			writegate(&input("The admin password: hunter22 is here.", &[], "notes")),
			Err(RejectCode::RejectSecret)
		);
	}

	#[test]
	fn normalizes_tags() {
		let tags = vec![" React ".to_string(), "react".to_string(), "".to_string(), "Rust".to_string()];

		assert_eq!(normalize_tags(&tags), vec!["React".to_string(), "Rust".to_string()]);
	}
}

/// Lower-cases and strips everything but alphanumerics, splitting on the
/// rest. Apostrophes vanish instead of splitting so "Luigi's" and "luigis"
/// normalize identically.
pub(crate) fn tokenize(raw: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if ch.is_ascii_alphanumeric() {
			normalized.push(ch.to_ascii_lowercase());
		} else if ch != '\'' && ch != '\u{2019}' {
			normalized.push(' ');
		}
	}

	normalized.split_whitespace().map(|token| token.to_string()).collect()
}

/// Punctuation-normalized form: tokens re-joined with single spaces.
pub(crate) fn normalized(raw: &str) -> String {
	tokenize(raw).join(" ")
}

pub(crate) fn contains_token(tokens: &[String], needle: &str) -> bool {
	tokens.iter().any(|token| token == needle)
}

pub(crate) fn contains_phrase(normalized_query: &str, phrase: &str) -> bool {
	if phrase.is_empty() {
		return false;
	}

	let padded = format!(" {normalized_query} ");
	let needle = format!(" {phrase} ");

	padded.contains(&needle)
}

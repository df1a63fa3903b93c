//! Rendering references in their shortest familiar form, and matching
//! familiar forms against shell-style patterns.

use crate::error::{ReferenceError, Result};
use crate::normalize::Normalizer;
use crate::reference::{Named, Reference, Repository};

impl Normalizer {
    /// Strip the default domain and, if `strip_prefix` is set, the official
    /// prefix when nothing but a single component remains after it.
    fn familiarize(&self, repository: &Repository, strip_prefix: bool) -> Repository {
        let config = self.config();
        match repository.domain() {
            Some(domain) if domain == config.default_domain => {
                let path = repository.path();
                let prefix = config.official_repo_prefix.as_ref();
                let path = match path.strip_prefix(prefix) {
                    Some(rest) if strip_prefix && !prefix.is_empty() && !rest.contains('/') => rest,
                    _ => path,
                };
                Repository::from_parts(None, path)
            }
            _ => repository.clone(),
        }
    }

    fn render(&self, named: &Named, strip_prefix: bool) -> String {
        let repository = self.familiarize(named.repository(), strip_prefix);
        Named::from_parts(repository, named.tag().cloned(), named.digest().cloned()).to_string()
    }

    /// The familiar repository name of `named`, without tag or digest.
    pub fn familiar_name(&self, named: &Named) -> String {
        self.familiarize(named.repository(), true).to_string()
    }

    /// The familiar string of `reference`, keeping its tag and digest.
    pub fn familiar_string(&self, reference: &Reference) -> String {
        match reference {
            Reference::Named(named) => self.render(named, true),
            Reference::Digest(digest) => digest.to_string(),
        }
    }

    /// Report whether `pattern` matches the familiar form of `reference`.
    ///
    /// Candidates are tried in order: the familiar string, the familiar
    /// name, then both again with the official prefix kept, so that
    /// `*/busybox` matches `docker.io/library/busybox`. A pattern that fails
    /// to parse is an error, even when an earlier part of it already ruled
    /// out a match.
    pub fn familiar_match(&self, pattern: &str, reference: &Reference) -> Result<bool> {
        let named = match reference {
            Reference::Named(named) => named,
            Reference::Digest(digest) => return glob_match(pattern, digest.as_str()),
        };
        let candidates = [
            self.render(named, true),
            self.familiarize(named.repository(), true).to_string(),
            self.render(named, false),
            self.familiarize(named.repository(), false).to_string(),
        ];
        for candidate in &candidates {
            if glob_match(pattern, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// [`Normalizer::familiar_name`] with Docker defaults.
pub fn familiar_name(named: &Named) -> String {
    Normalizer::docker().familiar_name(named)
}

/// [`Normalizer::familiar_string`] with Docker defaults.
pub fn familiar_string(reference: &Reference) -> String {
    Normalizer::docker().familiar_string(reference)
}

/// [`Normalizer::familiar_match`] with Docker defaults.
pub fn familiar_match(pattern: &str, reference: &Reference) -> Result<bool> {
    Normalizer::docker().familiar_match(pattern, reference)
}

fn bad_pattern(pattern: &str) -> ReferenceError {
    ReferenceError::MalformedPattern(pattern.to_string())
}

/// Shell-style pattern match where `/` separates segments.
///
/// - `*` matches any run of non-`/` characters
/// - `?` matches a single non-`/` character
/// - `[abc]`, `[a-z]`, `[^a-z]` match a character class
/// - `\c` matches `c` literally
///
/// The whole of `name` must match.
pub fn glob_match(pattern: &str, name: &str) -> Result<bool> {
    let full = pattern;
    let mut pattern = pattern;
    let mut name = name;

    'chunks: while !pattern.is_empty() {
        let (star, chunk, rest) = scan_chunk(pattern);
        pattern = rest;
        if star && chunk.is_empty() {
            // Trailing star: the rest must stay within one segment.
            return Ok(!name.contains('/'));
        }

        if let Some(tail) = match_chunk(full, chunk, name)? {
            // The last chunk has to consume the whole name.
            if tail.is_empty() || !pattern.is_empty() {
                name = tail;
                continue;
            }
        }

        if star {
            for (i, c) in name.char_indices() {
                if c == '/' {
                    break;
                }
                if let Some(tail) = match_chunk(full, chunk, &name[i + c.len_utf8()..])? {
                    if pattern.is_empty() && !tail.is_empty() {
                        continue;
                    }
                    name = tail;
                    continue 'chunks;
                }
            }
        }

        // No match; still report a malformed remainder.
        while !pattern.is_empty() {
            let (_, chunk, rest) = scan_chunk(pattern);
            pattern = rest;
            match_chunk(full, chunk, "")?;
        }
        return Ok(false);
    }

    Ok(name.is_empty())
}

/// Split off leading stars and the literal chunk up to the next unbracketed
/// star.
fn scan_chunk(pattern: &str) -> (bool, &str, &str) {
    let trimmed = pattern.trim_start_matches('*');
    let star = trimmed.len() != pattern.len();
    let bytes = trimmed.as_bytes();
    let mut in_range = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if i + 1 < bytes.len() {
                    i += 1;
                }
            }
            b'[' => in_range = true,
            b']' => in_range = false,
            b'*' if !in_range => break,
            _ => {}
        }
        i += 1;
    }
    (star, &trimmed[..i], &trimmed[i..])
}

/// Match a star-free chunk against the start of `s`, returning what is
/// left of `s` on success.
///
/// After a mismatch the rest of the chunk is still scanned so that a
/// malformed class is reported.
fn match_chunk<'a>(full: &str, chunk: &str, s: &'a str) -> Result<Option<&'a str>> {
    let mut chunk = chunk;
    let mut s = s;
    let mut failed = false;

    while let Some(c) = chunk.chars().next() {
        if !failed && s.is_empty() {
            failed = true;
        }
        match c {
            '[' => {
                let mut current = None;
                if !failed {
                    if let Some(ch) = s.chars().next() {
                        s = &s[ch.len_utf8()..];
                        current = Some(ch);
                    }
                }
                chunk = &chunk[1..];
                let negated = chunk.starts_with('^');
                if negated {
                    chunk = &chunk[1..];
                }
                let mut matched = false;
                let mut ranges = 0;
                loop {
                    if ranges > 0 && chunk.starts_with(']') {
                        chunk = &chunk[1..];
                        break;
                    }
                    let (lo, rest) = class_char(full, chunk)?;
                    chunk = rest;
                    let mut hi = lo;
                    if let Some(rest) = chunk.strip_prefix('-') {
                        let (upper, rest) = class_char(full, rest)?;
                        hi = upper;
                        chunk = rest;
                    }
                    if current.is_some_and(|ch| lo <= ch && ch <= hi) {
                        matched = true;
                    }
                    ranges += 1;
                }
                if matched == negated {
                    failed = true;
                }
            }
            '?' => {
                if !failed {
                    if let Some(ch) = s.chars().next() {
                        if ch == '/' {
                            failed = true;
                        }
                        s = &s[ch.len_utf8()..];
                    }
                }
                chunk = &chunk[1..];
            }
            _ => {
                let literal = if c == '\\' {
                    chunk = &chunk[1..];
                    chunk.chars().next().ok_or_else(|| bad_pattern(full))?
                } else {
                    c
                };
                if !failed {
                    match s.chars().next() {
                        Some(ch) if ch == literal => s = &s[ch.len_utf8()..],
                        _ => failed = true,
                    }
                }
                chunk = &chunk[literal.len_utf8()..];
            }
        }
    }

    Ok(if failed { None } else { Some(s) })
}

/// Read one possibly escaped character inside a class. A class must not
/// end right after it.
fn class_char<'c>(full: &str, chunk: &'c str) -> Result<(char, &'c str)> {
    if chunk.is_empty() || chunk.starts_with('-') || chunk.starts_with(']') {
        return Err(bad_pattern(full));
    }
    let chunk = match chunk.strip_prefix('\\') {
        Some(rest) if rest.is_empty() => return Err(bad_pattern(full)),
        Some(rest) => rest,
        None => chunk,
    };
    let ch = chunk.chars().next().ok_or_else(|| bad_pattern(full))?;
    let rest = &chunk[ch.len_utf8()..];
    if rest.is_empty() {
        return Err(bad_pattern(full));
    }
    Ok((ch, rest))
}

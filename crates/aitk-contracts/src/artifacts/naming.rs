use chrono::{DateTime, SecondsFormat, Utc};

pub const SLUG_MAX_CHARS: usize = 30;

/// Filename of one artifact: `<prefix>[_<slug>]_<stamp>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    prefix: String,
    slug: Option<String>,
    stamp: String,
    extension: String,
}

impl ArtifactName {
    pub fn new(prefix: &str, extension: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            slug: None,
            stamp: file_stamp(Utc::now()),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Adds a sanitized fragment of user input; input with nothing usable is dropped.
    pub fn with_slug(mut self, raw: &str) -> Self {
        self.slug = slugify(raw, SLUG_MAX_CHARS);
        self
    }

    /// Reuses the timestamp of a related artifact.
    pub fn sibling(&self, prefix: &str, extension: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            slug: None,
            stamp: self.stamp.clone(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn at(mut self, when: DateTime<Utc>) -> Self {
        self.stamp = file_stamp(when);
        self
    }

    pub fn file_name(&self) -> String {
        match &self.slug {
            Some(slug) => format!(
                "{}_{}_{}.{}",
                self.prefix, slug, self.stamp, self.extension
            ),
            None => format!("{}_{}.{}", self.prefix, self.stamp, self.extension),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, `:` and `.` replaced by `-`.
pub fn file_stamp(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Whitespace runs become `_`; only alphanumerics, `-` and `_` survive.
pub fn slugify(raw: &str, max_chars: usize) -> Option<String> {
    let mut slug = String::new();
    let mut pending_separator = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if !(ch.is_alphanumeric() || ch == '-' || ch == '_') {
            continue;
        }
        if pending_separator && !slug.is_empty() {
            slug.push('_');
        }
        pending_separator = false;
        slug.push(ch);
    }
    let capped: String = slug.chars().take(max_chars).collect();
    let capped = capped.trim_end_matches('_').to_string();
    if capped.is_empty() {
        return None;
    }
    Some(capped)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{file_stamp, slugify, ArtifactName};

    #[test]
    fn file_stamp_replaces_colons_and_periods() {
        let when = Utc.with_ymd_and_hms(2026, 1, 5, 10, 11, 12).unwrap()
            + chrono::Duration::milliseconds(345);
        assert_eq!(file_stamp(when), "2026-01-05T10-11-12-345Z");
    }

    #[test]
    fn slug_matches_readable_queries() {
        assert_eq!(
            slugify("Latest AI trends January 2026", 30).as_deref(),
            Some("Latest_AI_trends_January_2026")
        );
        assert_eq!(slugify("  many   spaces\there ", 30).as_deref(), Some("many_spaces_here"));
    }

    #[test]
    fn slug_neutralizes_path_characters() {
        assert_eq!(slugify("../../etc/passwd", 30).as_deref(), Some("etcpasswd"));
        assert_eq!(slugify("a\\b:c*d?e\"f<g>h|i", 30).as_deref(), Some("abcdefghi"));
        assert_eq!(slugify("...", 30), None);
        assert_eq!(slugify("   ", 30), None);
    }

    #[test]
    fn slug_is_capped_by_characters() {
        let slug = slugify("ünïcödé wörds that go on and on forever", 30).unwrap_or_default();
        assert_eq!(slug.chars().count(), 30);
        assert!(slug.starts_with("ünïcödé_wörds"));
        assert_eq!(slugify("abc def", 4).as_deref(), Some("abc"));
    }

    #[test]
    fn file_name_layout() {
        let when = Utc.with_ymd_and_hms(2026, 1, 5, 10, 11, 12).unwrap();
        let name = ArtifactName::new("research", "md")
            .with_slug("Latest AI trends January 2026")
            .at(when);
        assert_eq!(
            name.file_name(),
            "research_Latest_AI_trends_January_2026_2026-01-05T10-11-12-000Z.md"
        );
        let sibling = name.sibling("feedback", ".md");
        assert_eq!(sibling.file_name(), "feedback_2026-01-05T10-11-12-000Z.md");
    }

    #[test]
    fn later_names_sort_after_earlier_ones() {
        let early = Utc.with_ymd_and_hms(2026, 1, 5, 10, 11, 12).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        let first = ArtifactName::new("image", "png").at(early).file_name();
        let second = ArtifactName::new("image", "png").at(late).file_name();
        assert!(first < second);
    }
}

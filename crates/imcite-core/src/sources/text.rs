//! Text and date cleanup shared by the source parsers

use chrono::NaiveDate;
use imcite_domain::PublicationDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Inline markup: <i>, <sub>, <jats:italic>, ...
    static ref MARKUP: Regex = Regex::new(r"</?[A-Za-z][A-Za-z0-9:_-]*(\s[^<>]*)?/?>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Decode entities, strip inline markup and collapse whitespace
pub fn clean_text(raw: &str) -> String {
    let stripped = MARKUP.replace_all(raw, "");
    let decoded = quick_xml::escape::unescape(&stripped)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| stripped.into_owned());
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Clean a title: markup, trailing period and the `[...]` wrapper PubMed uses
/// for translated titles
pub fn clean_title(raw: &str) -> String {
    let mut title = clean_text(raw);
    title = title.trim_end_matches('.').trim_end().to_string();

    if title.starts_with('[') && title.ends_with(']') && title.len() >= 2 {
        title = title[1..title.len() - 1].trim().to_string();
        title = title.trim_end_matches('.').trim_end().to_string();
    }

    title
}

fn month_number(token: &str) -> Option<u32> {
    // "Jan-Feb" ranges keep their first month
    let token = token.split(['-', '/']).next().unwrap_or(token);
    if let Ok(n) = token.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = token.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

/// Build a date from year/month/day parts, dropping parts that do not form
/// a real calendar date
pub fn date_from_parts(year: i32, month: Option<u32>, day: Option<u32>) -> Option<PublicationDate> {
    if !(1000..=9999).contains(&year) {
        return None;
    }
    match (month, day) {
        (Some(m), Some(d)) if NaiveDate::from_ymd_opt(year, m, d).is_some() => {
            Some(PublicationDate::day(year, m, d))
        }
        (Some(m), _) if (1..=12).contains(&m) => Some(PublicationDate::month(year, m)),
        _ => Some(PublicationDate::year(year)),
    }
}

/// Parse the date strings PubMed and PMC use: `2016 Aug 1`, `2016 Aug`,
/// `2016`, `2016 Jan-Feb`, `2016 Spring`, `2016/08/01 00:00`, `2016-08-01`
pub fn parse_pubmed_date(raw: &str) -> Option<PublicationDate> {
    let raw = raw.trim();
    let mut tokens = raw.split_whitespace();
    let first = tokens.next()?;

    // Numeric forms carry all parts in the first token
    if first.contains('/') || first.contains('-') {
        let mut parts = first.split(['/', '-']);
        let year = parts.next()?.parse().ok()?;
        let month = parts.next().and_then(|m| m.parse().ok());
        let day = parts.next().and_then(|d| d.parse().ok());
        return date_from_parts(year, month, day);
    }

    let year: i32 = first.get(..4)?.parse().ok()?;
    let month = tokens.next().and_then(month_number);
    let day = if month.is_some() {
        tokens.next().and_then(|d| d.parse::<u32>().ok())
    } else {
        None
    };

    date_from_parts(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup_and_entities() {
        assert_eq!(
            clean_text("The <i>E. coli</i> &amp; H<sub>2</sub>O  story"),
            "The E. coli & H2O story"
        );
        assert_eq!(clean_text("<jats:p>Abstract</jats:p>"), "Abstract");
        assert_eq!(clean_text("a &lt; b"), "a < b");
    }

    #[test]
    fn test_clean_text_keeps_unknown_entities() {
        assert_eq!(clean_text("x&nbsp;y"), "x&nbsp;y");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("A study of things."), "A study of things");
        assert_eq!(
            clean_title("[Translated title of a German article]."),
            "Translated title of a German article"
        );
        assert_eq!(clean_title("Plain"), "Plain");
    }

    #[test]
    fn test_parse_pubmed_date_precisions() {
        assert_eq!(
            parse_pubmed_date("2016 Aug 1"),
            Some(PublicationDate::day(2016, 8, 1))
        );
        assert_eq!(
            parse_pubmed_date("2016 Aug"),
            Some(PublicationDate::month(2016, 8))
        );
        assert_eq!(parse_pubmed_date("2016"), Some(PublicationDate::year(2016)));
        assert_eq!(
            parse_pubmed_date("2016 Jan-Feb"),
            Some(PublicationDate::month(2016, 1))
        );
        assert_eq!(
            parse_pubmed_date("2016 Spring"),
            Some(PublicationDate::year(2016))
        );
        assert_eq!(
            parse_pubmed_date("2016/08/01 00:00"),
            Some(PublicationDate::day(2016, 8, 1))
        );
        assert_eq!(
            parse_pubmed_date("2011-02-30"),
            Some(PublicationDate::month(2011, 2))
        );
        assert_eq!(parse_pubmed_date("unknown"), None);
    }
}

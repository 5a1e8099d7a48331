//! Field extraction: code tokens, expiry date, VIP marker.
//!
//! All patterns are compiled once. Nothing here fails: a field that cannot
//! be found or parsed is simply absent.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::pipeline::types::ExtractionResult;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

/// Dash-separated blocks of 4+ (`ABCD-1234-WXYZ`) or a single 6–25 run.
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z0-9]{4,}(?:-[A-Z0-9]{4,})+|[A-Z0-9]{6,25})\b").expect("valid code pattern")
});

/// `YYYY/MM/DD` or `YYYY-MM-DD`.
static YMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{4})[/\-]([0-9]{1,2})[/\-]([0-9]{1,2})\b").expect("valid date pattern")
});

/// `DD.MM.YYYY` or `DD/MM/YYYY`.
static DMY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2})[/.]([0-9]{1,2})[/.]([0-9]{4})\b").expect("valid date pattern")
});

static VIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(chief\s*concierge|vip\s*1?2?)\b").expect("valid VIP pattern")
});

/// Canonical form of a code token.
pub fn normalize_code(token: &str) -> String {
    token.to_uppercase()
}

/// Replace every http(s) URL with a space.
pub fn strip_urls(text: &str) -> String {
    URL_RE.replace_all(text, " ").into_owned()
}

/// All code tokens outside URLs, normalized, deduplicated in first-seen order.
pub fn find_codes(text: &str) -> Vec<String> {
    let cleaned = strip_urls(text);
    let mut seen = HashSet::new();
    CODE_RE
        .find_iter(&cleaned)
        .map(|m| normalize_code(m.as_str()))
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// First valid expiry date: year-first pattern, then day-first.
pub fn extract_expiry(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = YMD_RE.captures(text) {
        if let Some(date) = make_date(&caps[1], &caps[2], &caps[3]) {
            return Some(date);
        }
    }
    let caps = DMY_RE.captures(text)?;
    make_date(&caps[3], &caps[2], &caps[1])
}

pub fn detect_vip(text: &str) -> bool {
    VIP_RE.is_match(text)
}

/// Run every sub-extraction over the same text.
pub fn extract(text: &str) -> ExtractionResult {
    ExtractionResult {
        codes: find_codes(text),
        expiry: extract_expiry(text),
        is_vip: detect_vip(text),
    }
}

fn make_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── Codes ───────────────────────────────────────────────────────

    #[test]
    fn finds_dash_grouped_code() {
        let codes = find_codes("New gift code ABCD-1234-WXYZ valid until 2025/12/31");
        assert_eq!(codes, vec!["ABCD-1234-WXYZ"]);
    }

    #[test]
    fn finds_single_run_code() {
        let codes = find_codes("Chief Concierge bonus: REDEEMNOW123456");
        assert_eq!(codes, vec!["REDEEMNOW123456"]);
    }

    #[test]
    fn ignores_codes_inside_urls() {
        assert!(find_codes("see https://example.com/ABCDEF123456 for more").is_empty());
        assert_eq!(
            find_codes("http://x.io/QWERTY99 and QWERTY77"),
            vec!["QWERTY77"]
        );
    }

    #[test]
    fn rejects_runs_outside_length_bounds() {
        assert!(find_codes("ABCDE").is_empty());
        assert!(find_codes("ABCDEFGHIJKLMNOPQRSTUVWXYZ").is_empty());
        assert_eq!(find_codes("ABCDEF"), vec!["ABCDEF"]);
    }

    #[test]
    fn token_must_not_be_embedded_in_longer_word() {
        assert!(find_codes("xxABCDEFGH").is_empty());
        assert!(find_codes("ABCDEFGH_tail").is_empty());
    }

    #[test]
    fn lowercase_words_are_not_codes() {
        assert!(find_codes("redeem your voucher tomorrow").is_empty());
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let codes = find_codes("ZZZZ9999 then AAAA1111 then ZZZZ9999 again");
        assert_eq!(codes, vec!["ZZZZ9999", "AAAA1111"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "gift code ABCD-EFGH and 123456789 on 2025/01/02";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn normalized_code_is_uppercase() {
        assert_eq!(normalize_code("abcd-1234"), "ABCD-1234");
        for code in find_codes("ABCD-1234-WXYZ 99ZZ88YY") {
            assert_eq!(code, code.to_uppercase());
        }
    }

    // ── Expiry ──────────────────────────────────────────────────────

    #[test]
    fn year_first_dates() {
        assert_eq!(extract_expiry("until 2025/12/31"), Some(date(2025, 12, 31)));
        assert_eq!(extract_expiry("until 2025-1-5"), Some(date(2025, 1, 5)));
    }

    #[test]
    fn day_first_fallback() {
        assert_eq!(extract_expiry("gültig bis 31.12.2025"), Some(date(2025, 12, 31)));
        assert_eq!(extract_expiry("valid to 01/02/2026"), Some(date(2026, 2, 1)));
    }

    #[test]
    fn invalid_year_first_falls_back_to_day_first() {
        assert_eq!(
            extract_expiry("batch 2025/13/01, expires 15.06.2025"),
            Some(date(2025, 6, 15))
        );
    }

    #[test]
    fn only_first_year_first_match_is_tried() {
        assert_eq!(extract_expiry("2025/02/30 or 2025/03/01"), None);
    }

    #[test]
    fn malformed_dates_are_absent() {
        assert_eq!(extract_expiry("32.01.2025"), None);
        assert_eq!(extract_expiry("2025/02/29"), None);
        assert_eq!(extract_expiry("0000/01/01"), None);
        assert_eq!(extract_expiry("no date here"), None);
    }

    // ── VIP ─────────────────────────────────────────────────────────

    #[test]
    fn vip_markers() {
        assert!(detect_vip("Chief Concierge bonus"));
        assert!(detect_vip("chiefconcierge"));
        assert!(detect_vip("VIP reward"));
        assert!(detect_vip("vip12 only"));
        assert!(detect_vip("Vip 12 only"));
        assert!(detect_vip("vip1"));
    }

    #[test]
    fn vip_requires_word_boundaries() {
        assert!(!detect_vip("vipers nest"));
        assert!(!detect_vip("vip3"));
        assert!(!detect_vip("concierge desk"));
    }

    // ── Combined ────────────────────────────────────────────────────

    #[test]
    fn scenario_plain_code_with_date() {
        let result = extract("New gift code ABCD-1234-WXYZ valid until 2025/12/31");
        assert_eq!(result.codes, vec!["ABCD-1234-WXYZ"]);
        assert_eq!(result.expiry, Some(date(2025, 12, 31)));
        assert!(!result.is_vip);
    }

    #[test]
    fn scenario_concierge_code_without_date() {
        let result = extract("Chief Concierge bonus: REDEEMNOW123456");
        assert_eq!(result.codes, vec!["REDEEMNOW123456"]);
        assert_eq!(result.expiry, None);
        assert!(result.is_vip);
    }
}

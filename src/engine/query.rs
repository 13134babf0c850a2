//! Deterministic mapping from a `JobFilter` onto the target site's search
//! query parameters.
//!
//! Filtering is permissive: an unrecognized enum value is omitted from the
//! query instead of rejected, so a slightly-off caller still gets an
//! unfiltered search rather than an error.

use url::Url;

use crate::core::types::JobFilter;

/// `date_posted` → `f_TPR` time-range code (seconds of lookback).
fn date_posted_code(value: &str) -> Option<&'static str> {
    match value {
        "24h" => Some("r86400"),
        "3d" => Some("r259200"),
        "1w" => Some("r604800"),
        "2w" => Some("r1209600"),
        "1m" => Some("r2592000"),
        _ => None,
    }
}

/// `experience_level` → `f_E` code.
fn experience_code(value: &str) -> Option<&'static str> {
    match value {
        "internship" => Some("1"),
        "entry" => Some("2"),
        "associate" => Some("3"),
        "mid" => Some("4"),
        "director" => Some("5"),
        "executive" => Some("6"),
        _ => None,
    }
}

/// `job_type` → `f_JT` code.
fn job_type_code(value: &str) -> Option<&'static str> {
    match value {
        "full-time" => Some("F"),
        "part-time" => Some("P"),
        "contract" => Some("C"),
        "temporary" => Some("T"),
        "volunteer" => Some("V"),
        "internship" => Some("I"),
        _ => None,
    }
}

/// Remote-work code for `f_WT`.
const REMOTE_CODE: &str = "2";

/// Build the search URL for one extraction run.
///
/// The generated query contains exactly the keys for fields actually set on
/// the filter; unset optional fields never appear.
pub fn search_url(jobs_base: &Url, filter: &JobFilter) -> Url {
    let mut url = jobs_base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("keywords", &filter.keywords);

        if let Some(location) = &filter.location {
            pairs.append_pair("location", location);
        }
        if let Some(code) = filter.date_posted.as_deref().and_then(date_posted_code) {
            pairs.append_pair("f_TPR", code);
        }
        if let Some(code) = filter.experience_level.as_deref().and_then(experience_code) {
            pairs.append_pair("f_E", code);
        }
        if let Some(code) = filter.job_type.as_deref().and_then(job_type_code) {
            pairs.append_pair("f_JT", code);
        }
        if filter.remote {
            pairs.append_pair("f_WT", REMOTE_CODE);
        }
        if let Some(salary) = &filter.salary_min {
            pairs.append_pair("f_SB2", salary);
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> Url {
        Url::parse("https://www.linkedin.com/jobs/search").expect("valid base")
    }

    fn filter(keywords: &str) -> JobFilter {
        JobFilter {
            keywords: keywords.to_string(),
            location: None,
            date_posted: None,
            experience_level: None,
            job_type: None,
            remote: false,
            salary_min: None,
            max_jobs: 50,
        }
    }

    fn params(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn minimal_filter_only_emits_keywords() {
        let url = search_url(&base(), &filter("rust developer"));
        let p = params(&url);
        assert_eq!(p.len(), 1);
        assert_eq!(p["keywords"], "rust developer");
    }

    #[test]
    fn full_filter_emits_every_mapped_key() {
        let mut f = filter("software engineer");
        f.location = Some("Pakistan".into());
        f.date_posted = Some("1w".into());
        f.experience_level = Some("mid".into());
        f.job_type = Some("full-time".into());
        f.remote = true;
        f.salary_min = Some("60000".into());

        let p = params(&search_url(&base(), &f));
        assert_eq!(p.len(), 7);
        assert_eq!(p["location"], "Pakistan");
        assert_eq!(p["f_TPR"], "r604800");
        assert_eq!(p["f_E"], "4");
        assert_eq!(p["f_JT"], "F");
        assert_eq!(p["f_WT"], "2");
        assert_eq!(p["f_SB2"], "60000");
    }

    #[test]
    fn date_window_table_is_exact() {
        for (input, expected) in [
            ("24h", "r86400"),
            ("3d", "r259200"),
            ("1w", "r604800"),
            ("2w", "r1209600"),
            ("1m", "r2592000"),
        ] {
            let mut f = filter("x");
            f.date_posted = Some(input.into());
            assert_eq!(params(&search_url(&base(), &f))["f_TPR"], expected);
        }
    }

    #[test]
    fn experience_table_spans_internship_to_executive() {
        for (input, expected) in [
            ("internship", "1"),
            ("entry", "2"),
            ("associate", "3"),
            ("mid", "4"),
            ("director", "5"),
            ("executive", "6"),
        ] {
            let mut f = filter("x");
            f.experience_level = Some(input.into());
            assert_eq!(params(&search_url(&base(), &f))["f_E"], expected);
        }
    }

    #[test]
    fn unrecognized_enum_values_are_omitted_not_rejected() {
        let mut f = filter("x");
        f.date_posted = Some("fortnight".into());
        f.experience_level = Some("wizard".into());
        f.job_type = Some("gig".into());

        let p = params(&search_url(&base(), &f));
        assert_eq!(p.len(), 1, "only keywords should survive: {:?}", p);
    }

    #[test]
    fn remote_false_emits_no_worktype_key() {
        let p = params(&search_url(&base(), &filter("x")));
        assert!(!p.contains_key("f_WT"));
    }
}

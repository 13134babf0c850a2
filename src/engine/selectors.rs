//! Versioned DOM selector sets for the target site.
//!
//! Every selector pair encodes an assumption about external markup that the
//! site can break at any time. Keeping them in one versioned table means
//! markup drift is patched by shipping a new `SelectorSet` constant, not by
//! editing control flow scattered across the extraction loop.

/// A primary selector with a documented fallback for markup variants.
#[derive(Debug, Clone, Copy)]
pub struct SelectorPair {
    pub primary: &'static str,
    pub fallback: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SelectorSet {
    pub version: &'static str,

    // Authentication surface
    /// Presence of ANY of these on the site root ⇒ logged in.
    pub login_indicators: &'static [&'static str],
    pub profile_menu: &'static str,
    pub logout_link: &'static str,
    pub user_name: &'static str,

    // Results page
    pub listing_card: SelectorPair,
    pub title: SelectorPair,
    pub company: SelectorPair,
    pub location: SelectorPair,
    pub link: SelectorPair,
    pub posted_date: SelectorPair,
    pub next_button: &'static str,

    // Detail page
    pub detail_description: SelectorPair,
    pub detail_salary: SelectorPair,
}

/// Current production selector set.
pub const V1: SelectorSet = SelectorSet {
    version: "v1",

    login_indicators: &[
        "nav[aria-label=\"Primary navigation\"]",
        ".global-nav__me",
        "[data-test-id=\"nav-me-dropdown\"]",
    ],
    profile_menu: ".global-nav__me",
    logout_link: "a[href*=\"/logout\"]",
    user_name: "h1",

    listing_card: SelectorPair {
        primary: ".job-search-card",
        fallback: ".jobs-search-results__list-item",
    },
    title: SelectorPair {
        primary: "[data-test-id=\"job-title\"]",
        fallback: "h3 a, .job-search-card__title a",
    },
    company: SelectorPair {
        primary: "[data-test-id=\"job-search-card-subtitle\"] a",
        fallback: ".job-search-card__subtitle a",
    },
    location: SelectorPair {
        primary: ".job-search-card__location",
        fallback: ".base-search-card__metadata span",
    },
    link: SelectorPair {
        primary: "h3 a",
        fallback: ".job-search-card__title a, a.base-card__full-link",
    },
    posted_date: SelectorPair {
        primary: "time[datetime]",
        fallback: "time",
    },
    next_button: "button[aria-label=\"Next\"]",

    detail_description: SelectorPair {
        primary: ".jobs-search__job-details--container",
        fallback: ".description__text, .show-more-less-html__markup",
    },
    detail_salary: SelectorPair {
        primary: ".jobs-details__salary-main-rail",
        fallback: ".salary, .compensation__salary",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Every selector in the set must parse as CSS — a typo here silently
    /// turns a whole extraction field into placeholders.
    #[test]
    fn all_selectors_are_valid_css() {
        let set = V1;
        let singles = [
            set.profile_menu,
            set.logout_link,
            set.user_name,
            set.next_button,
        ];
        let pairs = [
            set.listing_card,
            set.title,
            set.company,
            set.location,
            set.link,
            set.posted_date,
            set.detail_description,
            set.detail_salary,
        ];
        for sel in set.login_indicators.iter().copied().chain(singles) {
            assert!(
                scraper::Selector::parse(sel).is_ok(),
                "selector failed to parse: {}",
                sel
            );
        }
        for pair in pairs {
            for sel in [pair.primary, pair.fallback] {
                assert!(
                    scraper::Selector::parse(sel).is_ok(),
                    "selector failed to parse: {}",
                    sel
                );
            }
        }
    }
}

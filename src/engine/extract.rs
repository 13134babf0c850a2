//! Listing extraction engine.
//!
//! Turns a `JobFilter` into a bounded sequence of structured records:
//! build the search URL, paginate result pages, extract per-card summary
//! fields through primary/fallback selectors, and attempt a best-effort
//! detail expansion per listing. Detail failures degrade to placeholders —
//! one broken listing never aborts the run.

use chromiumoxide::Element;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::core::error::EngineError;
use crate::core::types::{JobFilter, JobListing, ScrapeOutcome};
use crate::engine::auth::AuthGate;
use crate::engine::selectors::{SelectorPair, SelectorSet};
use crate::engine::{humanize, query, wait_until_stable, JobScraper};

/// Description snippet cap (chars).
const DESCRIPTION_MAX_CHARS: usize = 500;

// ── Pure field helpers ───────────────────────────────────────────────────────

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("valid email pattern")
    })
}

/// Extract email-shaped substrings, deduplicated in first-seen order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in email_re().find_iter(text) {
        let addr = m.as_str().to_string();
        if !seen.contains(&addr) {
            seen.push(addr);
        }
    }
    seen
}

/// Truncate on a char boundary; byte-slicing multibyte text panics.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// How many records this page may still contribute.
pub(crate) fn remaining_capacity(max_records: usize, accumulated: usize) -> usize {
    max_records.saturating_sub(accumulated)
}

// ── Detail expansion ─────────────────────────────────────────────────────────

/// Fields read from a listing's own page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub description: String,
    pub emails: Vec<String>,
    pub salary: String,
}

/// Explicit degraded form: the detail sub-step failed and the record carries
/// placeholders. Kept as a separate type (rather than broad error
/// suppression) so degradation is visible at the call site and in tests.
#[derive(Debug, Default)]
pub struct DegradedFields {
    pub reason: String,
}

impl DegradedFields {
    pub fn because(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn into_placeholders(self) -> DetailFields {
        DetailFields {
            description: "N/A".to_string(),
            emails: Vec::new(),
            salary: "N/A".to_string(),
        }
    }
}

fn select_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let node = doc.select(&sel).next()?;
    let text: String = node.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn select_text_pair(doc: &Html, pair: SelectorPair) -> Option<String> {
    select_text(doc, pair.primary).or_else(|| select_text(doc, pair.fallback))
}

/// Parse the detail page HTML into structured fields.
///
/// A missing description node means the page did not render the markup we
/// know — that degrades the whole sub-step. A missing salary node is normal
/// (most listings have none) and yields the placeholder within a successful
/// parse.
pub fn parse_detail_html(html: &str, set: &SelectorSet) -> Result<DetailFields, DegradedFields> {
    let doc = Html::parse_document(html);

    let description_full = select_text_pair(&doc, set.detail_description)
        .ok_or_else(|| DegradedFields::because("description container not found"))?;

    // Emails are scanned over the full text before truncation; a contact
    // address past the 500-char mark still counts.
    let emails = extract_emails(&description_full);
    let description = truncate_chars(&description_full, DESCRIPTION_MAX_CHARS);

    let salary = select_text_pair(&doc, set.detail_salary).unwrap_or_else(|| "N/A".to_string());

    Ok(DetailFields {
        description,
        emails,
        salary,
    })
}

// ── Per-card summary ─────────────────────────────────────────────────────────

/// Summary fields read from one results-page card, before the detail
/// excursion. Collected for the whole page up front: navigating to a detail
/// page invalidates the card element handles.
#[derive(Debug, Clone)]
struct ListingSummary {
    title: String,
    company: String,
    location: String,
    url: String,
    posted_date: String,
}

async fn element_text(el: &Element) -> Option<String> {
    el.inner_text()
        .await
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn find_in(card: &Element, pair: SelectorPair) -> Option<Element> {
    if let Ok(el) = card.find_element(pair.primary).await {
        return Some(el);
    }
    card.find_element(pair.fallback).await.ok()
}

async fn text_in(card: &Element, pair: SelectorPair) -> Option<String> {
    let el = find_in(card, pair).await?;
    element_text(&el).await
}

// ── Engine operations ────────────────────────────────────────────────────────

impl JobScraper {
    /// Run one bounded extraction.
    ///
    /// Preconditions are checked in order: filter validity (before any
    /// browser interaction), then a *fresh* authoritative auth check — the
    /// cached flag never gates. Navigation failures mid-run abort into a
    /// failure outcome with an empty record list; they do not corrupt auth
    /// state and do not surface as errors.
    pub async fn scrape_jobs(&mut self, filter: &JobFilter) -> Result<ScrapeOutcome, EngineError> {
        if filter.keywords.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "keywords must not be empty".to_string(),
            ));
        }
        if filter.max_jobs == 0 {
            return Err(EngineError::InvalidInput(
                "max_jobs must be at least 1".to_string(),
            ));
        }

        let live = self.check_status().await?;
        AuthGate::authorize(live)?;

        match self.run_extraction(filter).await {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Navigation(msg)) => {
                warn!("extract: run aborted: {}", msg);
                Ok(ScrapeOutcome::failure(format!("Scraping failed: {}", msg)))
            }
            Err(other) => Err(other),
        }
    }

    async fn run_extraction(&mut self, filter: &JobFilter) -> Result<ScrapeOutcome, EngineError> {
        let search = query::search_url(&self.jobs_search_base()?, filter);
        info!("extract: 🔎 searching {}", search);

        self.goto(search.as_str()).await?;
        wait_until_stable(&self.page, 800, 20_000).await;
        humanize::pause(humanize::SETTLE).await;

        let max_records = filter.max_jobs;
        let max_pages = self.config.resolve_max_pages();
        let mut jobs: Vec<JobListing> = Vec::new();

        for page_num in 1..=max_pages {
            let summaries = self.collect_page_summaries().await?;
            if summaries.is_empty() {
                info!("extract: page {} yielded no listing elements", page_num);
                break;
            }
            info!(
                "extract: page {} — {} listings, {} collected so far",
                page_num,
                summaries.len(),
                jobs.len()
            );

            let results_url = self.current_url().await;
            let budget = remaining_capacity(max_records, jobs.len());
            for summary in summaries.into_iter().take(budget) {
                let record = self.expand_listing(summary, &results_url).await;
                info!("extract: ✓ {} at {}", record.title, record.company);
                jobs.push(record);
                humanize::pause(humanize::RECORD).await;
            }

            if jobs.len() >= max_records {
                break;
            }
            if !self.advance_to_next_page().await? {
                info!("extract: no further pages");
                break;
            }
        }

        let total = jobs.len();
        Ok(ScrapeOutcome {
            success: true,
            message: format!("Successfully scraped {} jobs", total),
            jobs,
            total_found: total,
        })
    }

    /// Enumerate listing cards on the current results page and read their
    /// summary fields. Scrolls first to trigger lazy-rendered cards.
    async fn collect_page_summaries(&mut self) -> Result<Vec<ListingSummary>, EngineError> {
        humanize::scroll(&self.page, 2).await?;

        let cards = match self
            .page
            .find_elements(self.selectors.listing_card.primary)
            .await
        {
            Ok(cards) if !cards.is_empty() => cards,
            _ => self
                .page
                .find_elements(self.selectors.listing_card.fallback)
                .await
                .unwrap_or_default(),
        };

        let mut summaries = Vec::with_capacity(cards.len());
        for card in &cards {
            summaries.push(self.summarize_card(card).await);
        }
        Ok(summaries)
    }

    async fn summarize_card(&self, card: &Element) -> ListingSummary {
        let title = text_in(card, self.selectors.title)
            .await
            .unwrap_or_else(|| "N/A".to_string());
        let company = text_in(card, self.selectors.company)
            .await
            .unwrap_or_else(|| "N/A".to_string());

        let location = text_in(card, self.selectors.location)
            .await
            .unwrap_or_else(|| "N/A".to_string());

        let url = match find_in(card, self.selectors.link).await {
            Some(el) => el
                .attribute("href")
                .await
                .ok()
                .flatten()
                .map(|href| self.absolutize(&href))
                .unwrap_or_else(|| "N/A".to_string()),
            None => "N/A".to_string(),
        };

        let posted_date = match find_in(card, self.selectors.posted_date).await {
            Some(el) => match el.attribute("datetime").await.ok().flatten() {
                Some(dt) => dt,
                None => element_text(&el).await.unwrap_or_else(|| "N/A".to_string()),
            },
            None => "N/A".to_string(),
        };

        ListingSummary {
            title,
            company,
            location,
            url,
            posted_date,
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            self.base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| "N/A".to_string())
        }
    }

    /// Best-effort detail excursion for one listing, always returning to the
    /// results list afterwards.
    async fn expand_listing(&self, summary: ListingSummary, results_url: &str) -> JobListing {
        let detail = if summary.url.starts_with("http") {
            let result = self.fetch_detail(&summary.url).await;
            let fields = match result {
                Ok(fields) => fields,
                Err(degraded) => {
                    warn!(
                        "extract: detail expansion degraded for {}: {}",
                        summary.url, degraded.reason
                    );
                    degraded.into_placeholders()
                }
            };
            // Back to the results list before the next record.
            if let Err(e) = self.goto(results_url).await {
                warn!("extract: return to results failed: {}", e);
            } else {
                humanize::pause(humanize::RETURN).await;
            }
            fields
        } else {
            DegradedFields::because("no canonical listing URL").into_placeholders()
        };

        JobListing {
            title: summary.title,
            company: summary.company,
            location: summary.location,
            url: summary.url,
            posted_date: summary.posted_date,
            description: detail.description,
            salary: detail.salary,
            emails: detail.emails,
        }
    }

    async fn fetch_detail(&self, url: &str) -> Result<DetailFields, DegradedFields> {
        self.goto(url)
            .await
            .map_err(|e| DegradedFields::because(format!("detail navigation failed: {}", e)))?;
        wait_until_stable(&self.page, 800, 15_000).await;
        humanize::pause(humanize::RECORD).await;

        let html = self
            .page
            .content()
            .await
            .map_err(|e| DegradedFields::because(format!("detail content unavailable: {}", e)))?;

        parse_detail_html(&html, &self.selectors)
    }

    /// Click the next-page control if one exists and is enabled. Returns
    /// `false` when pagination is exhausted.
    async fn advance_to_next_page(&mut self) -> Result<bool, EngineError> {
        let button = match self.page.find_element(self.selectors.next_button).await {
            Ok(b) => b,
            Err(_) => return Ok(false),
        };

        let disabled = button.attribute("disabled").await.ok().flatten().is_some()
            || button
                .attribute("aria-disabled")
                .await
                .ok()
                .flatten()
                .map(|v| v == "true")
                .unwrap_or(false);
        if disabled {
            return Ok(false);
        }

        button
            .click()
            .await
            .map_err(|e| EngineError::nav("next-page click failed", e))?;
        humanize::pause(humanize::SETTLE).await;
        wait_until_stable(&self.page, 800, 20_000).await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::selectors::V1;

    #[test]
    fn emails_dedup_in_first_seen_order() {
        let text = "Reach out to hr@acme.io or jobs@acme.io; again: hr@acme.io.";
        assert_eq!(extract_emails(text), vec!["hr@acme.io", "jobs@acme.io"]);
    }

    #[test]
    fn email_pattern_ignores_non_addresses() {
        let text = "salary @ 50k, twitter @acme, ok: talent@corp.example.com";
        assert_eq!(extract_emails(text), vec!["talent@corp.example.com"]);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let s = "é".repeat(600);
        let t = truncate_chars(&s, DESCRIPTION_MAX_CHARS);
        assert_eq!(t.chars().count(), 500);
    }

    #[test]
    fn remaining_capacity_saturates() {
        assert_eq!(remaining_capacity(5, 0), 5);
        assert_eq!(remaining_capacity(5, 3), 2);
        assert_eq!(remaining_capacity(5, 5), 0);
        assert_eq!(remaining_capacity(5, 9), 0);
    }

    #[test]
    fn detail_parse_extracts_description_emails_and_salary() {
        let html = r#"
            <html><body>
              <div class="jobs-search__job-details--container">
                Build distributed systems. Contact recruiting@corp.dev for details.
                Apply twice: recruiting@corp.dev.
              </div>
              <div class="jobs-details__salary-main-rail">$120,000 – $150,000</div>
            </body></html>"#;

        let fields = parse_detail_html(html, &V1).expect("detail should parse");
        assert!(fields.description.starts_with("Build distributed systems."));
        assert_eq!(fields.emails, vec!["recruiting@corp.dev"]);
        assert_eq!(fields.salary, "$120,000 – $150,000");
    }

    #[test]
    fn detail_parse_uses_fallback_selector() {
        let html = r#"
            <html><body>
              <div class="description__text">Ship features, fix bugs.</div>
            </body></html>"#;

        let fields = parse_detail_html(html, &V1).expect("fallback should match");
        assert_eq!(fields.description, "Ship features, fix bugs.");
        assert!(fields.emails.is_empty());
        assert_eq!(fields.salary, "N/A");
    }

    #[test]
    fn detail_parse_truncates_at_500_chars() {
        let body = "word ".repeat(300);
        let html = format!(
            r#"<html><body><div class="description__text">{}</div></body></html>"#,
            body
        );
        let fields = parse_detail_html(&html, &V1).expect("should parse");
        assert_eq!(fields.description.chars().count(), 500);
    }

    #[test]
    fn detail_parse_degrades_without_description_node() {
        let html = "<html><body><p>nothing recognizable</p></body></html>";
        let degraded = parse_detail_html(html, &V1).expect_err("no description → degraded");
        assert!(degraded.reason.contains("description"));
        let placeholders = degraded.into_placeholders();
        assert_eq!(placeholders.description, "N/A");
        assert!(placeholders.emails.is_empty());
        assert_eq!(placeholders.salary, "N/A");
    }
}

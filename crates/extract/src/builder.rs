// ABOUTME: Record builder that turns one job detail page into a JobRecord.
// ABOUTME: Runs ordered field rules, derives the job id and enriches the location.

//! Record building.
//!
//! [`RecordBuilder::build`] never drops a record itself: it returns what it
//! extracted together with the list of empty required fields. Callers decide
//! whether to keep it, usually through [`BuildOutcome::into_record`].
//!
//! The document is parsed and fully read inside [`RecordBuilder::extract`]
//! before the geocoding call is awaited, so the build future stays `Send`.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tracing::debug;
use url::Url;

use crate::error::ExtractError;
use crate::geocode::Geocoder;
use crate::identifier::derive_id;
use crate::location::{enrich_location, DEFAULT_GEOCODE_TIMEOUT};
use crate::normalize::take_first;
use crate::record::JobRecord;
use crate::rules::{FieldRules, SiteRules};
use crate::select::{extract_fragments, extract_normalized};

/// Fields read from a detail page before location enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    /// The record with every field except `location` populated.
    pub record: JobRecord,
    /// Location text as it appears on the page.
    pub raw_location: String,
}

/// A built record plus its required-field completeness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub record: JobRecord,
    /// Required fields that came out empty.
    pub missing: Vec<&'static str>,
}

impl BuildOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Returns the record if complete, otherwise an `Incomplete` error
    /// naming the missing fields.
    pub fn into_record(self) -> Result<JobRecord, ExtractError> {
        if self.is_complete() {
            return Ok(self.record);
        }
        Err(ExtractError::incomplete(
            self.record.url,
            "Build",
            Some(anyhow::anyhow!(
                "missing required fields: {}",
                self.missing.join(", ")
            )),
        ))
    }
}

/// Builds job records from detail-page HTML using one board's rules.
///
/// Cheap to clone and safe to share between concurrent page tasks.
#[derive(Clone)]
pub struct RecordBuilder {
    rules: Arc<SiteRules>,
    geocoder: Arc<dyn Geocoder>,
    geocode_timeout: Duration,
}

impl RecordBuilder {
    pub fn new(rules: SiteRules, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            rules: Arc::new(rules),
            geocoder,
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }

    /// Set the bound on the geocoding call.
    pub fn geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    pub fn rules(&self) -> &SiteRules {
        &self.rules
    }

    /// Reads every field from the page without enriching the location.
    ///
    /// Fails only when no job id can be derived from `source_url`.
    pub fn extract(&self, html: &str, source_url: &str) -> Result<ExtractedFields, ExtractError> {
        let job_id = derive_id(source_url)?;
        let doc = Html::parse_document(html);
        let rules = &self.rules;

        let text = |name: &str, field: &FieldRules| {
            extract_normalized(&doc, field).unwrap_or_else(|| {
                debug!(url = source_url, field = name, "field came out empty");
                String::new()
            })
        };
        let optional = |field: &Option<FieldRules>| {
            field.as_ref().and_then(|f| extract_normalized(&doc, f))
        };

        let raw_location = extract_fragments(&doc, &rules.location)
            .and_then(|fragments| take_first(&fragments))
            .unwrap_or_default();

        let apply_url = rules
            .apply_url
            .as_ref()
            .and_then(|f| extract_fragments(&doc, f))
            .and_then(|fragments| take_first(&fragments))
            .and_then(|href| resolve_apply_url(source_url, &href));

        let record = JobRecord {
            title: text("title", &rules.title),
            job_id,
            url: source_url.to_string(),
            company: text("company", &rules.company),
            location: String::new(),
            description: text("description", &rules.description),
            apply_url,
            industry: optional(&rules.industry),
            base_salary: optional(&rules.base_salary),
            benefits: optional(&rules.benefits),
            requirements: optional(&rules.requirements),
            skills: optional(&rules.skills),
            work_hours: optional(&rules.work_hours),
        };

        Ok(ExtractedFields {
            record,
            raw_location,
        })
    }

    /// Builds the record for one detail page.
    ///
    /// Returns an `Identifier` error when the URL yields no job id; every
    /// other gap is reported through [`BuildOutcome::missing`].
    pub async fn build(&self, html: &str, source_url: &str) -> Result<BuildOutcome, ExtractError> {
        let ExtractedFields {
            mut record,
            raw_location,
        } = self.extract(html, source_url)?;

        record.location =
            enrich_location(self.geocoder.as_ref(), &raw_location, self.geocode_timeout).await;

        let missing = record.missing_required();
        Ok(BuildOutcome { record, missing })
    }
}

/// Resolves a possibly relative apply link against the page URL.
///
/// Returns `None` when it points back at the page itself.
fn resolve_apply_url(source_url: &str, href: &str) -> Option<String> {
    let resolved = match Url::parse(source_url) {
        Ok(base) => {
            let joined = base.join(href).ok()?;
            if joined == base {
                return None;
            }
            joined.to_string()
        }
        Err(_) => href.to_string(),
    };
    (resolved != source_url).then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{DisabledGeocoder, GeocodeError, GeocodeResult};
    use crate::rules::{load_builtin_rules, SelectorSpec};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    const JOB_URL: &str = "http://www.simplylawjobs.com/job/commercial-property-solicitor/40123";

    struct FixedGeocoder(&'static str);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
            Ok(Some(GeocodeResult {
                address: self.0.to_string(),
            }))
        }
    }

    fn detail_page(description: &str) -> String {
        format!(
            r#"<html><body>
            <div id="center_column">
                <div class="crumbs">Home</div>
                <div class="job">
                    <h1 class="job_title"> Commercial Property Solicitor </h1>
                    <div class="posted">Posted today</div>
                    <div class="meta">
                        <a href="/company/acme">Acme &amp; Co LLP</a>
                        <a href="/location/leeds">
                            Leeds
                        </a>
                    </div>
                    {description}
                </div>
            </div>
            </body></html>"#
        )
    }

    fn builder() -> RecordBuilder {
        RecordBuilder::new(load_builtin_rules(), Arc::new(DisabledGeocoder))
    }

    #[tokio::test]
    async fn builds_complete_record_from_paragraph_layout() {
        let html = detail_page(
            r#"<div class="description allow-bulletpoints hide-for-small">
                <p> First paragraph. </p>
                <p>   </p>
                <p>Second paragraph.</p>
            </div>"#,
        );

        let outcome = builder().build(&html, JOB_URL).await.unwrap();

        assert!(outcome.is_complete(), "missing: {:?}", outcome.missing);
        assert_eq!(
            outcome.record,
            JobRecord {
                title: "Commercial Property Solicitor".into(),
                job_id: "40123".into(),
                url: JOB_URL.into(),
                company: "Acme & Co LLP".into(),
                location: "Leeds".into(),
                description: "First paragraph. Second paragraph.".into(),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn first_matching_description_variant_excludes_others() {
        let html = detail_page(
            r#"<div class="description allow-bulletpoints hide-for-small">
                Loose text that the fourth variant would pick up.
                <p>Paragraph text.<span>Span text.</span></p>
            </div>
            <div class="description">Third variant text.</div>"#,
        );

        let record = builder().build(&html, JOB_URL).await.unwrap().record;
        assert_eq!(record.description, "Paragraph text.");
    }

    #[tokio::test]
    async fn falls_through_to_span_layout() {
        let html = detail_page(
            r#"<div class="description allow-bulletpoints hide-for-small">
                <p><span>Span one.</span></p>
                <p><span> Span two. </span></p>
            </div>"#,
        );

        let record = builder().build(&html, JOB_URL).await.unwrap().record;
        assert_eq!(record.description, "Span one. Span two.");
    }

    #[tokio::test]
    async fn falls_through_to_plain_description_div() {
        let html = detail_page(r#"<div class="description">  Plain body text.  </div>"#);

        let record = builder().build(&html, JOB_URL).await.unwrap().record;
        assert_eq!(record.description, "Plain body text.");
    }

    #[tokio::test]
    async fn falls_through_to_bare_text_layout() {
        let html = detail_page(
            r#"<div class="description allow-bulletpoints hide-for-small">
                Bare text only.
                <ul><li>Not included</li></ul>
            </div>"#,
        );

        let record = builder().build(&html, JOB_URL).await.unwrap().record;
        assert_eq!(record.description, "Bare text only.");
    }

    #[tokio::test]
    async fn missing_title_is_reported_incomplete() {
        let html = detail_page(r#"<div class="description">Body.</div>"#)
            .replace(r#"<h1 class="job_title"> Commercial Property Solicitor </h1>"#, "");

        let outcome = builder().build(&html, JOB_URL).await.unwrap();
        assert_eq!(outcome.missing, vec!["title"]);

        let err = outcome.into_record().unwrap_err();
        assert!(err.is_incomplete());
        assert!(err.to_string().contains("missing required fields: title"));
    }

    #[tokio::test]
    async fn missing_description_is_reported_incomplete() {
        let outcome = builder().build(&detail_page(""), JOB_URL).await.unwrap();
        assert_eq!(outcome.missing, vec!["description"]);
        assert_eq!(outcome.record.description, "");
    }

    #[tokio::test]
    async fn blank_paragraph_match_blocks_later_variants() {
        let html = detail_page(
            r#"<div class="description allow-bulletpoints hide-for-small"><p>   </p>Fourth variant text.</div>"#,
        );

        let outcome = builder().build(&html, JOB_URL).await.unwrap();
        assert_eq!(outcome.record.description, "");
        assert_eq!(outcome.missing, vec!["description"]);
        assert!(outcome.into_record().unwrap_err().is_incomplete());
    }

    #[tokio::test]
    async fn unresolvable_identifier_is_an_error() {
        let html = detail_page(r#"<div class="description">Body.</div>"#);
        let err = builder()
            .build(&html, "http://www.simplylawjobs.com/job/solicitor?ref=home")
            .await
            .unwrap_err();
        assert!(err.is_identifier());
    }

    #[tokio::test]
    async fn query_decorated_url_keeps_full_url() {
        let html = detail_page(r#"<div class="description">Body.</div>"#);
        let url = "http://www.simplylawjobs.com/job/40123?src=list";
        let record = builder().build(&html, url).await.unwrap().into_record().unwrap();
        assert_eq!(record.job_id, "40123");
        assert_eq!(record.url, url);
    }

    #[tokio::test]
    async fn location_is_enriched_by_geocoder() {
        let html = detail_page(r#"<div class="description">Body.</div>"#);
        let builder = RecordBuilder::new(
            load_builtin_rules(),
            Arc::new(FixedGeocoder(
                "Leeds, West Yorkshire, Yorkshire and the Humber, England, United Kingdom",
            )),
        );

        let record = builder.build(&html, JOB_URL).await.unwrap().record;
        assert_eq!(
            record.location,
            "Leeds, Yorkshire and the Humber, England, United Kingdom"
        );
    }

    #[tokio::test]
    async fn optional_fields_and_apply_url() {
        let mut rules = load_builtin_rules();
        rules.skills = Some(
            FieldRules::single(SelectorSpec::Text("ul.skills > li".into())).with_separator(", "),
        );
        rules.work_hours = Some(FieldRules::single(SelectorSpec::Text(".hours".into())));
        rules.industry = Some(FieldRules::single(SelectorSpec::Text(".industry".into())));
        rules.apply_url = Some(FieldRules::single(SelectorSpec::Attr(vec![
            "a.apply".into(),
            "href".into(),
        ])));

        let html = detail_page(
            r#"<div class="description">Body.</div>
            <ul class="skills"><li> Litigation </li><li></li><li>Drafting</li></ul>
            <span class="hours">  Full time </span>
            <a class="apply" href="/apply/40123">Apply now</a>"#,
        );

        let builder = RecordBuilder::new(rules, Arc::new(DisabledGeocoder));
        let record = builder.build(&html, JOB_URL).await.unwrap().record;

        assert_eq!(record.skills.as_deref(), Some("Litigation, Drafting"));
        assert_eq!(record.work_hours.as_deref(), Some("Full time"));
        assert_eq!(record.industry, None);
        assert_eq!(
            record.apply_url.as_deref(),
            Some("http://www.simplylawjobs.com/apply/40123")
        );
    }

    #[test]
    fn apply_url_equal_to_page_is_dropped() {
        assert_eq!(resolve_apply_url(JOB_URL, JOB_URL), None);
        assert_eq!(resolve_apply_url(JOB_URL, "40123"), None);
        assert_eq!(
            resolve_apply_url(JOB_URL, "https://apply.example.com/x"),
            Some("https://apply.example.com/x".to_string())
        );
    }

    #[test]
    fn extract_keeps_raw_location() {
        let html = detail_page(r#"<div class="description">Body.</div>"#);
        let fields = builder().extract(&html, JOB_URL).unwrap();
        assert_eq!(fields.raw_location, "Leeds");
        assert_eq!(fields.record.location, "");
    }
}

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::query::BaseRecord;

/// Twitter handle shape enforced on `twitter_creator` / `twitter_site`.
static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[@A-Za-z0-9_]{1,15}$")
        .unwrap_or_else(|err| panic!("failed to compile handle pattern: {err}"))
});

/// One enriched history entry, keyed by URL.
///
/// Most fields are optional: they arrive incrementally from independent
/// async sources (favicon lookup, page metadata, bookmark state) and a
/// record is useful at every stage of that fill-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Identity key: scheme+host+path with query/fragment preserved verbatim.
    pub url: String,
    /// Most recent visit or title-change time, epoch milliseconds.
    pub time: i64,
    pub host: String,
    pub scheme: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluid_icon: Option<String>,

    /// Favicon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_site: Option<String>,

    #[serde(default)]
    pub bookmarked: bool,
}

impl HistoryRecord {
    /// A bare record as created by a live visit: identity plus timing, all
    /// enrichment fields unset.
    pub fn new(url: String, host: String, scheme: String, time: i64) -> Self {
        Self {
            url,
            time,
            host,
            scheme,
            ..Default::default()
        }
    }

    /// Build a record from a base query result, deriving host and scheme
    /// from the URL. Returns `None` when the URL does not parse.
    pub fn from_base(base: &BaseRecord) -> Option<Self> {
        let parsed = Url::parse(&base.url).ok()?;
        let mut record = Self::new(
            base.url.clone(),
            parsed.host_str().unwrap_or_default().to_string(),
            parsed.scheme().to_string(),
            base.time,
        );
        record.title = base.title.clone();
        Some(record)
    }

    /// Drop `twitter_creator` / `twitter_site` when they do not look like
    /// handles, and drop the creator when it duplicates the site.
    pub fn sanitize_handles(&mut self) {
        if self.twitter_creator.is_some() && self.twitter_creator == self.twitter_site {
            self.twitter_creator = None;
        }
        for handle in [&mut self.twitter_creator, &mut self.twitter_site] {
            if handle.as_deref().is_some_and(|h| !HANDLE_RE.is_match(h)) {
                *handle = None;
            }
        }
    }

    /// Merge a partial update, field by field. Fields the patch does not
    /// carry are left untouched. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &RecordPatch) -> bool {
        let mut changed = false;

        set_value(&mut self.time, patch.time, &mut changed);
        set_string(&mut self.host, &patch.host, &mut changed);
        set_string(&mut self.scheme, &patch.scheme, &mut changed);
        set_value(&mut self.bookmarked, patch.bookmarked, &mut changed);

        merge_opt(&mut self.title, &patch.title, &mut changed);
        merge_opt(&mut self.og_title, &patch.og_title, &mut changed);
        merge_opt(&mut self.twitter_title, &patch.twitter_title, &mut changed);
        merge_opt(&mut self.description, &patch.description, &mut changed);
        merge_opt(&mut self.og_description, &patch.og_description, &mut changed);
        merge_opt(
            &mut self.twitter_description,
            &patch.twitter_description,
            &mut changed,
        );
        merge_opt(&mut self.image, &patch.image, &mut changed);
        merge_opt(&mut self.og_image, &patch.og_image, &mut changed);
        merge_opt(&mut self.twitter_image, &patch.twitter_image, &mut changed);
        merge_opt(
            &mut self.twitter_image_src,
            &patch.twitter_image_src,
            &mut changed,
        );
        merge_opt(&mut self.fluid_icon, &patch.fluid_icon, &mut changed);
        merge_opt(&mut self.icon, &patch.icon, &mut changed);

        let handles_touched = patch.twitter_creator.is_some() || patch.twitter_site.is_some();
        merge_opt(&mut self.twitter_creator, &patch.twitter_creator, &mut changed);
        merge_opt(&mut self.twitter_site, &patch.twitter_site, &mut changed);
        if handles_touched {
            self.sanitize_handles();
        }

        changed
    }

    /// Best available title: `twitter_title`, then `og_title`, then the
    /// plain page title.
    pub fn display_title(&self) -> Option<&str> {
        first_non_empty([&self.twitter_title, &self.og_title, &self.title])
    }

    pub fn description(&self) -> Option<&str> {
        first_non_empty([&self.twitter_description, &self.og_description])
    }

    pub fn image(&self) -> Option<&str> {
        first_non_empty([
            &self.image,
            &self.fluid_icon,
            &self.twitter_image,
            &self.twitter_image_src,
            &self.og_image,
        ])
    }

    pub fn favicon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image().is_some()
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked
    }

    /// Profile URL for a sanitized handle, e.g. `@bob` ->
    /// `https://twitter.com/bob`.
    pub fn twitter_url(handle: &str) -> String {
        format!("https://twitter.com/{}", handle.trim_start_matches('@'))
    }
}

fn first_non_empty<'a, const N: usize>(fields: [&'a Option<String>; N]) -> Option<&'a str> {
    fields
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

fn merge_opt(dst: &mut Option<String>, src: &Option<String>, changed: &mut bool) {
    if let Some(value) = src
        && dst.as_ref() != Some(value)
    {
        *dst = Some(value.clone());
        *changed = true;
    }
}

fn set_string(dst: &mut String, src: &Option<String>, changed: &mut bool) {
    if let Some(value) = src
        && dst != value
    {
        dst.clone_from(value);
        *changed = true;
    }
}

fn set_value<T: Copy + PartialEq>(dst: &mut T, src: Option<T>, changed: &mut bool) {
    if let Some(value) = src
        && *dst != value
    {
        *dst = value;
        *changed = true;
    }
}

/// A partial update for a record: only the fields it carries are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluid_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarked: Option<bool>,
}

/// One unit of page metadata for a URL, as emitted by the metadata store.
/// Keys keep the tag names used on the wire (`og:title`, `twitter:image:src`,
/// ...). A URL may yield any number of fragments; each is merged
/// independently and later fragments win field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFragment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "og:title",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub og_title: Option<String>,
    #[serde(
        rename = "og:description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub og_description: Option<String>,
    #[serde(
        rename = "og:image",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub og_image: Option<String>,
    #[serde(
        rename = "twitter:title",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_title: Option<String>,
    #[serde(
        rename = "twitter:description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_description: Option<String>,
    #[serde(
        rename = "twitter:image",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_image: Option<String>,
    #[serde(
        rename = "twitter:image:src",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_image_src: Option<String>,
    #[serde(
        rename = "twitter:creator",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_creator: Option<String>,
    #[serde(
        rename = "twitter:site",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub twitter_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    #[serde(
        rename = "icon:fluid-icon",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fluid_icon: Option<String>,
}

impl From<MetadataFragment> for RecordPatch {
    fn from(fragment: MetadataFragment) -> Self {
        RecordPatch {
            description: fragment.description,
            og_title: fragment.og_title,
            og_description: fragment.og_description,
            og_image: fragment.og_image,
            twitter_title: fragment.twitter_title,
            twitter_description: fragment.twitter_description,
            twitter_image: fragment.twitter_image,
            twitter_image_src: fragment.twitter_image_src,
            twitter_creator: fragment.twitter_creator,
            twitter_site: fragment.twitter_site,
            image: fragment.image_src,
            fluid_icon: fragment.fluid_icon,
            ..Default::default()
        }
    }
}

use quire_common::{ContentRef, ContentType, DraftKey, SiteInfo};
use serde::{Deserialize, Serialize};

/// Public addresses the links are built from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkSettings {
    /// Sites without a custom domain live at `https://{handle}.{sites_domain}`
    pub sites_domain: String,
    /// Ledger explorer, transactions are at `{scan_url}/tx/{hash}`
    pub scan_url: String,
    pub share_url: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            sites_domain: "quire.page".to_string(),
            scan_url: "https://scan.quire.page".to_string(),
            share_url: "https://twitter.com/intent/tweet".to_string(),
        }
    }
}

impl LinkSettings {
    pub fn site_link(&self, site: &SiteInfo) -> String {
        self.site_address(&site.handle, site.custom_domain.as_deref())
    }

    fn site_address(&self, handle: &str, custom_domain: Option<&str>) -> String {
        match custom_domain.filter(|domain| !domain.is_empty()) {
            Some(domain) => format!("https://{domain}"),
            None => format!("https://{}.{}", handle, self.sites_domain),
        }
    }

    pub fn post_url(&self, site: &SiteInfo, slug: &str) -> String {
        self.post_address(&site.handle, site.custom_domain.as_deref(), slug)
    }

    fn post_address(&self, handle: &str, custom_domain: Option<&str>, slug: &str) -> String {
        format!(
            "{}/{}",
            self.site_address(handle, custom_domain),
            urlencoding::encode(slug)
        )
    }

    pub fn transaction_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.scan_url, hash)
    }

    pub fn share_url(&self, post_url: &str, title: &str) -> String {
        format!(
            "{}?url={}&text={}",
            self.share_url,
            urlencoding::encode(post_url),
            urlencoding::encode(title)
        )
    }
}

/// Where the editor of one session lives in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorLocation {
    pub handle: String,
    pub id: Option<ContentRef>,
    pub content_type: ContentType,
    pub tag: Option<String>,
}

impl EditorLocation {
    pub fn new(handle: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            handle: handle.into(),
            id: None,
            content_type,
            tag: None,
        }
    }

    pub fn with_id(&self, id: ContentRef) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// `/dashboard/{handle}/editor?id=..&type=..&tag=..`
    pub fn path(&self) -> String {
        let mut query = Vec::with_capacity(3);
        if let Some(id) = &self.id {
            query.push(format!("id={id}"));
        }
        query.push(format!("type={}", self.content_type));
        if let Some(tag) = &self.tag {
            query.push(format!("tag={}", urlencoding::encode(tag)));
        }
        format!("/dashboard/{}/editor?{}", self.handle, query.join("&"))
    }

    pub fn listing_path(&self) -> String {
        format!("/dashboard/{}/{}", self.handle, self.content_type.listing())
    }

    pub fn preview_path(&self, key: &DraftKey) -> String {
        format!("/site/{}/preview/{}", self.handle, key.local_component())
    }
}

/// Links shown once a publish went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedLinks {
    pub post_url: String,
    pub transaction_url: Option<String>,
    pub share_url: Option<String>,
}

impl PublishedLinks {
    /// `site` is `None` when the site lookup failed, the post URL then
    /// falls back to the default site address.
    pub fn build(
        settings: &LinkSettings,
        site: Option<&SiteInfo>,
        handle: &str,
        slug: &str,
        title: &str,
        transaction_hash: Option<&str>,
    ) -> Self {
        let post_url = match site {
            Some(site) => settings.post_url(site, slug),
            None => settings.post_address(handle, None, slug),
        };
        let share_url = Some(settings.share_url(&post_url, title));

        Self {
            transaction_url: transaction_hash.map(|hash| settings.transaction_url(hash)),
            share_url,
            post_url,
        }
    }
}

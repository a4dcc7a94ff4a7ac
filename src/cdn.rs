//! Derives raster and viewer URLs from a canonical document URL.
//!
//! CDN-hosted assets accept transformation directives embedded in the path
//! right after a fixed delimiter (`/upload/` by default). Rewrites are plain
//! string operations: no request is ever made here.

use crate::config::PreviewConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// The transformation segment `rewrite` emits. Only this exact shape is
/// replaced on a second pass; any other leading segment is a folder.
static EMITTED_TRANSFORMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^pg_\d+,f_auto,q_auto,w_\d+,c_limit$")
        .expect("transformation segment pattern is valid")
});

#[derive(Debug, Clone)]
pub struct CdnTransformer {
    host: String,
    delimiter: String,
    thumbnail_width: u32,
    page_width: u32,
    raster_extension: String,
    external_viewer_endpoint: String,
    native_frame_fragment: String,
}

impl CdnTransformer {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            host: config.cdn_host.to_ascii_lowercase(),
            delimiter: config.cdn_path_delimiter.clone(),
            thumbnail_width: config.thumbnail_width,
            page_width: config.page_width,
            raster_extension: config.raster_extension.clone(),
            external_viewer_endpoint: config.external_viewer_endpoint.clone(),
            native_frame_fragment: config.native_frame_fragment.clone(),
        }
    }

    /// True when the URL's host is the CDN host or one of its subdomains.
    pub fn is_cdn_hosted(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url.trim()) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Page 1 as a width-bounded raster, for library cards.
    ///
    /// `None` for assets that are not CDN-hosted. When the delimiter is
    /// missing the original URL comes back unchanged.
    pub fn single_page_preview_url(&self, url: &str) -> Option<String> {
        if !self.is_cdn_hosted(url) {
            return None;
        }
        Some(self.rewrite(url, 1, self.thumbnail_width))
    }

    /// Raster URL for a 0-based page index, sized for full-screen viewing.
    pub fn page_raster_url(&self, url: &str, page_index: usize) -> Option<String> {
        if !self.is_cdn_hosted(url) {
            return None;
        }
        Some(self.rewrite(url, page_index + 1, self.page_width))
    }

    /// Generic hosted viewer pointed at the asset. Works for any host.
    pub fn external_viewer_url(&self, url: &str) -> String {
        let separator = if self.external_viewer_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{separator}embedded=1&url={}",
            self.external_viewer_endpoint,
            urlencoding::encode(url.trim())
        )
    }

    /// Raw asset URL with the browser viewer chrome suppressed.
    pub fn native_frame_url(&self, url: &str) -> String {
        let url = url.trim();
        let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
        if self.native_frame_fragment.is_empty() {
            return without_fragment.to_string();
        }
        format!("{without_fragment}#{}", self.native_frame_fragment)
    }

    fn rewrite(&self, url: &str, page_number: usize, width: u32) -> String {
        let Some(idx) = url.find(self.delimiter.as_str()) else {
            return url.to_string();
        };
        let split_at = idx + self.delimiter.len();
        let (base, rest) = url.split_at(split_at);
        let rest = rest
            .split(|ch: char| ch == '?' || ch == '#')
            .next()
            .unwrap_or_default();

        let mut segments: Vec<&str> = rest.split('/').collect();
        while segments.len() > 1 && EMITTED_TRANSFORMATION.is_match(segments[0]) {
            segments.remove(0);
        }
        if let Some(last) = segments.last_mut() {
            let name = *last;
            if let Some(dot) = name.rfind('.') {
                *last = &name[..dot];
            }
        }
        let public_id = segments.join("/");

        format!(
            "{base}pg_{page_number},f_auto,q_auto,w_{width},c_limit/{public_id}.{}",
            self.raster_extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> CdnTransformer {
        CdnTransformer::new(&PreviewConfig {
            cdn_host: "cdn.example.com".to_string(),
            ..PreviewConfig::default()
        })
    }

    #[test]
    fn detects_cdn_host_and_subdomains() {
        let cdn = transformer();
        assert!(cdn.is_cdn_hosted("https://cdn.example.com/upload/abc.pdf"));
        assert!(cdn.is_cdn_hosted("https://eu.CDN.example.com/upload/abc.pdf"));
        assert!(!cdn.is_cdn_hosted("https://evilcdn.example.com/upload/abc.pdf"));
        assert!(!cdn.is_cdn_hosted("https://files.example.org/cdn.example.com/abc.pdf"));
        assert!(!cdn.is_cdn_hosted("not a url"));
    }

    #[test]
    fn host_check_is_deterministic() {
        let cdn = transformer();
        let url = "https://cdn.example.com/upload/abc.pdf";
        assert_eq!(cdn.is_cdn_hosted(url), cdn.is_cdn_hosted(url));
    }

    #[test]
    fn page_raster_uses_one_based_page_and_raster_extension() {
        let cdn = transformer();
        let out = cdn
            .page_raster_url("https://cdn.example.com/upload/abc.pdf", 1)
            .expect("cdn asset");
        assert_eq!(
            out,
            "https://cdn.example.com/upload/pg_2,f_auto,q_auto,w_1600,c_limit/abc.jpg"
        );
    }

    #[test]
    fn preview_strips_query_and_keeps_version_segment() {
        let cdn = transformer();
        let out = cdn
            .single_page_preview_url("https://cdn.example.com/demo/image/upload/v1712/cv/file.pdf?token=abc")
            .expect("cdn asset");
        assert_eq!(
            out,
            "https://cdn.example.com/demo/image/upload/pg_1,f_auto,q_auto,w_1200,c_limit/v1712/cv/file.jpg"
        );
        assert!(!out.contains("token"));
    }

    #[test]
    fn rewriting_own_output_does_not_stack_transformations() {
        let cdn = transformer();
        let once = cdn
            .page_raster_url("https://cdn.example.com/upload/file.pdf?token=abc", 0)
            .expect("cdn asset");
        let twice = cdn.page_raster_url(&once, 0).expect("cdn asset");
        assert_eq!(once, twice);
        assert_eq!(twice.matches("pg_").count(), 1);
        assert!(!twice.contains("?token=abc"));

        let preview = cdn.single_page_preview_url(&once).expect("cdn asset");
        assert_eq!(preview.matches("c_limit").count(), 1);
        assert!(preview.contains("w_1200"));
    }

    #[test]
    fn folder_names_are_not_mistaken_for_directives() {
        let cdn = transformer();
        let out = cdn
            .page_raster_url("https://cdn.example.com/upload/my_docs/cv.pdf", 0)
            .expect("cdn asset");
        assert_eq!(
            out,
            "https://cdn.example.com/upload/pg_1,f_auto,q_auto,w_1600,c_limit/my_docs/cv.jpg"
        );
    }

    #[test]
    fn directive_like_folders_survive_the_rewrite() {
        let cdn = transformer();
        for folder in ["t_shirts", "e_docs", "b_files", "x_ray", "l_letters", "w_800"] {
            let url = format!("https://cdn.example.com/upload/{folder}/cv.pdf");
            let out = cdn.page_raster_url(&url, 0).expect("cdn asset");
            assert_eq!(
                out,
                format!("https://cdn.example.com/upload/pg_1,f_auto,q_auto,w_1600,c_limit/{folder}/cv.jpg")
            );
            let thumb = cdn.single_page_preview_url(&out).expect("cdn asset");
            assert!(thumb.ends_with(&format!("c_limit/{folder}/cv.jpg")));
        }
    }

    #[test]
    fn missing_delimiter_returns_url_unchanged() {
        let cdn = transformer();
        let url = "https://cdn.example.com/raw/abc.pdf";
        assert_eq!(cdn.page_raster_url(url, 3).as_deref(), Some(url));
        assert_eq!(cdn.single_page_preview_url(url).as_deref(), Some(url));
    }

    #[test]
    fn non_cdn_assets_have_no_raster_urls() {
        let cdn = transformer();
        let url = "https://files.example.org/upload/abc.pdf";
        assert_eq!(cdn.single_page_preview_url(url), None);
        assert_eq!(cdn.page_raster_url(url, 0), None);
    }

    #[test]
    fn external_viewer_encodes_the_asset_url() {
        let cdn = transformer();
        assert_eq!(
            cdn.external_viewer_url("https://files.example.org/a b.pdf?x=1&y=2"),
            "https://docs.google.com/gview?embedded=1&url=https%3A%2F%2Ffiles.example.org%2Fa%20b.pdf%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn native_frame_replaces_existing_fragment() {
        let cdn = transformer();
        assert_eq!(
            cdn.native_frame_url("https://files.example.org/a.pdf#page=3"),
            "https://files.example.org/a.pdf#toolbar=0&navpanes=0&scrollbar=1"
        );
    }
}

//! Delivery planning.
//!
//! Turns a grant into a concrete serving strategy (proxy internal
//! redirect, sendfile header, or direct streaming) with the header set
//! the grant reason calls for, and turns a denial into a sanitized
//! fallback redirect carrying an opaque reason code. The API layer
//! renders the plan into an HTTP response; no bytes move here.

use std::path::{Path, PathBuf};

use mediagate_core::config::delivery::{DeliveryConfig, ProxyFamily};
use mediagate_core::types::{AccessReason, DenyReason};

/// Query parameter carrying the denial reason code.
const ERROR_PARAM: &str = "mg_error";

/// How the file is presented to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Render in the browser.
    Inline,
    /// Force a download.
    Attachment,
}

impl Disposition {
    /// The `Content-Disposition` header value with a quoted filename.
    pub fn header_value(self, filename: &str) -> String {
        let kind = match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        };
        format!("{kind}; filename=\"{}\"", filename.replace('"', ""))
    }
}

/// Browser-cache treatment for a granted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Token links are single-audience secrets; nothing may retain
    /// the bytes.
    NoStore,
    /// Publicly cacheable for a bounded window.
    Public,
    /// Cacheable only by the requesting client, briefly.
    Private,
}

impl CachePolicy {
    /// The `Cache-Control` header value.
    pub fn header_value(self) -> &'static str {
        match self {
            Self::NoStore => "no-store, no-cache, must-revalidate, max-age=0",
            Self::Public => "public, max-age=3600",
            Self::Private => "private, max-age=900",
        }
    }
}

/// Response headers shared by every delivery plan.
#[derive(Debug, Clone)]
pub struct DeliveryHeaders {
    /// Sniffed content type.
    pub content_type: String,
    /// Inline or attachment, with the filename.
    pub disposition: Disposition,
    /// Cache treatment.
    pub cache: CachePolicy,
    /// File name presented to the client.
    pub filename: String,
}

/// How the granted file leaves the process.
#[derive(Debug, Clone)]
pub enum DeliveryPlan {
    /// Hand transmission to the front-end via a single header; the
    /// response body stays empty.
    Offload {
        /// Family-specific header name.
        header_name: &'static str,
        /// Header value: an internal location or a filesystem path.
        header_value: String,
        /// Shared response headers.
        headers: DeliveryHeaders,
    },
    /// Stream the bytes from this process.
    Stream {
        /// Absolute path of the file to stream.
        file_path: PathBuf,
        /// Shared response headers.
        headers: DeliveryHeaders,
    },
}

impl DeliveryPlan {
    /// The shared headers regardless of strategy.
    pub fn headers(&self) -> &DeliveryHeaders {
        match self {
            Self::Offload { headers, .. } | Self::Stream { headers, .. } => headers,
        }
    }
}

/// Plan the delivery of a granted file.
///
/// Offload order: proxy internal redirect when both a proxy family and
/// an internal alias prefix are configured, then `X-Sendfile` when the
/// environment honours it, then direct streaming.
pub fn plan(
    resource_path: &str,
    file_path: &Path,
    reason: AccessReason,
    config: &DeliveryConfig,
) -> DeliveryPlan {
    let filename = resource_path
        .rsplit('/')
        .next()
        .unwrap_or(resource_path)
        .to_string();

    let headers = DeliveryHeaders {
        content_type: content_type_for(file_path),
        disposition: if reason.is_token() {
            Disposition::Attachment
        } else {
            Disposition::Inline
        },
        cache: if reason.is_token() {
            CachePolicy::NoStore
        } else if reason.is_public() {
            CachePolicy::Public
        } else {
            CachePolicy::Private
        },
        filename,
    };

    if let (Some(proxy), Some(prefix)) = (config.proxy, config.internal_prefix.as_deref()) {
        let header_name = match proxy {
            ProxyFamily::Nginx => "X-Accel-Redirect",
            ProxyFamily::Litespeed => "X-LiteSpeed-Location",
        };
        return DeliveryPlan::Offload {
            header_name,
            header_value: format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                resource_path.trim_start_matches('/')
            ),
            headers,
        };
    }

    if config.sendfile {
        return DeliveryPlan::Offload {
            header_name: "X-Sendfile",
            header_value: file_path.to_string_lossy().into_owned(),
            headers,
        };
    }

    DeliveryPlan::Stream {
        file_path: file_path.to_path_buf(),
        headers,
    }
}

/// Compose the denial redirect target.
///
/// Precedence: resource-level override, then the site-wide default,
/// then the site root. The reason slug rides along as an opaque query
/// parameter; the real filesystem path never appears. CR and LF are
/// stripped so a stored URL cannot smuggle extra headers.
pub fn denial_location(
    resource_redirect: Option<&str>,
    default_redirect: Option<&str>,
    site_root: &str,
    reason: DenyReason,
) -> String {
    let base = resource_redirect
        .filter(|url| !url.trim().is_empty())
        .or(default_redirect.filter(|url| !url.trim().is_empty()))
        .unwrap_or(site_root);

    let base: String = base.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{ERROR_PARAM}={}", reason.slug())
}

/// Content type by file extension, generic binary on failure.
fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        proxy: Option<ProxyFamily>,
        internal_prefix: Option<&str>,
        sendfile: bool,
    ) -> DeliveryConfig {
        DeliveryConfig {
            proxy,
            internal_prefix: internal_prefix.map(|p| p.to_string()),
            sendfile,
        }
    }

    #[test]
    fn token_access_downloads_without_caching() {
        let plan = plan(
            "2026/report.pdf",
            Path::new("/srv/uploads/2026/report.pdf"),
            AccessReason::Token,
            &config(None, None, false),
        );

        let headers = plan.headers();
        assert_eq!(headers.content_type, "application/pdf");
        assert_eq!(headers.disposition, Disposition::Attachment);
        assert_eq!(headers.cache, CachePolicy::NoStore);
        assert_eq!(headers.filename, "report.pdf");
        assert!(matches!(plan, DeliveryPlan::Stream { .. }));
    }

    #[test]
    fn public_grants_render_inline_and_cacheable() {
        for reason in [
            AccessReason::Unprotected,
            AccessReason::UnmanagedPublic,
            AccessReason::VerifiedBot,
        ] {
            let plan = plan(
                "img/logo.png",
                Path::new("/srv/uploads/img/logo.png"),
                reason,
                &config(None, None, false),
            );
            assert_eq!(plan.headers().disposition, Disposition::Inline);
            assert_eq!(plan.headers().cache, CachePolicy::Public);
        }
    }

    #[test]
    fn user_grants_cache_privately() {
        let plan = plan(
            "docs/a.txt",
            Path::new("/srv/uploads/docs/a.txt"),
            AccessReason::ResourceUserAllow,
            &config(None, None, false),
        );
        assert_eq!(plan.headers().disposition, Disposition::Inline);
        assert_eq!(plan.headers().cache, CachePolicy::Private);
    }

    #[test]
    fn nginx_offload_rewrites_under_internal_prefix() {
        let plan = plan(
            "2026/report.pdf",
            Path::new("/srv/uploads/2026/report.pdf"),
            AccessReason::Token,
            &config(Some(ProxyFamily::Nginx), Some("/protected-uploads/"), true),
        );

        match plan {
            DeliveryPlan::Offload {
                header_name,
                header_value,
                ..
            } => {
                assert_eq!(header_name, "X-Accel-Redirect");
                assert_eq!(header_value, "/protected-uploads/2026/report.pdf");
            }
            other => panic!("expected offload, got {other:?}"),
        }
    }

    #[test]
    fn litespeed_offload_uses_its_own_header() {
        let plan = plan(
            "a.bin",
            Path::new("/srv/uploads/a.bin"),
            AccessReason::Unprotected,
            &config(Some(ProxyFamily::Litespeed), Some("/internal"), false),
        );

        match plan {
            DeliveryPlan::Offload { header_name, .. } => {
                assert_eq!(header_name, "X-LiteSpeed-Location");
            }
            other => panic!("expected offload, got {other:?}"),
        }
    }

    #[test]
    fn proxy_without_prefix_falls_through_to_sendfile() {
        let plan = plan(
            "a.bin",
            Path::new("/srv/uploads/a.bin"),
            AccessReason::Unprotected,
            &config(Some(ProxyFamily::Nginx), None, true),
        );

        match plan {
            DeliveryPlan::Offload {
                header_name,
                header_value,
                ..
            } => {
                assert_eq!(header_name, "X-Sendfile");
                assert_eq!(header_value, "/srv/uploads/a.bin");
            }
            other => panic!("expected sendfile offload, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_generic_binary() {
        let plan = plan(
            "blob.xyzzy",
            Path::new("/srv/uploads/blob.xyzzy"),
            AccessReason::Unprotected,
            &config(None, None, false),
        );
        assert_eq!(plan.headers().content_type, "application/octet-stream");
    }

    #[test]
    fn denial_precedence_resource_then_default_then_root() {
        assert_eq!(
            denial_location(
                Some("https://example.com/denied"),
                Some("https://example.com/fallback"),
                "/",
                DenyReason::RestrictedDefault,
            ),
            "https://example.com/denied?mg_error=restricted_default"
        );
        assert_eq!(
            denial_location(
                None,
                Some("https://example.com/fallback"),
                "/",
                DenyReason::TokenExpired,
            ),
            "https://example.com/fallback?mg_error=token_expired"
        );
        assert_eq!(
            denial_location(None, None, "/", DenyReason::InvalidPath),
            "/?mg_error=invalid_path"
        );
    }

    #[test]
    fn denial_appends_to_existing_query() {
        assert_eq!(
            denial_location(
                Some("https://example.com/denied?page=2"),
                None,
                "/",
                DenyReason::TokenRevoked,
            ),
            "https://example.com/denied?page=2&mg_error=token_revoked"
        );
    }

    #[test]
    fn denial_strips_header_injection_characters() {
        let location = denial_location(
            Some("https://example.com/denied\r\nSet-Cookie: owned=1"),
            None,
            "/",
            DenyReason::RestrictedDefault,
        );
        assert!(!location.contains('\r'));
        assert!(!location.contains('\n'));
        assert!(location.starts_with("https://example.com/denied"));
    }

    #[test]
    fn blank_overrides_are_skipped() {
        assert_eq!(
            denial_location(Some("  "), None, "/", DenyReason::RestrictedDefault),
            "/?mg_error=restricted_default"
        );
    }
}

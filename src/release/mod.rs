//! Release metadata lookup.
//!
//! ISO builders that are not given an explicit URL and checksum ask a
//! [`ReleaseResolver`] for the download URL and checksum of the selected
//! distro release. The network-backed [`DistroResolver`] reads each
//! distro's published checksum page through a [`PageFetcher`].

mod centos;
mod debian;
mod fetch;
mod ubuntu;

pub use fetch::{CurlFetcher, PageFetcher};

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::builders::BuilderKind;

/// Checksum type used when the configuration does not name one.
pub const DEFAULT_CHECKSUM_TYPE: &str = "sha256";

/// Everything a resolver needs to locate one release ISO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery<'a> {
    pub distro: &'a str,
    pub arch: &'a str,
    pub image: &'a str,
    pub release: &'a str,
    pub base_url: &'a str,
    pub checksum_type: &'a str,
}

/// Resolved download metadata for one release ISO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub iso_url: String,
    pub checksum: String,
    pub checksum_type: String,
    /// Distro-level OS label such as `ubuntu-64`.
    pub os_type: String,
}

impl ReleaseInfo {
    /// The guest OS type value a builder kind expects, if it has one.
    pub fn guest_os_type(&self, kind: BuilderKind) -> Option<String> {
        let (distro, bits) = self.os_type.rsplit_once('-')?;
        match kind {
            BuilderKind::VmwareIso | BuilderKind::VmwareVmx => Some(self.os_type.clone()),
            BuilderKind::VirtualBoxIso | BuilderKind::VirtualBoxOvf => {
                let family = match distro {
                    "ubuntu" => "Ubuntu",
                    "centos" => "RedHat",
                    "debian" => "Debian",
                    _ => return None,
                };
                Some(format!("{family}_{bits}"))
            }
            _ => None,
        }
    }
}

/// The distro-level OS label for an architecture, e.g. `ubuntu-64`.
pub fn os_type_label(distro: &str, arch: &str) -> String {
    let bits = match arch {
        "amd64" | "x86_64" | "x64" => "64",
        "i386" | "i686" | "x86" | "x386" => "32",
        other => other,
    };
    format!("{distro}-{bits}")
}

/// Errors from release metadata lookup. All are fatal to the build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    #[error("{0}: release metadata lookup not supported")]
    UnsupportedDistro(String),

    #[error("{0}: base_url is required for release metadata lookup")]
    MissingBaseUrl(String),

    #[error("{checksum_type}: unsupported checksum type")]
    UnsupportedChecksumType { checksum_type: String },

    #[error("{url}: fetch failed: {message}")]
    Fetch { url: String, message: String },

    #[error("{url}: fetch timed out after {}s", timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    #[error("{url}: no version of release {release} listed")]
    VersionNotFound { url: String, release: String },

    #[error("{url}: no checksum found for {iso}")]
    ChecksumNotFound { url: String, iso: String },
}

/// Resolves release metadata for a distro selection.
pub trait ReleaseResolver {
    fn resolve(&self, query: &ReleaseQuery<'_>) -> Result<ReleaseInfo, ReleaseError>;
}

/// Network-backed resolver for the distros with a known mirror layout.
pub struct DistroResolver<F> {
    fetcher: F,
}

impl<F: PageFetcher> DistroResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl DistroResolver<CurlFetcher> {
    /// A resolver fetching with `curl`, bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CurlFetcher::new(timeout))
    }
}

impl<F: PageFetcher> ReleaseResolver for DistroResolver<F> {
    fn resolve(&self, query: &ReleaseQuery<'_>) -> Result<ReleaseInfo, ReleaseError> {
        tracing::info!(
            distro = query.distro,
            release = query.release,
            arch = query.arch,
            image = query.image,
            "looking up release metadata"
        );
        match query.distro {
            "ubuntu" => ubuntu::resolve(&self.fetcher, query),
            "centos" => centos::resolve(&self.fetcher, query),
            "debian" => debian::resolve(&self.fetcher, query),
            other => Err(ReleaseError::UnsupportedDistro(other.to_string())),
        }
    }
}

/// A resolver that refuses every lookup; for runs that must stay offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResolver;

impl ReleaseResolver for OfflineResolver {
    fn resolve(&self, query: &ReleaseQuery<'_>) -> Result<ReleaseInfo, ReleaseError> {
        Err(ReleaseError::Fetch {
            url: query.base_url.to_string(),
            message: "release lookups are disabled".to_string(),
        })
    }
}

/// `base` with exactly one trailing slash.
fn with_slash(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

fn require_base_url(query: &ReleaseQuery<'_>) -> Result<String, ReleaseError> {
    if query.base_url.is_empty() {
        return Err(ReleaseError::MissingBaseUrl(query.distro.to_string()));
    }
    Ok(with_slash(query.base_url))
}

/// Find `(checksum, iso name)` on a checksum page.
///
/// `iso_pattern` is a regex for the ISO file name; lines are expected to
/// read `<hex checksum> [*]<iso name>`.
fn find_checksum(page: &str, iso_pattern: &str) -> Option<(String, String)> {
    let re = regex_lite::Regex::new(&format!(
        r"(?m)^([0-9a-fA-F]+)\s+\*?({iso_pattern})\s*$"
    ))
    .ok()?;
    let caps = re.captures(page)?;
    Some((caps[1].to_lowercase(), caps[2].to_string()))
}

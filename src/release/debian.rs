//! Debian release metadata.
//!
//! The cdimage site lists one directory per full version
//! (`debian-cd/8.2.0/`) and only keeps the current point release of each
//! major version. A major-only release such as `8` is expanded to the
//! full version found on that index page. ISOs and the `<TYPE>SUMS` page
//! live under `<version>/<arch>/iso-cd/`.

use super::{
    find_checksum, os_type_label, require_base_url, PageFetcher, ReleaseError, ReleaseInfo,
    ReleaseQuery,
};

pub(super) fn resolve<F: PageFetcher>(
    fetcher: &F,
    query: &ReleaseQuery<'_>,
) -> Result<ReleaseInfo, ReleaseError> {
    let base = require_base_url(query)?;
    let version = full_version(fetcher, &base, query.release)?;

    let iso_dir = format!("{base}{version}/{}/iso-cd/", query.arch);
    let checksum_type = query.checksum_type.to_lowercase();
    let page_url = format!("{iso_dir}{}SUMS", checksum_type.to_uppercase());
    let page = fetcher.fetch(&page_url)?;

    let iso = format!("debian-{version}-{}-{}.iso", query.arch, query.image);
    let (checksum, iso) = find_checksum(&page, &regex_lite::escape(&iso)).ok_or_else(|| {
        ReleaseError::ChecksumNotFound {
            url: page_url.clone(),
            iso,
        }
    })?;

    Ok(ReleaseInfo {
        iso_url: format!("{iso_dir}{iso}"),
        checksum,
        checksum_type,
        os_type: os_type_label("debian", query.arch),
    })
}

/// `release` as `major.minor.fix`, reading the index page when only part
/// of the version is given.
fn full_version<F: PageFetcher>(
    fetcher: &F,
    base: &str,
    release: &str,
) -> Result<String, ReleaseError> {
    if release.split('.').count() == 3 {
        return Ok(release.to_string());
    }
    let page = fetcher.fetch(base)?;
    let version = version_from_index(&page, release).ok_or_else(|| {
        ReleaseError::VersionNotFound {
            url: base.to_string(),
            release: release.to_string(),
        }
    })?;
    tracing::debug!(release, version = %version, "expanded debian release");
    Ok(version)
}

/// First `href="<release>.x.y/"` directory link on an index page.
fn version_from_index(page: &str, release: &str) -> Option<String> {
    let re = regex_lite::Regex::new(&format!(
        r#"href="({}(?:\.\d+)+)/""#,
        regex_lite::escape(release)
    ))
    .ok()?;
    let found = re
        .captures_iter(page)
        .map(|caps| caps[1].to_string())
        .find(|version| version.split('.').count() == 3);
    found
}

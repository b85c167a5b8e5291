//! Ubuntu release metadata.
//!
//! Mirrors publish one directory per release holding the ISOs and a
//! `<TYPE>SUMS` checksum page. LTS point releases name their ISO with the
//! point version (`ubuntu-14.04.5-server-amd64.iso`) under the `14.04`
//! directory, so the point suffix is matched rather than required.

use super::{
    find_checksum, os_type_label, require_base_url, PageFetcher, ReleaseError, ReleaseInfo,
    ReleaseQuery,
};

pub(super) fn resolve<F: PageFetcher>(
    fetcher: &F,
    query: &ReleaseQuery<'_>,
) -> Result<ReleaseInfo, ReleaseError> {
    let release_url = format!("{}{}/", require_base_url(query)?, query.release);
    let checksum_type = query.checksum_type.to_lowercase();
    let page_url = format!("{release_url}{}SUMS", checksum_type.to_uppercase());

    let page = fetcher.fetch(&page_url)?;
    let pattern = format!(
        r"ubuntu-{}(?:\.\d+)?-{}-{}\.iso",
        regex_lite::escape(query.release),
        regex_lite::escape(query.image),
        regex_lite::escape(query.arch),
    );
    let (checksum, iso) =
        find_checksum(&page, &pattern).ok_or_else(|| ReleaseError::ChecksumNotFound {
            url: page_url.clone(),
            iso: format!("ubuntu-{}-{}-{}.iso", query.release, query.image, query.arch),
        })?;

    Ok(ReleaseInfo {
        iso_url: format!("{release_url}{iso}"),
        checksum,
        checksum_type,
        os_type: os_type_label("ubuntu", query.arch),
    })
}

//! CentOS release metadata.
//!
//! Mirrors keep ISOs under `<release>/isos/<arch>/` next to a
//! `<type>sum.txt` checksum file. ISO names carry a build stamp, e.g.
//! `CentOS-7-x86_64-Minimal-1511.iso`, so only the stable parts are matched.

use super::{
    find_checksum, os_type_label, require_base_url, PageFetcher, ReleaseError, ReleaseInfo,
    ReleaseQuery,
};

pub(super) fn resolve<F: PageFetcher>(
    fetcher: &F,
    query: &ReleaseQuery<'_>,
) -> Result<ReleaseInfo, ReleaseError> {
    let checksum_type = query.checksum_type.to_lowercase();
    let sums_file = match checksum_type.as_str() {
        "sha256" | "sha1" | "md5" => format!("{checksum_type}sum.txt"),
        _ => {
            return Err(ReleaseError::UnsupportedChecksumType {
                checksum_type: query.checksum_type.to_string(),
            })
        }
    };

    let iso_dir = format!(
        "{}{}/isos/{}/",
        require_base_url(query)?,
        query.release,
        query.arch
    );
    let page_url = format!("{iso_dir}{sums_file}");
    let page = fetcher.fetch(&page_url)?;

    let pattern = format!(
        r"CentOS-{}[^\s]*-{}-(?i:{})[^\s]*\.iso",
        regex_lite::escape(query.release),
        regex_lite::escape(query.arch),
        regex_lite::escape(query.image),
    );
    let (checksum, iso) =
        find_checksum(&page, &pattern).ok_or_else(|| ReleaseError::ChecksumNotFound {
            url: page_url.clone(),
            iso: format!("CentOS-{}-{}-{}", query.release, query.arch, query.image),
        })?;

    Ok(ReleaseInfo {
        iso_url: format!("{iso_dir}{iso}"),
        checksum,
        checksum_type,
        os_type: os_type_label("centos", query.arch),
    })
}

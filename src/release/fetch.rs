//! Page retrieval for release metadata.

use std::process::Command;
use std::time::Duration;

use super::ReleaseError;

/// curl's exit status when `--max-time` expires.
const CURL_TIMEOUT_EXIT: i32 = 28;

/// Fetches a page as text.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ReleaseError>;
}

/// Fetches with the system `curl`, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
}

impl CurlFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PageFetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<String, ReleaseError> {
        tracing::debug!(url, timeout_secs = self.timeout.as_secs(), "fetching page");
        let output = Command::new("curl")
            .args(["-fsSL", "--max-time"])
            .arg(self.timeout.as_secs().max(1).to_string())
            .arg(url)
            .output()
            .map_err(|e| ReleaseError::Fetch {
                url: url.to_string(),
                message: format!("failed to run curl: {e}"),
            })?;

        if !output.status.success() {
            if output.status.code() == Some(CURL_TIMEOUT_EXIT) {
                return Err(ReleaseError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::Fetch {
                url: url.to_string(),
                message: format!("curl failed with {}: {}", output.status, stderr.trim()),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| ReleaseError::Fetch {
            url: url.to_string(),
            message: format!("response is not UTF-8: {e}"),
        })
    }
}

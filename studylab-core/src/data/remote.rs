//! Remote sheet provider.
//!
//! Fetches worksheet rows from a spreadsheet gateway's JSON API. The gateway
//! exposes two read-only views per worksheet: `/values` (the raw cell grid)
//! and `/records` (labeled rows keyed by header). Authentication and
//! credential exchange happen upstream of this crate; the gateway only needs
//! a reachable base URL.
//!
//! Transport failures and timeouts get one bounded retry before surfacing;
//! the source is a third-party network dependency and a single transient
//! failure should not blank the report.

use std::time::Duration;

use serde::Deserialize;

use super::provider::{DataError, LabeledRow, RawGrid, SheetProvider};
use crate::domain::Stage;

/// `/values` payload: the worksheet as a positional cell grid.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    values: Option<RawGrid>,
}

/// `/records` payload: the worksheet as labeled rows.
#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Option<Vec<LabeledRow>>,
}

/// Remote spreadsheet provider over blocking HTTP.
pub struct RemoteSheetProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    document: String,
    stage2_worksheet: String,
    timeout_secs: u64,
}

impl RemoteSheetProvider {
    pub fn new(
        base_url: impl Into<String>,
        document: impl Into<String>,
        stage2_worksheet: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            document: document.into(),
            stage2_worksheet: stage2_worksheet.into(),
            timeout_secs,
        })
    }

    /// Worksheet name for a stage: the default worksheet for stage 1, the
    /// configured named worksheet for stage 2.
    fn worksheet(&self, stage: Stage) -> &str {
        match stage {
            Stage::One => "sheet1",
            Stage::Two => &self.stage2_worksheet,
        }
    }

    fn url(&self, stage: Stage, view: &str) -> String {
        format!(
            "{}/documents/{}/worksheets/{}/{view}",
            self.base_url.trim_end_matches('/'),
            self.document,
            self.worksheet(stage),
        )
    }

    /// Execute a GET with one bounded retry on transport failures.
    fn get_with_retry(&self, url: &str, stage: Stage) -> Result<reqwest::blocking::Response, DataError> {
        let mut last_error = None;

        for attempt in 0..=1 {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(500));
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::UNAUTHORIZED
                        || status == reqwest::StatusCode::FORBIDDEN
                    {
                        return Err(DataError::AccessDenied(format!(
                            "HTTP {status} for {}",
                            self.document
                        )));
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::WorksheetNotFound {
                            name: self.worksheet(stage).to_string(),
                        });
                    }
                    if !status.is_success() {
                        last_error = Some(DataError::FetchFailed(format!("HTTP {status}")));
                        continue;
                    }
                    return Ok(resp);
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(DataError::Timeout {
                        secs: self.timeout_secs,
                    });
                }
                Err(e) if e.is_connect() => {
                    last_error = Some(DataError::FetchFailed(e.to_string()));
                }
                Err(e) => return Err(DataError::FetchFailed(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::FetchFailed("retries exhausted".into())))
    }
}

impl SheetProvider for RemoteSheetProvider {
    fn name(&self) -> &str {
        "remote"
    }

    fn fetch_grid(&self, stage: Stage) -> Result<RawGrid, DataError> {
        let url = self.url(stage, "values");
        let resp = self.get_with_retry(&url, stage)?;
        let payload: ValuesResponse = resp
            .json()
            .map_err(|e| DataError::ResponseFormatChanged(format!("values payload: {e}")))?;
        Ok(payload.values.unwrap_or_default())
    }

    fn fetch_records(&self, stage: Stage) -> Result<Vec<LabeledRow>, DataError> {
        let url = self.url(stage, "records");
        let resp = self.get_with_retry(&url, stage)?;
        let payload: RecordsResponse = resp
            .json()
            .map_err(|e| DataError::ResponseFormatChanged(format!("records payload: {e}")))?;
        Ok(payload.records.unwrap_or_default())
    }
}

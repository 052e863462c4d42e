use async_trait::async_trait;
use mapprobe_core::MetricEvent;
use mapprobe_fetch::ApiRequest;
use tracing::{error, info, instrument};
use url::Url;

use super::with_token;
use crate::context::ProbeContext;
use crate::error::StepError;
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Extension of the metadata file delivered next to every asset.
const SIBLING_EXTENSION: &str = "json";

/// Downloads the prepared asset and its metadata sibling.
///
/// Both downloads are always attempted. The step fails if either fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadFilesStep;

#[async_trait]
impl ProbeStep for DownloadFilesStep {
    fn id(&self) -> StepId {
        StepId::DownloadFiles
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        session.require_import_id()?;
        let primary = session
            .download_url
            .clone()
            .ok_or(StepError::DataExtraction { field: "url" })?;
        let sibling = sibling_url(&primary, SIBLING_EXTENSION);
        let token = session.auth_token.as_deref();

        let mut failed = Vec::new();
        for url in [primary.as_str(), sibling.as_str()] {
            let file_type = file_type(url);
            let label = format!("download:{file_type}");
            info!(url = %url, file_type = %file_type, "Downloading asset");

            let outcome = ctx
                .gateway
                .call(with_token(ApiRequest::get(url).labeled(&label), token))
                .await;
            let success = outcome.is_success();
            ctx.metrics.record(MetricEvent::download(&file_type, success));

            if success {
                info!(file_type = %file_type, bytes = outcome.body().map_or(0, <[u8]>::len), "Downloaded");
            } else {
                error!(url = %url, outcome = %outcome, "Failed to download .{} file", file_type);
                ctx.metrics.record(MetricEvent::download_failure(&file_type));
                failed.push(file_type);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StepError::DownloadFailed { failed })
        }
    }
}

/// Derives the URL of a sibling file by swapping the extension of the last
/// path segment. Query and fragment are dropped.
pub fn sibling_url(url: &str, extension: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let path = swap_extension(parsed.path(), extension);
            parsed.set_path(&path);
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            swap_extension(path, extension)
        }
    }
}

/// File type of a URL: the extension of its last path segment.
pub fn file_type(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let name = path.rsplit('/').next().unwrap_or_default();
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "file".to_string(),
    }
}

fn swap_extension(path: &str, extension: &str) -> String {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    match dir {
        Some(dir) => format!("{dir}/{stem}.{extension}"),
        None => format!("{stem}.{extension}"),
    }
}

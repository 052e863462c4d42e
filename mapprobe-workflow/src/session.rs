//! Per-run session state.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::StepError;

/// Number of bbox candidates generated per session.
pub const BBOX_CANDIDATES: usize = 1;

/// Mutable state of one pipeline run.
///
/// Created fresh for every run and dropped when the run ends. Steps fill in
/// the token, the import id and the download URL as they succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Synthetic device identity, `probe-NNNN`.
    pub device_id: String,
    /// Bearer token from login.
    pub auth_token: Option<String>,
    /// Import transaction id from import-create.
    pub import_request_id: Option<String>,
    /// Candidate bounding boxes for the import request.
    pub bbox_candidates: Vec<String>,
    /// Resolved asset URL from prepare-delivery.
    pub download_url: Option<String>,
}

impl Session {
    /// Creates a session with a random device id and bbox candidates.
    pub fn generate() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    /// Creates a session from the given random source.
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let device_id = format!("probe-{}", rng.gen_range(1000..=9999));
        let bbox_candidates = (0..BBOX_CANDIDATES).map(|_| random_bbox(rng)).collect();

        Self {
            device_id,
            auth_token: None,
            import_request_id: None,
            bbox_candidates,
            download_url: None,
        }
    }

    /// Picks one bbox candidate at random.
    pub fn pick_bbox<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.bbox_candidates.choose(rng).map(String::as_str)
    }

    /// The bearer token, required for authenticated calls.
    ///
    /// # Errors
    ///
    /// Fails if login has not stored a token.
    pub fn require_token(&self) -> Result<&str, StepError> {
        self.auth_token
            .as_deref()
            .ok_or(StepError::DataExtraction {
                field: "accessToken",
            })
    }

    /// The import request id, required from the first status update on.
    ///
    /// # Errors
    ///
    /// Fails with [`StepError::MissingImportId`] before import-create has
    /// succeeded.
    pub fn require_import_id(&self) -> Result<&str, StepError> {
        self.import_request_id
            .as_deref()
            .ok_or(StepError::MissingImportId)
    }
}

/// Builds one bbox from the fixed template with two random trailing digits
/// per coordinate.
fn random_bbox<R: Rng + ?Sized>(rng: &mut R) -> String {
    let d: [u8; 4] = std::array::from_fn(|_| rng.gen_range(0..100));
    format!(
        "34.472849{:02},31.519675{:02},34.476277{:02},31.522433{:02}",
        d[0], d[1], d[2], d[3]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_identity() {
        let session = Session::with_rng(&mut StdRng::seed_from_u64(7));

        let digits = session.device_id.strip_prefix("probe-").unwrap();
        assert_eq!(digits.len(), 4);
        let n: u32 = digits.parse().unwrap();
        assert!((1000..=9999).contains(&n));

        assert!(session.auth_token.is_none());
        assert!(session.import_request_id.is_none());
        assert_eq!(session.bbox_candidates.len(), BBOX_CANDIDATES);
    }

    #[test]
    fn test_bbox_shape() {
        let session = Session::generate();
        let bbox = &session.bbox_candidates[0];
        let parts: Vec<&str> = bbox.split(',').collect();

        assert_eq!(parts.len(), 4);
        for (part, prefix) in parts
            .iter()
            .zip(["34.472849", "31.519675", "34.476277", "31.522433"])
        {
            assert!(part.starts_with(prefix));
            assert_eq!(part.len(), prefix.len() + 2);
            assert!(part.parse::<f64>().is_ok());
        }
    }

    #[test]
    fn test_pick_bbox() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = Session::with_rng(&mut rng);
        assert_eq!(
            session.pick_bbox(&mut rng),
            Some(session.bbox_candidates[0].as_str())
        );
    }

    #[test]
    fn test_requirements() {
        let mut session = Session::generate();
        assert!(matches!(
            session.require_import_id(),
            Err(StepError::MissingImportId)
        ));
        assert!(matches!(
            session.require_token(),
            Err(StepError::DataExtraction { field: "accessToken" })
        ));

        session.import_request_id = Some("abc123".into());
        session.auth_token = Some("t".into());
        assert_eq!(session.require_import_id().unwrap(), "abc123");
        assert_eq!(session.require_token().unwrap(), "t");
    }
}

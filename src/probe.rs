use crate::credential::SessionCredential;
use crate::identity::{IdentityError, IdentityService};
use crate::models::IdentitySnapshot;

/// probe
///
/// Asks the identity service who the credential belongs to and always settles on a
/// snapshot. Rejections, transport failures and unrecognizable payloads all resolve to the
/// anonymous snapshot: an unreachable identity service and a logged-out actor look the same
/// to the UI. Nothing is retried.
pub async fn probe(
    service: &dyn IdentityService,
    credential: &SessionCredential,
) -> IdentitySnapshot {
    match service.fetch_identity(credential).await {
        Ok(payload) if payload.name.trim().is_empty() => {
            tracing::warn!("identity payload carried a blank display name; treating as anonymous");
            IdentitySnapshot::anonymous()
        }
        Ok(payload) => {
            let snapshot = IdentitySnapshot::from(payload);
            tracing::debug!(role = ?snapshot.role(), "probe resolved to an authenticated actor");
            snapshot
        }
        Err(IdentityError::Rejected(status)) => {
            tracing::debug!(%status, "probe rejected; actor is anonymous");
            IdentitySnapshot::anonymous()
        }
        Err(e) => {
            tracing::warn!(error = %e, "probe failed; actor is treated as anonymous");
            IdentitySnapshot::anonymous()
        }
    }
}

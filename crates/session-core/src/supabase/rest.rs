use async_trait::async_trait;
use folio_types::{ContactMessage, ContactMessageDraft, RoleRecord};
use tracing::{debug, info};

use super::{SupabaseClient, check};
use crate::{
    error::{SessionError, SessionResult}, provider::RoleLookup
};

#[async_trait]
impl RoleLookup for SupabaseClient {
    async fn fetch_role(&self, identity_id: &str) -> SessionResult<Option<RoleRecord>> {
        let mut url = self.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("select", "is_admin")
            .append_pair("id", &format!("eq.{identity_id}"));
        let token = self.access_token().await;
        let resp = self.authorize(self.http.get(url), token.as_deref()).send().await?;
        let rows: Vec<RoleRecord> = check(resp).await?.json().await?;
        debug!(identity = %identity_id, rows = rows.len(), "profiles lookup");
        Ok(rows.into_iter().next())
    }
}

impl SupabaseClient {
    /// Store a visitor message. No session is needed; the draft is validated
    /// as typed, then trimmed before it is sent.
    pub async fn submit_contact_message(&self, draft: &ContactMessageDraft) -> SessionResult<ContactMessage> {
        let errors = draft.validate();
        if let Some((field, error)) = errors.into_iter().min_by(|a, b| a.0.cmp(&b.0)) {
            return Err(SessionError::Validation { field, error });
        }
        let draft = draft.normalized();

        let url = self.endpoint("rest/v1/contact_messages")?;
        let resp = self
            .authorize(self.http.post(url), None)
            .header("Prefer", "return=representation")
            .json(&[&draft])
            .send()
            .await?;
        let status = resp.status().as_u16();
        let rows: Vec<ContactMessage> = check(resp).await?.json().await?;
        let stored = rows
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::backend(status, "insert returned no rows"))?;
        info!(message = %stored.id, "contact message stored");
        Ok(stored)
    }
}

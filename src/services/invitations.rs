// Invitation lifecycle: created -> valid -> consumed. Validation and
// consumption collapse every failure cause (missing, used, expired) into a
// single opaque rejection so a caller cannot probe token state.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Invitation, Principal, Role, User, Workspace};
use crate::store::EntityStore;

const INVITATION_TTL_DAYS: i64 = 7;
const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct InvitationService {
    store: EntityStore,
    public_url: String,
}

#[derive(Debug)]
pub struct CreatedInvitation {
    pub signup_link: String,
    pub expires_at: DateTime<Utc>,
}

impl InvitationService {
    pub fn new(store: EntityStore, public_url: String) -> Self {
        Self { store, public_url }
    }

    /// Only teachers may invite members into a workspace.
    fn can_invite_members(&self, principal: Principal) -> bool {
        principal.is_teacher()
    }

    pub async fn create(
        &self,
        workspace_id: Uuid,
        allowed_role: Role,
        principal: Principal,
    ) -> AppResult<CreatedInvitation> {
        if !self.can_invite_members(principal) {
            return Err(AppError::Forbidden(
                "Only teachers can create invitations".to_string(),
            ));
        }

        let invitation = Invitation {
            id: Uuid::new_v4(),
            workspace_id,
            created_by: principal.id,
            token: generate_token(),
            expires_at: Utc::now() + Duration::days(INVITATION_TTL_DAYS),
            is_used: false,
            used_by: None,
            used_at: None,
            allowed_role,
        };

        self.store.insert(&invitation).await?;

        info!(workspace_id = %workspace_id, invitation_id = %invitation.id, "invitation created");
        Ok(CreatedInvitation {
            signup_link: format!("{}/signup?token={}", self.public_url, invitation.token),
            expires_at: invitation.expires_at,
        })
    }

    /// Read-only check. Returns the workspace the token grants entry to.
    pub async fn validate(&self, token: &str) -> AppResult<(Workspace, DateTime<Utc>)> {
        let invitation = self.find_valid(token).await?;

        let workspace: Workspace = self
            .store
            .find_by_id(invitation.workspace_id)
            .await?
            .ok_or_else(invalid)?;

        Ok((workspace, invitation.expires_at))
    }

    /// Consumes the token: workspace membership and the used markers commit
    /// in the same transaction, so a failed membership write leaves the
    /// invitation unconsumed.
    pub async fn use_invitation(&self, token: &str, principal: Principal) -> AppResult<()> {
        let invitation = self.find_valid(token).await?;

        if principal.role != invitation.allowed_role {
            return Err(AppError::Conflict(format!(
                "Invitation is restricted to role '{}', but the user has role '{}'",
                invitation.allowed_role.as_str(),
                principal.role.as_str()
            )));
        }

        let mut tx = self.store.begin().await?;

        // Re-check inside the transaction: a concurrent consumer may have
        // spent the token between the lookup above and this point.
        let mut invitation: Invitation = match tx.find_by_id::<Invitation>(invitation.id).await? {
            Some(inv) if !inv.is_used && Utc::now() < inv.expires_at => inv,
            _ => {
                tx.rollback().await?;
                return Err(invalid());
            }
        };

        let mut user: User = match tx.find_by_id(principal.id).await? {
            Some(user) => user,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound("User not found".to_string()));
            }
        };

        // Set union: re-joining an already-joined workspace is a no-op.
        user.workspaces.insert(invitation.workspace_id);
        tx.update_by_id(&user).await?;

        invitation.is_used = true;
        invitation.used_by = Some(principal.id);
        invitation.used_at = Some(Utc::now());
        // Guarded write: is_used flips false -> true exactly once even if
        // another connection slipped past the re-check.
        if !tx.update_by_id_if_flag(&invitation, "$.is_used", false).await? {
            tx.rollback().await?;
            return Err(invalid());
        }

        tx.commit().await?;

        info!(invitation_id = %invitation.id, user_id = %principal.id, "invitation consumed");
        Ok(())
    }

    /// Forces the expiry into the past; the token then fails validation
    /// through the ordinary path.
    pub async fn deactivate(&self, invitation_id: Uuid, principal: Principal) -> AppResult<()> {
        if !self.can_invite_members(principal) {
            return Err(AppError::Forbidden(
                "Only teachers can deactivate invitations".to_string(),
            ));
        }

        let mut invitation: Invitation = self
            .store
            .find_by_id(invitation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invitation {} not found", invitation_id)))?;

        invitation.expires_at = Utc::now() - Duration::seconds(1);
        self.store.update_by_id(&invitation).await?;
        Ok(())
    }

    pub async fn delete(&self, invitation_id: Uuid, principal: Principal) -> AppResult<()> {
        if !self.can_invite_members(principal) {
            return Err(AppError::Forbidden(
                "Only teachers can delete invitations".to_string(),
            ));
        }

        if !self.store.delete_by_id::<Invitation>(invitation_id).await? {
            return Err(AppError::NotFound(format!("Invitation {} not found", invitation_id)));
        }
        Ok(())
    }

    async fn find_valid(&self, token: &str) -> AppResult<Invitation> {
        let invitation: Invitation = self
            .store
            .find_one_by_field("$.token", token)
            .await?
            .ok_or_else(invalid)?;

        if invitation.is_used || Utc::now() >= invitation.expires_at {
            return Err(invalid());
        }

        Ok(invitation)
    }
}

fn invalid() -> AppError {
    AppError::Validation("Invalid or expired invitation".to_string())
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

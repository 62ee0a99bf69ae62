// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User records, conversation state writes, and privilege changes.

use std::sync::Arc;

use ticketbot_core::types::User;
use ticketbot_core::{ConversationState, Role, StorageAdapter, TicketbotError};
use tracing::{debug, info};

/// Identity and privilege operations over storage.
///
/// Methods taking `&mut User` persist the change and then mirror it on the
/// in-memory record so a handler keeps working with current values.
#[derive(Clone)]
pub struct Identity {
    storage: Arc<dyn StorageAdapter>,
}

impl Identity {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    pub async fn get_or_create(&self, id: i64) -> Result<User, TicketbotError> {
        self.storage.get_or_create_user(id).await
    }

    pub async fn set_state(
        &self,
        user: &mut User,
        state: ConversationState,
    ) -> Result<(), TicketbotError> {
        self.storage.set_user_state(user.id, &state).await?;
        debug!(user_id = user.id, from = %user.state, to = %state, "state transition");
        user.state = state;
        Ok(())
    }

    pub async fn set_role(&self, user: &mut User, role: Role) -> Result<(), TicketbotError> {
        self.storage.set_user_role(user.id, role).await?;
        info!(
            user_id = user.id,
            bitmask = role.to_bitmask(),
            "role changed"
        );
        user.role = role;
        Ok(())
    }

    /// Grants full admin rights and returns the user to the main menu.
    pub async fn grant_admin(&self, user: &mut User) -> Result<(), TicketbotError> {
        self.set_state(user, ConversationState::Idle).await?;
        self.set_role(user, Role::ADMIN).await
    }

    /// Switches an admin into preview mode. Non-admins are left alone.
    pub async fn enter_preview(&self, user: &mut User) -> Result<(), TicketbotError> {
        if !user.is_admin() {
            return Ok(());
        }
        self.set_role(user, Role::Admin { previewing: true }).await
    }

    /// Drops every privilege.
    pub async fn revoke(&self, user: &mut User) -> Result<(), TicketbotError> {
        self.set_role(user, Role::Regular).await
    }

    /// Turns preview mode off for an admin. Returns true when it was on.
    pub async fn ensure_effective_admin(&self, user: &mut User) -> Result<bool, TicketbotError> {
        if !user.role.is_previewing() {
            return Ok(false);
        }
        self.set_role(user, Role::ADMIN).await?;
        Ok(true)
    }

    pub async fn list_admins(&self) -> Result<Vec<User>, TicketbotError> {
        self.storage.list_admins().await
    }
}

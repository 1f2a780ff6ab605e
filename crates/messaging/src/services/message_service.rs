//! Message service: creation, mutation, and participant-scoped listings.

use std::time::Duration;

use sqlx::SqlitePool;
use threadline_config::ServiceConfig;
use threadline_database::{
    ConversationRepository, CoreError, CoreResult, MessageRepository, ParticipantRepository,
};
use tracing::warn;

use crate::query::{self, FieldSchema, ListParams, Page, PageLimits};
use crate::services::with_deadline;
use crate::types::{Identity, MessageView};
use crate::utils::{AccessPolicy, Validator};

const MESSAGE_SCHEMA: FieldSchema = FieldSchema {
    filterable: &["conversation", "sender", "sent_at"],
    searchable: &["body", "sender_name"],
    orderable: &["sent_at"],
    default_order: "sent_at",
};

/// Service for message operations, scoped to the acting identity's
/// conversations.
pub struct MessageService {
    messages: MessageRepository,
    conversations: ConversationRepository,
    participants: ParticipantRepository,
    timeout: Duration,
    limits: PageLimits,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(pool: SqlitePool, config: &ServiceConfig) -> Self {
        Self {
            messages: MessageRepository::new(pool.clone()),
            conversations: ConversationRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool),
            timeout: Duration::from_secs(config.operation_timeout_seconds),
            limits: PageLimits {
                default_size: config.default_page_size,
                max_size: config.max_page_size,
            },
        }
    }

    /// All messages across every conversation the identity participates in,
    /// newest first, with the full filter/search/order/paginate contract.
    pub async fn list(
        &self,
        identity: &Identity,
        params: &ListParams,
    ) -> CoreResult<Page<MessageView>> {
        let records = with_deadline(
            self.timeout,
            self.messages.records_visible_to_user(identity.user_id()),
        )
        .await?;

        let views: Vec<MessageView> = records.into_iter().map(MessageView::from).collect();
        query::shape(views, &MESSAGE_SCHEMA, params, &self.limits)
    }

    /// Send a message to a conversation the identity participates in.
    pub async fn create(
        &self,
        identity: &Identity,
        conversation_id: &str,
        body: &str,
    ) -> CoreResult<MessageView> {
        let conversation = with_deadline(
            self.timeout,
            self.conversations.find_by_public_id(conversation_id),
        )
        .await?
        .ok_or_else(|| CoreError::forbidden("not a participant of this conversation"))?;

        let members =
            with_deadline(self.timeout, self.participants.participant_ids(conversation.id))
                .await?;
        if !AccessPolicy::is_member(identity, &members) {
            warn!(
                conversation_id = conversation_id,
                user_id = identity.user_id(),
                "denied message create for non-participant"
            );
            return Err(CoreError::forbidden("not a participant of this conversation"));
        }

        Validator::message_body(body)?;

        let message = with_deadline(
            self.timeout,
            self.messages.create(conversation.id, identity.user_id(), body),
        )
        .await?;

        let record =
            with_deadline(self.timeout, self.messages.record_by_public_id(&message.public_id))
                .await?
                .ok_or_else(|| CoreError::infrastructure("created message vanished"))?;

        Ok(MessageView::from(record))
    }

    /// Update a message body. Only the sender may do this.
    pub async fn update(
        &self,
        identity: &Identity,
        message_id: &str,
        new_body: &str,
    ) -> CoreResult<MessageView> {
        let message =
            with_deadline(self.timeout, self.messages.find_by_public_id(message_id))
                .await?
                .ok_or_else(|| CoreError::not_found_or_forbidden("message"))?;

        if !AccessPolicy::is_sender(identity, &message) {
            warn!(
                message_id = message_id,
                user_id = identity.user_id(),
                "denied message update for non-sender"
            );
            return Err(CoreError::forbidden("you can only update your own messages"));
        }

        Validator::message_body(new_body)?;

        with_deadline(self.timeout, self.messages.update_body(message_id, new_body)).await?;

        let record = with_deadline(self.timeout, self.messages.record_by_public_id(message_id))
            .await?
            .ok_or_else(|| CoreError::not_found_or_forbidden("message"))?;

        Ok(MessageView::from(record))
    }

    /// Permanently delete a message. Only the sender may do this.
    pub async fn delete(&self, identity: &Identity, message_id: &str) -> CoreResult<()> {
        let message =
            with_deadline(self.timeout, self.messages.find_by_public_id(message_id))
                .await?
                .ok_or_else(|| CoreError::not_found_or_forbidden("message"))?;

        if !AccessPolicy::is_sender(identity, &message) {
            warn!(
                message_id = message_id,
                user_id = identity.user_id(),
                "denied message delete for non-sender"
            );
            return Err(CoreError::forbidden("you can only delete your own messages"));
        }

        with_deadline(self.timeout, self.messages.delete(message_id)).await
    }

    /// Delete every listed message that the identity authored inside one of
    /// its conversations. Ineligible ids are skipped, not errored. Returns the
    /// count actually deleted.
    pub async fn bulk_delete(
        &self,
        identity: &Identity,
        message_ids: &[String],
    ) -> CoreResult<u64> {
        with_deadline(
            self.timeout,
            self.messages.bulk_delete(identity.user_id(), message_ids),
        )
        .await
    }

    /// Paginated messages of a single conversation, newest first.
    pub async fn by_conversation(
        &self,
        identity: &Identity,
        conversation_id: &str,
        params: &ListParams,
    ) -> CoreResult<Page<MessageView>> {
        let conversation = with_deadline(
            self.timeout,
            self.conversations.find_by_public_id(conversation_id),
        )
        .await?
        .ok_or_else(|| CoreError::forbidden("not a participant of this conversation"))?;

        let members =
            with_deadline(self.timeout, self.participants.participant_ids(conversation.id))
                .await?;
        if !AccessPolicy::is_member(identity, &members) {
            return Err(CoreError::forbidden("not a participant of this conversation"));
        }

        let records = with_deadline(
            self.timeout,
            self.messages.records_for_conversation(conversation.id),
        )
        .await?;

        let views: Vec<MessageView> = records.into_iter().map(MessageView::from).collect();
        query::shape(views, &MESSAGE_SCHEMA, params, &self.limits)
    }

    /// Up to `min(limit, 100)` newest messages across the identity's
    /// conversations; `limit` defaults to 20.
    pub async fn recent(
        &self,
        identity: &Identity,
        limit: Option<u32>,
    ) -> CoreResult<Vec<MessageView>> {
        let limit = Validator::recent_limit(limit)?;

        let records = with_deadline(
            self.timeout,
            self.messages.records_visible_to_user(identity.user_id()),
        )
        .await?;

        Ok(records
            .into_iter()
            .take(limit as usize)
            .map(MessageView::from)
            .collect())
    }
}

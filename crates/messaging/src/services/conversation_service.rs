//! Conversation service: creation, membership, and participant-scoped
//! listings. Every operation resolves the conversation through the acting
//! identity's participation, so a conversation the identity does not belong
//! to is indistinguishable from one that does not exist.

use std::collections::HashSet;
use std::time::Duration;

use sqlx::SqlitePool;
use threadline_config::ServiceConfig;
use threadline_database::{
    Conversation, ConversationRepository, CoreError, CoreResult, CreateConversationRequest,
    MessageRepository, ParticipantRepository, UserRepository,
};
use tracing::warn;

use crate::query::{self, FieldSchema, ListParams, Page, PageLimits};
use crate::services::{with_deadline, MessageService};
use crate::types::{
    ConversationDetail, ConversationOverview, Identity, MessageView, UserSummary,
};
use crate::utils::{AccessPolicy, Validator};

const CONVERSATION_SCHEMA: FieldSchema = FieldSchema {
    filterable: &["created_at"],
    searchable: &["participants"],
    orderable: &["created_at"],
    default_order: "created_at",
};

const USER_SEARCH_LIMIT: u32 = 10;

/// Service for conversation operations, scoped to the acting identity's
/// participation.
pub struct ConversationService {
    conversations: ConversationRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    message_records: MessageRepository,
    messages: MessageService,
    timeout: Duration,
    limits: PageLimits,
}

impl ConversationService {
    /// Create a new conversation service instance
    pub fn new(pool: SqlitePool, config: &ServiceConfig) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            message_records: MessageRepository::new(pool.clone()),
            messages: MessageService::new(pool, config),
            timeout: Duration::from_secs(config.operation_timeout_seconds),
            limits: PageLimits {
                default_size: config.default_page_size,
                max_size: config.max_page_size,
            },
        }
    }

    /// Resolve a conversation the identity participates in. A missing
    /// conversation and one the identity does not belong to produce the same
    /// error, so existence never leaks.
    async fn authorized(
        &self,
        identity: &Identity,
        conversation_id: &str,
    ) -> CoreResult<Conversation> {
        let conversation = with_deadline(
            self.timeout,
            self.conversations.find_by_public_id(conversation_id),
        )
        .await?
        .ok_or_else(|| CoreError::not_found_or_forbidden("conversation"))?;

        let members =
            with_deadline(self.timeout, self.participants.participant_ids(conversation.id))
                .await?;
        if !AccessPolicy::is_member(identity, &members) {
            warn!(
                conversation_id = conversation_id,
                user_id = identity.user_id(),
                "denied conversation access for non-participant"
            );
            return Err(CoreError::not_found_or_forbidden("conversation"));
        }

        Ok(conversation)
    }

    /// Assemble the full detail view: participants plus all messages, newest
    /// first.
    async fn detail(&self, conversation: &Conversation) -> CoreResult<ConversationDetail> {
        let participants = with_deadline(
            self.timeout,
            self.participants.find_users_by_conversation(conversation.id),
        )
        .await?;

        let records = with_deadline(
            self.timeout,
            self.message_records.records_for_conversation(conversation.id),
        )
        .await?;

        Ok(ConversationDetail {
            id: conversation.public_id.clone(),
            created_at: conversation.created_at.clone(),
            participants: participants.into_iter().map(UserSummary::from).collect(),
            messages: records.into_iter().map(MessageView::from).collect(),
        })
    }

    /// All conversations the identity participates in, newest first, with the
    /// full filter/search/order/paginate contract.
    pub async fn list(
        &self,
        identity: &Identity,
        params: &ListParams,
    ) -> CoreResult<Page<ConversationOverview>> {
        let conversations =
            with_deadline(self.timeout, self.conversations.find_by_user_id(identity.user_id()))
                .await?;

        let mut overviews = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            let participants = with_deadline(
                self.timeout,
                self.participants.find_users_by_conversation(conversation.id),
            )
            .await?;

            overviews.push(ConversationOverview {
                id: conversation.public_id.clone(),
                created_at: conversation.created_at.clone(),
                participants: participants.into_iter().map(UserSummary::from).collect(),
            });
        }

        query::shape(overviews, &CONVERSATION_SCHEMA, params, &self.limits)
    }

    /// Create a conversation. The identity is always enrolled as a
    /// participant, whether or not it lists itself, and the result must hold
    /// at least two distinct participants.
    pub async fn create(
        &self,
        identity: &Identity,
        request: &CreateConversationRequest,
    ) -> CoreResult<ConversationDetail> {
        request.validate().map_err(CoreError::validation)?;

        if let Some(body) = request.initial_message.as_deref() {
            Validator::message_body(body)?;
        }

        let mut seen = HashSet::new();
        let requested: Vec<String> = request
            .participant_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let resolved =
            with_deadline(self.timeout, self.users.find_by_public_ids(&requested)).await?;
        if resolved.len() != requested.len() {
            return Err(CoreError::validation("one or more participants do not exist"));
        }

        let mut participant_ids: Vec<i64> = resolved.iter().map(|user| user.id).collect();
        if !participant_ids.contains(&identity.user_id()) {
            participant_ids.push(identity.user_id());
        }

        if participant_ids.len() < 2 {
            return Err(CoreError::validation(
                "a conversation needs at least 2 participants",
            ));
        }

        let conversation = with_deadline(
            self.timeout,
            self.conversations.create_with_participants(
                identity.user_id(),
                &participant_ids,
                request.initial_message.as_deref(),
            ),
        )
        .await?;

        self.detail(&conversation).await
    }

    /// A single conversation the identity participates in, with participants
    /// and messages.
    pub async fn retrieve(
        &self,
        identity: &Identity,
        conversation_id: &str,
    ) -> CoreResult<ConversationDetail> {
        let conversation = self.authorized(identity, conversation_id).await?;
        self.detail(&conversation).await
    }

    /// Add users to a conversation the identity participates in. Adding an
    /// existing participant is a no-op, not an error.
    pub async fn add_participants(
        &self,
        identity: &Identity,
        conversation_id: &str,
        user_ids: &[String],
    ) -> CoreResult<ConversationDetail> {
        let conversation = self.authorized(identity, conversation_id).await?;

        if user_ids.is_empty() {
            return Err(CoreError::validation("user_ids must not be empty"));
        }

        let resolved = with_deadline(self.timeout, self.users.find_by_public_ids(user_ids)).await?;
        let unique: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
        if resolved.len() != unique.len() {
            return Err(CoreError::validation("one or more users do not exist"));
        }

        let ids: Vec<i64> = resolved.iter().map(|user| user.id).collect();
        with_deadline(self.timeout, self.participants.add_many(conversation.id, &ids)).await?;

        self.detail(&conversation).await
    }

    /// Remove users from a conversation the identity participates in. The
    /// identity cannot remove itself, and the conversation must keep at least
    /// two participants.
    pub async fn remove_participants(
        &self,
        identity: &Identity,
        conversation_id: &str,
        user_ids: &[String],
    ) -> CoreResult<ConversationDetail> {
        let conversation = self.authorized(identity, conversation_id).await?;

        if user_ids.is_empty() {
            return Err(CoreError::validation("user_ids must not be empty"));
        }

        let resolved = with_deadline(self.timeout, self.users.find_by_public_ids(user_ids)).await?;
        let unique: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
        if resolved.len() != unique.len() {
            return Err(CoreError::validation("one or more users do not exist"));
        }

        if resolved.iter().any(|user| user.id == identity.user_id()) {
            warn!(
                conversation_id = conversation_id,
                user_id = identity.user_id(),
                "denied self-removal from conversation"
            );
            return Err(CoreError::invalid_operation(
                "you cannot remove yourself from a conversation",
            ));
        }

        let ids: Vec<i64> = resolved.iter().map(|user| user.id).collect();
        with_deadline(self.timeout, self.participants.remove_many(conversation.id, &ids))
            .await?;

        self.detail(&conversation).await
    }

    /// Paginated messages of a conversation the identity participates in.
    pub async fn list_messages(
        &self,
        identity: &Identity,
        conversation_id: &str,
        params: &ListParams,
    ) -> CoreResult<Page<MessageView>> {
        self.authorized(identity, conversation_id).await?;
        self.messages.by_conversation(identity, conversation_id, params).await
    }

    /// Find users to start a conversation with. Case-insensitive substring
    /// match on name, email, and handle; the identity itself is never
    /// returned; at most ten results.
    pub async fn search_users(
        &self,
        identity: &Identity,
        query: &str,
    ) -> CoreResult<Vec<UserSummary>> {
        Validator::search_query(query)?;

        let users = with_deadline(
            self.timeout,
            self.users.search(query, identity.user_id(), USER_SEARCH_LIMIT),
        )
        .await?;

        Ok(users.into_iter().map(UserSummary::from).collect())
    }
}

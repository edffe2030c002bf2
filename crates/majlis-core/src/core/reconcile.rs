//! Merges fetched message batches into per-conversation ordered logs.
//!
//! The merge rules are what make overlapping poll cycles safe: messages
//! deduplicate by id, `last_message` never regresses, unread counts are
//! overwritten per cycle, and title/avatar metadata is sticky. Applying the
//! same cycle twice, or two cycles in either completion order, converges to
//! the same conversation set.

use std::collections::{HashMap, HashSet};

use crate::api::ConversationDto;
use crate::config::DefaultAssets;
use crate::state::{
    ChatMessage, Conversation, DeliveryState, MessageId, Participant, UNKNOWN_TITLE, UNNAMED_GROUP,
};

/// Metadata-only conversation listing entry, normalized from the header
/// fetch. Distinct from the message-bearing feeds.
#[derive(Debug, Clone)]
pub(crate) struct ConversationHeader {
    pub id: u64,
    pub title: Option<String>,
    pub participants: Vec<Participant>,
    pub is_group: bool,
    pub avatar_url: Option<String>,
}

pub(crate) fn normalize_header(dto: ConversationDto) -> ConversationHeader {
    let participants: Vec<Participant> = dto
        .participants
        .into_iter()
        .filter_map(|p| {
            Some(Participant {
                id: p.id?,
                first_name: p.first_name.unwrap_or_default(),
                last_name: p.last_name,
                avatar_url: p.profile_picture.filter(|u| !u.is_empty()),
            })
        })
        .collect();
    // Servers that omit the flag still imply a group by participant count.
    let is_group = dto.is_group.unwrap_or(participants.len() > 2);
    let avatar_url = dto
        .profile_picture
        .filter(|u| !u.is_empty())
        .or_else(|| {
            if is_group {
                dto.group_picture_file.filter(|u| !u.is_empty())
            } else {
                None
            }
        });
    ConversationHeader {
        id: dto.id,
        title: dto.title.filter(|t| !t.trim().is_empty()),
        participants,
        is_group,
        avatar_url,
    }
}

pub(crate) fn header_map(dtos: Vec<ConversationDto>) -> HashMap<u64, ConversationHeader> {
    dtos.into_iter()
        .map(normalize_header)
        .map(|h| (h.id, h))
        .collect()
}

/// Cross-references the unread feed against the full feed: matching ids are
/// flagged unread in place, unread-only entries are unioned in, and the
/// per-conversation unread counts (authoritative for this cycle) come from
/// the unread feed alone.
pub(crate) fn overlay_unread(
    mut all: Vec<ChatMessage>,
    unread: Vec<ChatMessage>,
) -> (Vec<ChatMessage>, HashMap<u64, u32>) {
    let mut counts: HashMap<u64, u32> = HashMap::new();
    for m in &unread {
        *counts.entry(m.conversation_id).or_insert(0) += 1;
    }

    let unread_ids: HashSet<&MessageId> = unread.iter().map(|m| &m.id).collect();
    for m in &mut all {
        if unread_ids.contains(&m.id) {
            m.is_read = false;
        }
    }

    let present: HashSet<MessageId> = all.iter().map(|m| m.id.clone()).collect();
    all.extend(unread.into_iter().filter(|m| !present.contains(&m.id)));

    (all, counts)
}

/// One reconciliation pass: fold the merged message batch into the previous
/// conversation list, seeding records for newly-discovered conversations
/// from the header batch (or, as a last resort, the message sender).
/// Conversations the batch does not touch are carried over unchanged.
pub(crate) fn reconcile_cycle(
    prev: Vec<Conversation>,
    headers: &HashMap<u64, ConversationHeader>,
    merged: Vec<ChatMessage>,
    unread_counts: &HashMap<u64, u32>,
    me: u64,
    assets: &DefaultAssets,
) -> Vec<Conversation> {
    let mut list = prev;
    let mut touched: HashSet<u64> = HashSet::new();

    for m in merged {
        let conv_id = m.conversation_id;
        if !list.iter().any(|c| c.id == conv_id) {
            list.push(seed_conversation(conv_id, headers.get(&conv_id), &m));
        }
        let conv = list
            .iter_mut()
            .find(|c| c.id == conv_id)
            .expect("conversation just ensured");
        touched.insert(conv_id);

        // Sticky metadata: a later header may fill gaps but never blanks a
        // known title or avatar.
        if let Some(h) = headers.get(&conv_id) {
            if conv.canonical_title.is_none() {
                conv.canonical_title = h.title.clone();
            }
            if conv.avatar_url.is_none() {
                conv.avatar_url = h.avatar_url.clone();
            }
            if !h.participants.is_empty() {
                conv.participants = h.participants.clone();
            }
            conv.is_group = h.is_group;
        }

        match conv.messages.iter_mut().find(|x| x.id == m.id) {
            // Redelivered id: this cycle is authoritative for the read flag,
            // and a server echo confirms delivery. Nothing else is rewritten.
            Some(existing) => {
                existing.is_read = m.is_read;
                existing.delivery = DeliveryState::Sent;
            }
            None => conv.messages.push(m),
        }
    }

    for conv in list.iter_mut().filter(|c| touched.contains(&c.id)) {
        conv.messages.sort_by_key(|m| m.sent_at);
        conv.last_message = conv.messages.last().cloned();
        conv.unread_count = unread_counts.get(&conv.id).copied().unwrap_or(0);
        resolve_presentation(conv, me, assets);
    }

    sort_conversations(&mut list);
    list
}

fn seed_conversation(
    id: u64,
    header: Option<&ConversationHeader>,
    first_message: &ChatMessage,
) -> Conversation {
    let (canonical_title, participants, is_group, avatar_url) = match header {
        Some(h) => (
            h.title.clone(),
            h.participants.clone(),
            h.is_group,
            h.avatar_url.clone(),
        ),
        // Discovered through the message feed alone: all we know is the
        // sender, which is enough for a 1:1 fallback title.
        None => (
            None,
            vec![Participant {
                id: first_message.sender_id.unwrap_or_default(),
                first_name: first_message.sender_display_name.clone(),
                last_name: None,
                avatar_url: Some(first_message.sender_avatar_url.clone()),
            }],
            false,
            None,
        ),
    };
    Conversation {
        id,
        canonical_title,
        display_title: String::new(),
        participants,
        is_group,
        avatar_url,
        display_avatar_url: String::new(),
        messages: vec![],
        last_message: None,
        unread_count: 0,
    }
}

/// Recomputes the displayed title and avatar from the sticky sources. Shared
/// by every writer that touches a conversation so the views never diverge.
pub(crate) fn resolve_presentation(conv: &mut Conversation, me: u64, assets: &DefaultAssets) {
    conv.display_title = conv
        .canonical_title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            if conv.is_group {
                UNNAMED_GROUP.to_string()
            } else {
                let others: Vec<String> = conv
                    .participants
                    .iter()
                    .filter(|p| p.id != me)
                    .map(Participant::full_name)
                    .filter(|n| !n.trim().is_empty())
                    .collect();
                if others.is_empty() {
                    UNKNOWN_TITLE.to_string()
                } else {
                    others.join(", ")
                }
            }
        });

    conv.display_avatar_url = conv
        .avatar_url
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| {
            if conv.is_group {
                None
            } else {
                conv.participants
                    .iter()
                    .find(|p| p.id != me)
                    .and_then(|p| p.avatar_url.clone())
            }
        })
        .unwrap_or_else(|| assets.avatar_for(conv.is_group).to_string());
}

/// Newest conversation first; conversations that have never seen a message
/// sort last, keeping their relative order (stable sort).
pub(crate) fn sort_conversations(list: &mut [Conversation]) {
    list.sort_by(|a, b| match (&a.last_message, &b.last_message) {
        (Some(x), Some(y)) => y.sent_at.cmp(&x.sent_at),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

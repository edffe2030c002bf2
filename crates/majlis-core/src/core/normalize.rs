//! Maps raw server records into the canonical internal message shape.

use chrono::Utc;

use crate::api::{FriendDto, MessageDto};
use crate::config::DefaultAssets;
use crate::state::{ChatMessage, DeliveryState, Friend, MessageId, MessageKind, UNKNOWN_SENDER};

/// Which feed a record came from decides its default read flag; the unread
/// overlay can still override it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feed {
    All,
    Unread,
}

pub(crate) fn normalize_message(dto: MessageDto, feed: Feed, assets: &DefaultAssets) -> ChatMessage {
    let sender = dto.sender.as_ref();
    let first = sender
        .and_then(|s| s.first_name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let sender_display_name = match sender
        .and_then(|s| s.last_name.clone())
        .filter(|n| !n.trim().is_empty())
    {
        Some(last) => format!("{first} {last}"),
        None => first,
    };

    ChatMessage {
        // Server ids are the only stable identity; records without one get a
        // throwaway local id that never participates in cross-poll dedup.
        id: dto
            .id
            .map(MessageId::Server)
            .unwrap_or_else(MessageId::new_local),
        conversation_id: dto.conversation_id,
        content: dto.content.unwrap_or_default(),
        sender_id: sender.and_then(|s| s.id),
        sender_display_name,
        sender_avatar_url: sender
            .and_then(|s| s.profile_picture.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| assets.avatar_url.clone()),
        sent_at: dto.sent_at.unwrap_or_else(Utc::now),
        kind: match dto.kind {
            Some(0) => MessageKind::Normal,
            _ => MessageKind::System,
        },
        reply_to_message_id: dto.reply_to_message_id.filter(|&id| id != 0),
        is_read: feed == Feed::All,
        attachment: dto.attachment.filter(|a| !a.is_empty()),
        delivery: DeliveryState::Sent,
    }
}

/// Friend candidates missing an id or user name are unusable and dropped.
pub(crate) fn normalize_friends(dtos: Vec<FriendDto>) -> Vec<Friend> {
    dtos.into_iter()
        .filter_map(|f| {
            let id = f.id?;
            let user_name = f.user_name.filter(|n| !n.trim().is_empty())?;
            Some(Friend {
                id,
                user_name,
                avatar_url: f.profile_picture.filter(|u| !u.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SenderDto;

    fn assets() -> DefaultAssets {
        DefaultAssets {
            avatar_url: "default://avatar".into(),
            group_avatar_url: "default://group".into(),
        }
    }

    fn dto(conversation_id: u64) -> MessageDto {
        MessageDto {
            id: Some(1),
            conversation_id,
            content: Some("hello".into()),
            sender: Some(SenderDto {
                id: Some(7),
                first_name: Some("Amina".into()),
                last_name: Some("Saleh".into()),
                profile_picture: Some("https://cdn.example/amina.jpg".into()),
            }),
            sent_at: Some(Utc::now()),
            kind: Some(0),
            reply_to_message_id: None,
            attachment: None,
        }
    }

    #[test]
    fn full_record_maps_through() {
        let m = normalize_message(dto(3), Feed::All, &assets());
        assert_eq!(m.id, MessageId::Server(1));
        assert_eq!(m.conversation_id, 3);
        assert_eq!(m.sender_display_name, "Amina Saleh");
        assert_eq!(m.sender_avatar_url, "https://cdn.example/amina.jpg");
        assert_eq!(m.kind, MessageKind::Normal);
        assert!(m.is_read);
        assert_eq!(m.delivery, DeliveryState::Sent);
    }

    #[test]
    fn missing_sender_defaults_to_unknown() {
        let mut raw = dto(1);
        raw.sender = None;
        let m = normalize_message(raw, Feed::All, &assets());
        assert_eq!(m.sender_display_name, UNKNOWN_SENDER);
        assert_eq!(m.sender_id, None);
        assert_eq!(m.sender_avatar_url, "default://avatar");
    }

    #[test]
    fn missing_last_name_uses_first_name_only() {
        let mut raw = dto(1);
        raw.sender.as_mut().unwrap().last_name = None;
        let m = normalize_message(raw, Feed::All, &assets());
        assert_eq!(m.sender_display_name, "Amina");
    }

    #[test]
    fn nonzero_kind_discriminant_is_system() {
        for kind in [Some(1), Some(-3), None] {
            let mut raw = dto(1);
            raw.kind = kind;
            let m = normalize_message(raw, Feed::All, &assets());
            assert_eq!(m.kind, MessageKind::System, "kind {kind:?}");
        }
    }

    #[test]
    fn missing_id_gets_unique_local_id() {
        let mut a = dto(1);
        a.id = None;
        let mut b = dto(1);
        b.id = None;
        let ma = normalize_message(a, Feed::All, &assets());
        let mb = normalize_message(b, Feed::All, &assets());
        assert!(matches!(ma.id, MessageId::Local(_)));
        assert_ne!(ma.id, mb.id);
    }

    #[test]
    fn unread_feed_defaults_unread_and_empty_content() {
        let mut raw = dto(1);
        raw.content = None;
        let m = normalize_message(raw, Feed::Unread, &assets());
        assert!(!m.is_read);
        assert_eq!(m.content, "");
    }

    #[test]
    fn zero_reply_target_means_no_reply() {
        let mut raw = dto(1);
        raw.reply_to_message_id = Some(0);
        let m = normalize_message(raw, Feed::All, &assets());
        assert_eq!(m.reply_to_message_id, None);

        let mut raw = dto(1);
        raw.reply_to_message_id = Some(42);
        let m = normalize_message(raw, Feed::All, &assets());
        assert_eq!(m.reply_to_message_id, Some(42));
    }

    #[test]
    fn empty_attachment_becomes_none() {
        let mut raw = dto(1);
        raw.attachment = Some(String::new());
        assert_eq!(normalize_message(raw, Feed::All, &assets()).attachment, None);
    }

    #[test]
    fn missing_sent_at_defaults_to_now() {
        let mut raw = dto(1);
        raw.sent_at = None;
        let before = Utc::now();
        let m = normalize_message(raw, Feed::All, &assets());
        assert!(m.sent_at >= before && m.sent_at <= Utc::now());
    }

    #[test]
    fn friends_without_id_or_name_are_dropped() {
        let friends = normalize_friends(vec![
            FriendDto {
                id: Some(1),
                user_name: Some("rana".into()),
                profile_picture: None,
            },
            FriendDto {
                id: None,
                user_name: Some("ghost".into()),
                profile_picture: None,
            },
            FriendDto {
                id: Some(3),
                user_name: Some("  ".into()),
                profile_picture: None,
            },
        ]);
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user_name, "rana");
    }
}

//! Parser from raw OP_RETURN payloads to typed social items.
//!
//! Payloads arrive as dynamic JSON objects keyed by their index table name,
//! exactly as the wire format carries them. Everything downstream of this
//! module works on the tagged [`SocialItem`] union; a payload that does not
//! parse never reaches a validator and surfaces as `OpReturnFailed` at the
//! submission boundary.

use serde_json::Value;

use crate::errors::{ChainError, ChainResult};
use crate::types::{
    Blocking, Comment, CommentScore, Complaint, Post, PostType, ProfileChange, Score, SocialItem,
    Subscription,
};

fn field_str(value: &Value, key: &str) -> ChainResult<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ChainError::Payload(format!("missing field `{key}`")))
}

fn field_str_or_default(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn field_u64(value: &Value, key: &str) -> ChainResult<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| ChainError::Payload(format!("missing numeric field `{key}`")))
}

fn field_i64(value: &Value, key: &str) -> ChainResult<i64> {
    value
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ChainError::Payload(format!("missing numeric field `{key}`")))
}

fn field_bool_or_default(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn field_string_array(value: &Value, key: &str) -> ChainResult<Vec<String>> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ChainError::Payload(format!("non-string entry in `{key}`")))
            })
            .collect(),
        Some(_) => Err(ChainError::Payload(format!("field `{key}` is not an array"))),
    }
}

fn post_type(value: &Value) -> PostType {
    match value.get("type").and_then(Value::as_str) {
        Some("video") => PostType::Video,
        Some("image") => PostType::Image,
        _ => PostType::Plain,
    }
}

/// Parses one decoded payload object into its typed item. The `table` field
/// names the index table, the remaining fields are flat.
pub fn parse_item(value: &Value) -> ChainResult<SocialItem> {
    let table = field_str(value, "table")?;
    match table.as_str() {
        "Users" => {
            let profile = ProfileChange {
                txid: field_str(value, "txid")?,
                address: field_str(value, "address")?,
                name: field_str_or_default(value, "name"),
                avatar: field_str_or_default(value, "avatar"),
                lang: field_str_or_default(value, "lang"),
                about: field_str_or_default(value, "about"),
                url: field_str_or_default(value, "url"),
                donations: field_str_or_default(value, "donations"),
                pubkey: field_str_or_default(value, "pubkey"),
                referrer: field_str_or_default(value, "referrer"),
                time: field_u64(value, "time")?,
                block_height: None,
            };
            Ok(SocialItem::ProfileChange(profile))
        }
        "Posts" => {
            let txid = field_str(value, "txid")?;
            let original_txid = {
                let original = field_str_or_default(value, "otxid");
                if original.is_empty() {
                    txid.clone()
                } else {
                    original
                }
            };
            let post = Post {
                original_txid,
                author: field_str(value, "address")?,
                time: field_u64(value, "time")?,
                block_height: None,
                caption: field_str_or_default(value, "caption"),
                message: field_str_or_default(value, "message"),
                tags: field_string_array(value, "tags")?,
                images: field_string_array(value, "images")?,
                url: field_str_or_default(value, "url"),
                settings: field_str_or_default(value, "settings"),
                post_type: post_type(value),
                txid,
            };
            if post.is_edit() {
                Ok(SocialItem::PostEdit(post))
            } else {
                Ok(SocialItem::Post(post))
            }
        }
        "Scores" => Ok(SocialItem::Score(Score {
            txid: field_str(value, "txid")?,
            author: field_str(value, "address")?,
            post_txid: field_str(value, "posttxid")?,
            time: field_u64(value, "time")?,
            block_height: None,
            value: field_i64(value, "value")? as i32,
            lottery: field_bool_or_default(value, "lottery"),
        })),
        "Complains" => Ok(SocialItem::Complaint(Complaint {
            txid: field_str(value, "txid")?,
            author: field_str(value, "address")?,
            post_txid: field_str(value, "posttxid")?,
            time: field_u64(value, "time")?,
            block_height: None,
            reason: field_i64(value, "reason")? as i32,
        })),
        "Comment" => {
            let txid = field_str(value, "txid")?;
            let original_txid = {
                let original = field_str_or_default(value, "otxid");
                if original.is_empty() {
                    txid.clone()
                } else {
                    original
                }
            };
            let comment = Comment {
                original_txid,
                author: field_str(value, "address")?,
                post_txid: field_str(value, "postid")?,
                parent_txid: field_str_or_default(value, "parentid"),
                answer_txid: field_str_or_default(value, "answerid"),
                time: field_u64(value, "time")?,
                block_height: None,
                message: field_str_or_default(value, "msg"),
                last: false,
                deleted: false,
                txid,
            };
            if !comment.is_edit() {
                Ok(SocialItem::Comment(comment))
            } else if comment.message.is_empty() {
                Ok(SocialItem::CommentDelete(comment))
            } else {
                Ok(SocialItem::CommentEdit(comment))
            }
        }
        "CommentScores" => Ok(SocialItem::CommentScore(CommentScore {
            txid: field_str(value, "txid")?,
            author: field_str(value, "address")?,
            comment_txid: field_str(value, "commentid")?,
            time: field_u64(value, "time")?,
            block_height: None,
            value: field_i64(value, "value")? as i32,
        })),
        "Subscribes" => Ok(SocialItem::Subscribe(Subscription {
            txid: field_str(value, "txid")?,
            author: field_str(value, "address")?,
            target: field_str(value, "address_to")?,
            private: field_bool_or_default(value, "private"),
            unsubscribe: field_bool_or_default(value, "unsubscribe"),
            time: field_u64(value, "time")?,
            block_height: None,
        })),
        "Blocking" => Ok(SocialItem::Blocking(Blocking {
            txid: field_str(value, "txid")?,
            author: field_str(value, "address")?,
            target: field_str(value, "address_to")?,
            unblock: field_bool_or_default(value, "unblocking"),
            time: field_u64(value, "time")?,
            block_height: None,
        })),
        other => Err(ChainError::Payload(format!("unknown table `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_new_post_and_edit() {
        let raw = json!({
            "table": "Posts",
            "txid": "p1",
            "address": "alice",
            "time": 100,
            "caption": "hello",
            "message": "world",
            "tags": ["news"],
        });
        match parse_item(&raw).unwrap() {
            SocialItem::Post(post) => {
                assert_eq!(post.original_txid, "p1");
                assert_eq!(post.tags, vec!["news".to_string()]);
            }
            other => panic!("unexpected item {other:?}"),
        }

        let raw_edit = json!({
            "table": "Posts",
            "txid": "p2",
            "otxid": "p1",
            "address": "alice",
            "time": 200,
            "message": "world v2",
        });
        assert!(matches!(
            parse_item(&raw_edit).unwrap(),
            SocialItem::PostEdit(_)
        ));
    }

    #[test]
    fn comment_chain_shapes_disambiguate() {
        let new = json!({
            "table": "Comment",
            "txid": "c1",
            "address": "alice",
            "postid": "p1",
            "time": 100,
            "msg": "hi",
        });
        assert!(matches!(parse_item(&new).unwrap(), SocialItem::Comment(_)));

        let edit = json!({
            "table": "Comment",
            "txid": "c2",
            "otxid": "c1",
            "address": "alice",
            "postid": "p1",
            "time": 110,
            "msg": "hi v2",
        });
        assert!(matches!(
            parse_item(&edit).unwrap(),
            SocialItem::CommentEdit(_)
        ));

        let delete = json!({
            "table": "Comment",
            "txid": "c3",
            "otxid": "c1",
            "address": "alice",
            "postid": "p1",
            "time": 120,
        });
        assert!(matches!(
            parse_item(&delete).unwrap(),
            SocialItem::CommentDelete(_)
        ));
    }

    #[test]
    fn rejects_unknown_tables_and_missing_fields() {
        assert!(parse_item(&json!({ "table": "Nonsense" })).is_err());
        assert!(parse_item(&json!({ "table": "Scores", "txid": "s1" })).is_err());
        assert!(parse_item(&json!({ "txid": "s1" })).is_err());
    }

    #[test]
    fn parses_relations() {
        let sub = json!({
            "table": "Subscribes",
            "txid": "s1",
            "address": "alice",
            "address_to": "bob",
            "private": true,
            "time": 10,
        });
        match parse_item(&sub).unwrap() {
            SocialItem::Subscribe(subscription) => {
                assert!(subscription.private);
                assert!(!subscription.unsubscribe);
            }
            other => panic!("unexpected item {other:?}"),
        }

        let unblock = json!({
            "table": "Blocking",
            "txid": "b1",
            "address": "alice",
            "address_to": "bob",
            "unblocking": true,
            "time": 10,
        });
        match parse_item(&unblock).unwrap() {
            SocialItem::Blocking(blocking) => assert!(blocking.unblock),
            other => panic!("unexpected item {other:?}"),
        }
    }
}

use crate::context::SocialQuery;
use crate::limits::{limit, Threshold};
use crate::types::{Comment, SocialKind};
use crate::verdict::Verdict;

use super::AdmissionContext;

fn message_too_long(comment: &Comment, ctx: &AdmissionContext) -> bool {
    comment.message.len() > ctx.threshold(Threshold::MaxCommentMessageSize) as usize
}

/// Edits and deletes draw from the same windowed allowance.
fn edit_quota_reached(ctx: &AdmissionContext, profile: &crate::classifier::ActorProfile, author: &str, time: u64) -> bool {
    let used = ctx.window_count(SocialKind::CommentEdit, author, time)
        + ctx.window_count(SocialKind::CommentDelete, author, time);
    used >= limit(SocialKind::CommentEdit, profile.class, ctx.height) as u64
}

pub fn check_comment(comment: &Comment, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&comment.author, comment.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    if message_too_long(comment, ctx) {
        return Verdict::ContentSizeLimit;
    }
    let Some(post) = ctx.view.post_head(&comment.post_txid) else {
        return Verdict::NotFound;
    };
    if !comment.parent_txid.is_empty() {
        match ctx.view.comment_head(&comment.parent_txid) {
            Some(parent) if !parent.deleted && parent.post_txid == comment.post_txid => {}
            _ => return Verdict::InvalidParentComment,
        }
    }
    if !comment.answer_txid.is_empty() {
        match ctx.view.comment_head(&comment.answer_txid) {
            Some(answer) if !answer.deleted && answer.post_txid == comment.post_txid => {}
            _ => return Verdict::InvalidAnswerComment,
        }
    }
    if ctx.view.blocking_state(&post.author, &comment.author) == Some(true) {
        return Verdict::Blocking;
    }
    if ctx.quota_reached(SocialKind::Comment, &profile, &comment.author, comment.time) {
        return Verdict::CommentLimit;
    }
    Verdict::Success
}

pub fn check_comment_edit(comment: &Comment, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&comment.author, comment.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    if message_too_long(comment, ctx) {
        return Verdict::ContentSizeLimit;
    }
    let Some(head) = ctx.view.comment_head(&comment.original_txid) else {
        return Verdict::NotFound;
    };
    if head.author != comment.author {
        return Verdict::NotFound;
    }
    if head.deleted {
        return Verdict::CommentDeletedEdit;
    }
    if ctx.view.comment_edit_pending(&comment.original_txid) {
        return Verdict::DoubleCommentEdit;
    }
    let created = ctx
        .view
        .comment_created_at(&comment.original_txid)
        .unwrap_or(head.time);
    if comment.time.saturating_sub(created) > ctx.threshold(Threshold::EditCommentTimeout) as u64 {
        return Verdict::CommentEditLimit;
    }
    if edit_quota_reached(ctx, &profile, &comment.author, comment.time) {
        return Verdict::CommentEditLimit;
    }
    Verdict::Success
}

pub fn check_comment_delete(comment: &Comment, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&comment.author, comment.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    let Some(head) = ctx.view.comment_head(&comment.original_txid) else {
        return Verdict::NotFound;
    };
    if head.author != comment.author {
        return Verdict::NotFound;
    }
    if head.deleted {
        return Verdict::DoubleCommentDelete;
    }
    if ctx.view.comment_edit_pending(&comment.original_txid) {
        return Verdict::DoubleCommentDelete;
    }
    if edit_quota_reached(ctx, &profile, &comment.author, comment.time) {
        return Verdict::CommentEditLimit;
    }
    Verdict::Success
}

use crate::context::SocialQuery;
use crate::limits::Threshold;
use crate::types::{Post, SocialKind};
use crate::verdict::Verdict;

use super::AdmissionContext;

fn check_sizes(post: &Post, ctx: &AdmissionContext) -> Option<Verdict> {
    let total = post.message.len()
        + post.caption.len()
        + post.url.len()
        + post.settings.len()
        + post.tags.iter().map(String::len).sum::<usize>()
        + post.images.iter().map(String::len).sum::<usize>();
    if total > ctx.threshold(Threshold::MaxPayloadSize) as usize {
        return Some(Verdict::Size);
    }
    if post.message.len() > ctx.threshold(Threshold::MaxPostMessageSize) as usize
        || post.caption.len() > ctx.threshold(Threshold::MaxPostCaptionSize) as usize
        || post.url.len() > ctx.threshold(Threshold::MaxUrlSize) as usize
    {
        return Some(Verdict::ContentSizeLimit);
    }
    if post.tags.len() > ctx.threshold(Threshold::MaxTagCount) as usize
        || post
            .tags
            .iter()
            .any(|tag| tag.len() > ctx.threshold(Threshold::MaxTagSize) as usize)
    {
        return Some(Verdict::ContentSizeLimit);
    }
    if post.images.len() > ctx.threshold(Threshold::MaxImageCount) as usize
        || post
            .images
            .iter()
            .any(|image| image.len() > ctx.threshold(Threshold::MaxUrlSize) as usize)
    {
        return Some(Verdict::ContentSizeLimit);
    }
    None
}

pub fn check_post(post: &Post, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&post.author, post.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    if let Some(verdict) = check_sizes(post, ctx) {
        return verdict;
    }
    if ctx.quota_reached(SocialKind::Post, &profile, &post.author, post.time) {
        return Verdict::PostLimit;
    }
    Verdict::Success
}

pub fn check_post_edit(post: &Post, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&post.author, post.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    if let Some(verdict) = check_sizes(post, ctx) {
        return verdict;
    }
    let Some(head) = ctx.view.post_head(&post.original_txid) else {
        return Verdict::NotFound;
    };
    if head.author != post.author {
        return Verdict::PostEditUnauthorized;
    }
    if ctx.view.post_edit_pending(&post.original_txid) {
        return Verdict::DoublePostEdit;
    }
    let created = ctx
        .view
        .post_created_at(&post.original_txid)
        .unwrap_or(head.time);
    if post.time.saturating_sub(created) > ctx.threshold(Threshold::EditPostTimeout) as u64 {
        return Verdict::PostEditLimit;
    }
    if ctx.quota_reached(SocialKind::PostEdit, &profile, &post.author, post.time) {
        return Verdict::PostEditLimit;
    }
    Verdict::Success
}

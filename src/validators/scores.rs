use crate::context::SocialQuery;
use crate::types::{CommentScore, Score, SocialKind};
use crate::verdict::Verdict;

use super::AdmissionContext;

pub fn check_score(score: &Score, ctx: &AdmissionContext) -> Verdict {
    if !(1..=5).contains(&score.value) {
        return Verdict::OpReturnFailed;
    }
    let profile = match ctx.preamble(&score.author, score.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    let Some(post) = ctx.view.post_head(&score.post_txid) else {
        return Verdict::NotFound;
    };
    if post.author == score.author {
        return Verdict::SelfScore;
    }
    if ctx.view.score_exists(&score.author, &score.post_txid) {
        return Verdict::DoubleScore;
    }
    if ctx.view.blocking_state(&post.author, &score.author) == Some(true) {
        return Verdict::Blocking;
    }
    if !ctx.reputation.allow_scoring(&score.author, ctx.height) {
        return Verdict::LowReputation;
    }
    if ctx.quota_reached(SocialKind::Score, &profile, &score.author, score.time) {
        return Verdict::ScoreLimit;
    }
    Verdict::Success
}

pub fn check_comment_score(score: &CommentScore, ctx: &AdmissionContext) -> Verdict {
    if score.value != -1 && score.value != 1 {
        return Verdict::OpReturnFailed;
    }
    let profile = match ctx.preamble(&score.author, score.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    let comment = match ctx.view.comment_head(&score.comment_txid) {
        Some(comment) if !comment.deleted => comment,
        _ => return Verdict::NotFound,
    };
    if comment.author == score.author {
        return Verdict::SelfCommentScore;
    }
    if ctx
        .view
        .comment_score_exists(&score.author, &score.comment_txid)
    {
        return Verdict::DoubleCommentScore;
    }
    if !ctx.reputation.allow_scoring(&score.author, ctx.height) {
        return Verdict::LowReputation;
    }
    if ctx.quota_reached(SocialKind::CommentScore, &profile, &score.author, score.time) {
        return Verdict::CommentScoreLimit;
    }
    Verdict::Success
}

//! Per-kind admission validators.
//!
//! Every validator is a pure function of the candidate item and an
//! [`AdmissionContext`]; it returns the most specific verdict for the first
//! rule that fails and never panics. The shared preamble checks the declared
//! time against the adjusted node clock and resolves the author's actor
//! profile; everything kind-specific lives in the submodules.

mod comments;
mod complaints;
mod posts;
mod profiles;
mod relations;
mod scores;

use crate::classifier::{classify, ActorProfile};
use crate::context::{ContextView, Ledger, SocialQuery};
use crate::limits::{limit, threshold, Threshold, DAY_WINDOW};
use crate::reputation::ReputationLedger;
use crate::types::{SocialItem, SocialKind};
use crate::verdict::Verdict;

pub struct AdmissionContext<'a> {
    pub view: &'a ContextView<'a>,
    pub ledger: &'a dyn Ledger,
    pub reputation: &'a ReputationLedger,
    pub height: u64,
    pub now: u64,
}

impl AdmissionContext<'_> {
    /// Common preamble: declared time sanity plus author registration.
    /// A too-far-future time is transient (the item may become valid), so it
    /// maps to `Failed` rather than a terminal verdict.
    fn preamble(&self, author: &str, time: u64) -> Result<ActorProfile, Verdict> {
        if time > self.now + threshold(Threshold::ClockSkew, self.height) as u64 {
            return Err(Verdict::Failed);
        }
        classify(
            author,
            self.height,
            self.now,
            self.view,
            self.ledger,
            self.reputation,
        )
        .ok_or(Verdict::NotRegistered)
    }

    /// Actions of `kind` inside the sliding window ending at `time`,
    /// including everything visible through the context mask.
    fn window_count(&self, kind: SocialKind, author: &str, time: u64) -> u64 {
        self.view
            .count_by_author_window(kind, author, time.saturating_sub(DAY_WINDOW), time)
    }

    fn quota_reached(&self, kind: SocialKind, profile: &ActorProfile, author: &str, time: u64) -> bool {
        self.window_count(kind, author, time) >= limit(kind, profile.class, self.height) as u64
    }

    fn threshold(&self, name: Threshold) -> i64 {
        threshold(name, self.height)
    }
}

/// Dispatches one parsed social item to its validator.
pub fn check(item: &SocialItem, ctx: &AdmissionContext) -> Verdict {
    match item {
        SocialItem::Post(post) => posts::check_post(post, ctx),
        SocialItem::PostEdit(post) => posts::check_post_edit(post, ctx),
        SocialItem::Score(score) => scores::check_score(score, ctx),
        SocialItem::Complaint(complaint) => complaints::check_complaint(complaint, ctx),
        SocialItem::Comment(comment) => comments::check_comment(comment, ctx),
        SocialItem::CommentEdit(comment) => comments::check_comment_edit(comment, ctx),
        SocialItem::CommentDelete(comment) => comments::check_comment_delete(comment, ctx),
        SocialItem::CommentScore(score) => scores::check_comment_score(score, ctx),
        SocialItem::Subscribe(subscription) => relations::check_subscribe(subscription, ctx),
        SocialItem::Blocking(blocking) => relations::check_blocking(blocking, ctx),
        SocialItem::ProfileChange(profile) => profiles::check_profile_change(profile, ctx),
    }
}

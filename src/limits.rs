//! Height-parameterised admission limits.
//!
//! Every number that gates admission lives here so that policy changes are
//! hard-fork schedules, not scattered constants. Lookups are pure functions
//! of `(kind, class, height)` and two honest nodes at the same height always
//! resolve the same values.

use serde::{Deserialize, Serialize};

use crate::types::SocialKind;

/// Sliding window for the daily quotas, in seconds.
pub const DAY_WINDOW: u64 = 86_400;

pub const COIN: i64 = 100_000_000;

/// Activation height of the tightened quota schedule.
pub const QUOTA_SOFTFORK_HEIGHT: u64 = 250_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorClass {
    Trial,
    Full,
}

impl ActorClass {
    pub fn is_trial(self) -> bool {
        self == ActorClass::Trial
    }
}

/// Named scalar thresholds exposed alongside the per-kind quotas.
/// Reputation thresholds are expressed in half-point units (one comment
/// upvote = 1 unit = 0.5 displayed points).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Threshold {
    /// Minimum reputation to score a post or comment.
    ScoringReputation,
    /// Minimum received reputation on a single item for the over-post rule.
    OverItemReputation,
    /// Feed cutoff for authors with bad reputation. Not an admission rule;
    /// exposed for the feed-serving layer.
    BadReputation,
    /// Minimum reputation to file complaints below Full class.
    ComplaintReputation,
    FullAccountBalance,
    FullAccountAge,
    FullAccountReputation,
    /// Minimum registration age before scores start modifying reputation.
    ScoringAccountAge,
    /// Age bound on the scored item for the over-post relaxation, seconds.
    ReputationDepth,
    EditPostTimeout,
    EditCommentTimeout,
    /// Minimum spacing between profile changes, seconds.
    ChangeInfoTimeout,
    /// Maximum declared item time ahead of adjusted node time, seconds.
    ClockSkew,
    MaxPostMessageSize,
    MaxPostCaptionSize,
    MaxTagCount,
    MaxTagSize,
    MaxImageCount,
    MaxUrlSize,
    MaxNicknameSize,
    MaxCommentMessageSize,
    MaxProfileAboutSize,
    MaxProfileFieldSize,
    MaxPayloadSize,
}

type Schedule = &'static [(u64, i64)];

fn stepped(table: Schedule, height: u64) -> i64 {
    let mut value = table[0].1;
    for (activation, stepped_value) in table {
        if height >= *activation {
            value = *stepped_value;
        }
    }
    value
}

/// Daily quota for `(kind, class)` at `height`. Kinds without a windowed
/// quota (subscribe, blocking) are unconstrained here; their redundancy
/// rules live in the validators.
pub fn limit(kind: SocialKind, class: ActorClass, height: u64) -> u32 {
    const POST_TRIAL: Schedule = &[(0, 15), (QUOTA_SOFTFORK_HEIGHT, 5)];
    const POST_FULL: Schedule = &[(0, 30)];
    const SCORE_TRIAL: Schedule = &[(0, 90), (QUOTA_SOFTFORK_HEIGHT, 45)];
    const SCORE_FULL: Schedule = &[(0, 90)];
    const COMPLAINT_TRIAL: Schedule = &[(0, 12), (QUOTA_SOFTFORK_HEIGHT, 6)];
    const COMPLAINT_FULL: Schedule = &[(0, 12)];
    const COMMENT_TRIAL: Schedule = &[(0, 150)];
    const COMMENT_FULL: Schedule = &[(0, 300)];
    const COMMENT_SCORE_TRIAL: Schedule = &[(0, 300)];
    const COMMENT_SCORE_FULL: Schedule = &[(0, 600)];
    const PROFILE_CHANGE: Schedule = &[(0, 5)];

    let table = match (kind, class) {
        (SocialKind::Post, ActorClass::Trial) => POST_TRIAL,
        (SocialKind::Post, ActorClass::Full) => POST_FULL,
        (SocialKind::PostEdit, ActorClass::Trial) => POST_TRIAL,
        (SocialKind::PostEdit, ActorClass::Full) => POST_FULL,
        (SocialKind::Score, ActorClass::Trial) => SCORE_TRIAL,
        (SocialKind::Score, ActorClass::Full) => SCORE_FULL,
        (SocialKind::Complaint, ActorClass::Trial) => COMPLAINT_TRIAL,
        (SocialKind::Complaint, ActorClass::Full) => COMPLAINT_FULL,
        (SocialKind::Comment, ActorClass::Trial) => COMMENT_TRIAL,
        (SocialKind::Comment, ActorClass::Full) => COMMENT_FULL,
        (SocialKind::CommentEdit | SocialKind::CommentDelete, ActorClass::Trial) => COMMENT_TRIAL,
        (SocialKind::CommentEdit | SocialKind::CommentDelete, ActorClass::Full) => COMMENT_FULL,
        (SocialKind::CommentScore, ActorClass::Trial) => COMMENT_SCORE_TRIAL,
        (SocialKind::CommentScore, ActorClass::Full) => COMMENT_SCORE_FULL,
        (SocialKind::ProfileChange, _) => PROFILE_CHANGE,
        (SocialKind::Subscribe | SocialKind::Blocking, _) => return u32::MAX,
    };
    stepped(table, height) as u32
}

pub fn threshold(name: Threshold, height: u64) -> i64 {
    const SCORING_REPUTATION: Schedule = &[(0, 100)];
    const OVER_ITEM_REPUTATION: Schedule = &[(0, 1)];
    const BAD_REPUTATION: Schedule = &[(0, -100)];
    const COMPLAINT_REPUTATION: Schedule = &[(0, 200)];
    const FULL_ACCOUNT_BALANCE: Schedule = &[(0, 50 * COIN)];
    const FULL_ACCOUNT_AGE: Schedule = &[(0, 30 * DAY_WINDOW as i64)];
    const FULL_ACCOUNT_REPUTATION: Schedule = &[(0, 100)];
    const SCORING_ACCOUNT_AGE: Schedule = &[(0, DAY_WINDOW as i64)];
    const REPUTATION_DEPTH: Schedule = &[(0, 30 * DAY_WINDOW as i64), (QUOTA_SOFTFORK_HEIGHT, 14 * DAY_WINDOW as i64)];
    const EDIT_POST_TIMEOUT: Schedule = &[(0, 3 * DAY_WINDOW as i64)];
    const EDIT_COMMENT_TIMEOUT: Schedule = &[(0, 3 * DAY_WINDOW as i64)];
    const CHANGE_INFO_TIMEOUT: Schedule = &[(0, 3_600)];
    const CLOCK_SKEW: Schedule = &[(0, 7_200)];
    const MAX_POST_MESSAGE_SIZE: Schedule = &[(0, 30_000)];
    const MAX_POST_CAPTION_SIZE: Schedule = &[(0, 255)];
    const MAX_TAG_COUNT: Schedule = &[(0, 5)];
    const MAX_TAG_SIZE: Schedule = &[(0, 100)];
    const MAX_IMAGE_COUNT: Schedule = &[(0, 10)];
    const MAX_URL_SIZE: Schedule = &[(0, 500)];
    const MAX_NICKNAME_SIZE: Schedule = &[(0, 35)];
    const MAX_COMMENT_MESSAGE_SIZE: Schedule = &[(0, 2_000)];
    const MAX_PROFILE_ABOUT_SIZE: Schedule = &[(0, 2_000)];
    const MAX_PROFILE_FIELD_SIZE: Schedule = &[(0, 500)];
    const MAX_PAYLOAD_SIZE: Schedule = &[(0, 60_000)];

    let table = match name {
        Threshold::ScoringReputation => SCORING_REPUTATION,
        Threshold::OverItemReputation => OVER_ITEM_REPUTATION,
        Threshold::BadReputation => BAD_REPUTATION,
        Threshold::ComplaintReputation => COMPLAINT_REPUTATION,
        Threshold::FullAccountBalance => FULL_ACCOUNT_BALANCE,
        Threshold::FullAccountAge => FULL_ACCOUNT_AGE,
        Threshold::FullAccountReputation => FULL_ACCOUNT_REPUTATION,
        Threshold::ScoringAccountAge => SCORING_ACCOUNT_AGE,
        Threshold::ReputationDepth => REPUTATION_DEPTH,
        Threshold::EditPostTimeout => EDIT_POST_TIMEOUT,
        Threshold::EditCommentTimeout => EDIT_COMMENT_TIMEOUT,
        Threshold::ChangeInfoTimeout => CHANGE_INFO_TIMEOUT,
        Threshold::ClockSkew => CLOCK_SKEW,
        Threshold::MaxPostMessageSize => MAX_POST_MESSAGE_SIZE,
        Threshold::MaxPostCaptionSize => MAX_POST_CAPTION_SIZE,
        Threshold::MaxTagCount => MAX_TAG_COUNT,
        Threshold::MaxTagSize => MAX_TAG_SIZE,
        Threshold::MaxImageCount => MAX_IMAGE_COUNT,
        Threshold::MaxUrlSize => MAX_URL_SIZE,
        Threshold::MaxNicknameSize => MAX_NICKNAME_SIZE,
        Threshold::MaxCommentMessageSize => MAX_COMMENT_MESSAGE_SIZE,
        Threshold::MaxProfileAboutSize => MAX_PROFILE_ABOUT_SIZE,
        Threshold::MaxProfileFieldSize => MAX_PROFILE_FIELD_SIZE,
        Threshold::MaxPayloadSize => MAX_PAYLOAD_SIZE,
    };
    stepped(table, height)
}

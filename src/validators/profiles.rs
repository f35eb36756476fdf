use crate::classifier::classify;
use crate::context::SocialQuery;
use crate::limits::{limit, threshold, ActorClass, Threshold};
use crate::types::{ProfileChange, SocialKind};
use crate::verdict::Verdict;

use super::AdmissionContext;

/// The first profile change registers an address, so this validator cannot
/// demand prior registration the way every other kind does.
pub fn check_profile_change(profile: &ProfileChange, ctx: &AdmissionContext) -> Verdict {
    if profile.time > ctx.now + threshold(Threshold::ClockSkew, ctx.height) as u64 {
        return Verdict::Failed;
    }
    if profile.name.is_empty()
        || profile.name.len() > ctx.threshold(Threshold::MaxNicknameSize) as usize
    {
        return Verdict::NicknameLong;
    }
    let field_limit = ctx.threshold(Threshold::MaxProfileFieldSize) as usize;
    if profile.about.len() > ctx.threshold(Threshold::MaxProfileAboutSize) as usize
        || profile.avatar.len() > field_limit
        || profile.url.len() > field_limit
        || profile.donations.len() > field_limit
        || profile.pubkey.len() > field_limit
        || profile.lang.len() > field_limit
    {
        return Verdict::ContentSizeLimit;
    }
    if ctx.view.nickname_taken(&profile.name, &profile.address) {
        return Verdict::NicknameDouble;
    }
    if !profile.referrer.is_empty() {
        if profile.referrer == profile.address {
            return Verdict::ReferrerSelf;
        }
        if ctx.view.registered_at(&profile.referrer).is_none() {
            return Verdict::NotFound;
        }
    }
    if let Some(latest) = ctx.view.latest_profile_time(&profile.address) {
        if profile.time.saturating_sub(latest)
            < ctx.threshold(Threshold::ChangeInfoTimeout) as u64
        {
            return Verdict::ChangeInfoLimit;
        }
    }
    let class = classify(
        &profile.address,
        ctx.height,
        ctx.now,
        ctx.view,
        ctx.ledger,
        ctx.reputation,
    )
    .map(|actor| actor.class)
    .unwrap_or(ActorClass::Trial);
    let used = ctx.window_count(SocialKind::ProfileChange, &profile.address, profile.time);
    if used >= limit(SocialKind::ProfileChange, class, ctx.height) as u64 {
        return Verdict::ChangeInfoLimit;
    }
    Verdict::Success
}

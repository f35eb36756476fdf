use crate::context::SocialQuery;
use crate::limits::{ActorClass, Threshold};
use crate::types::{Complaint, SocialKind};
use crate::verdict::Verdict;

use super::AdmissionContext;

pub fn check_complaint(complaint: &Complaint, ctx: &AdmissionContext) -> Verdict {
    let profile = match ctx.preamble(&complaint.author, complaint.time) {
        Ok(profile) => profile,
        Err(verdict) => return verdict,
    };
    let Some(post) = ctx.view.post_head(&complaint.post_txid) else {
        return Verdict::NotFound;
    };
    if post.author == complaint.author {
        return Verdict::SelfComplain;
    }
    if ctx
        .view
        .complaint_exists(&complaint.author, &complaint.post_txid)
    {
        return Verdict::DoubleComplain;
    }
    if profile.class != ActorClass::Full
        && profile.reputation < ctx.threshold(Threshold::ComplaintReputation)
    {
        return Verdict::LowReputation;
    }
    if ctx.quota_reached(
        SocialKind::Complaint,
        &profile,
        &complaint.author,
        complaint.time,
    ) {
        return Verdict::ComplainLimit;
    }
    Verdict::Success
}

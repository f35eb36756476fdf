use crate::context::SocialQuery;
use crate::types::{Blocking, Subscription};
use crate::verdict::Verdict;

use super::AdmissionContext;

pub fn check_subscribe(subscription: &Subscription, ctx: &AdmissionContext) -> Verdict {
    if let Err(verdict) = ctx.preamble(&subscription.author, subscription.time) {
        return verdict;
    }
    if subscription.target == subscription.author {
        return Verdict::SelfSubscribe;
    }
    if ctx.view.registered_at(&subscription.target).is_none() {
        return Verdict::InvalideSubscribe;
    }
    let state = ctx
        .view
        .subscription_state(&subscription.author, &subscription.target);
    if subscription.unsubscribe {
        // Nothing to undo.
        if !state.map(|state| state.subscribed).unwrap_or(false) {
            return Verdict::InvalideSubscribe;
        }
    } else if let Some(state) = state {
        if state.subscribed && state.private == subscription.private {
            return Verdict::DoubleSubscribe;
        }
    }
    Verdict::Success
}

pub fn check_blocking(blocking: &Blocking, ctx: &AdmissionContext) -> Verdict {
    if let Err(verdict) = ctx.preamble(&blocking.author, blocking.time) {
        return verdict;
    }
    if blocking.target == blocking.author {
        return Verdict::SelfBlocking;
    }
    if ctx.view.registered_at(&blocking.target).is_none() {
        return Verdict::InvalidBlocking;
    }
    let blocked = ctx
        .view
        .blocking_state(&blocking.author, &blocking.target)
        .unwrap_or(false);
    if blocking.unblock {
        if !blocked {
            return Verdict::InvalidBlocking;
        }
    } else if blocked {
        return Verdict::DoubleBlocking;
    }
    Verdict::Success
}

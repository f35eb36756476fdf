mod chain;
mod social;

pub use chain::{OutPoint, RawTransaction, UserState};
pub use social::{
    Blocking, Comment, CommentScore, Complaint, Post, PostType, ProfileChange, Score, SocialItem,
    SocialKind, Subscription,
};

pub type Address = String;
pub type TxId = String;

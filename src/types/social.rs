use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Address, TxId};

/// Discriminant for every social action carried on the chain. Quota windows
/// and limit lookups are keyed by this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialKind {
    Post,
    PostEdit,
    Score,
    Complaint,
    Comment,
    CommentEdit,
    CommentDelete,
    CommentScore,
    Subscribe,
    Blocking,
    ProfileChange,
}

impl SocialKind {
    pub fn name(self) -> &'static str {
        match self {
            SocialKind::Post => "share",
            SocialKind::PostEdit => "shareEdit",
            SocialKind::Score => "upvoteShare",
            SocialKind::Complaint => "complainShare",
            SocialKind::Comment => "comment",
            SocialKind::CommentEdit => "commentEdit",
            SocialKind::CommentDelete => "commentDelete",
            SocialKind::CommentScore => "cScore",
            SocialKind::Subscribe => "subscribe",
            SocialKind::Blocking => "blocking",
            SocialKind::ProfileChange => "userInfo",
        }
    }
}

impl fmt::Display for SocialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostType {
    #[default]
    Plain,
    Video,
    Image,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Post {
    pub txid: TxId,
    /// Equals `txid` for a fresh post; an edit points at the first version.
    pub original_txid: TxId,
    pub author: Address,
    pub time: u64,
    pub block_height: Option<u64>,
    pub caption: String,
    pub message: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub url: String,
    pub settings: String,
    pub post_type: PostType,
}

impl Post {
    pub fn is_edit(&self) -> bool {
        self.original_txid != self.txid
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Comment {
    pub txid: TxId,
    pub original_txid: TxId,
    pub author: Address,
    pub post_txid: TxId,
    pub parent_txid: String,
    pub answer_txid: String,
    pub time: u64,
    pub block_height: Option<u64>,
    pub message: String,
    /// Exactly one record per edit chain carries `last = true`.
    pub last: bool,
    pub deleted: bool,
}

impl Comment {
    pub fn is_edit(&self) -> bool {
        self.original_txid != self.txid
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Score {
    pub txid: TxId,
    pub author: Address,
    pub post_txid: TxId,
    pub time: u64,
    pub block_height: Option<u64>,
    /// 1..=5 for post scores.
    pub value: i32,
    /// Scores carried by lottery coinbase payouts never modify reputation.
    pub lottery: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommentScore {
    pub txid: TxId,
    pub author: Address,
    pub comment_txid: TxId,
    pub time: u64,
    pub block_height: Option<u64>,
    /// Strictly -1 or +1.
    pub value: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Complaint {
    pub txid: TxId,
    pub author: Address,
    pub post_txid: TxId,
    pub time: u64,
    pub block_height: Option<u64>,
    pub reason: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub txid: TxId,
    pub author: Address,
    pub target: Address,
    pub private: bool,
    pub unsubscribe: bool,
    pub time: u64,
    pub block_height: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Blocking {
    pub txid: TxId,
    pub author: Address,
    pub target: Address,
    pub unblock: bool,
    pub time: u64,
    pub block_height: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileChange {
    pub txid: TxId,
    pub address: Address,
    pub name: String,
    pub avatar: String,
    pub lang: String,
    pub about: String,
    pub url: String,
    pub donations: String,
    pub pubkey: String,
    pub referrer: String,
    pub time: u64,
    pub block_height: Option<u64>,
}

/// Tagged union over every social record the admission engine understands.
/// The payload parser produces these; validators never see raw payloads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SocialItem {
    Post(Post),
    PostEdit(Post),
    Score(Score),
    Complaint(Complaint),
    Comment(Comment),
    CommentEdit(Comment),
    CommentDelete(Comment),
    CommentScore(CommentScore),
    Subscribe(Subscription),
    Blocking(Blocking),
    ProfileChange(ProfileChange),
}

impl SocialItem {
    pub fn kind(&self) -> SocialKind {
        match self {
            SocialItem::Post(_) => SocialKind::Post,
            SocialItem::PostEdit(_) => SocialKind::PostEdit,
            SocialItem::Score(_) => SocialKind::Score,
            SocialItem::Complaint(_) => SocialKind::Complaint,
            SocialItem::Comment(_) => SocialKind::Comment,
            SocialItem::CommentEdit(_) => SocialKind::CommentEdit,
            SocialItem::CommentDelete(_) => SocialKind::CommentDelete,
            SocialItem::CommentScore(_) => SocialKind::CommentScore,
            SocialItem::Subscribe(_) => SocialKind::Subscribe,
            SocialItem::Blocking(_) => SocialKind::Blocking,
            SocialItem::ProfileChange(_) => SocialKind::ProfileChange,
        }
    }

    pub fn txid(&self) -> &str {
        match self {
            SocialItem::Post(post) | SocialItem::PostEdit(post) => &post.txid,
            SocialItem::Score(score) => &score.txid,
            SocialItem::Complaint(complaint) => &complaint.txid,
            SocialItem::Comment(comment)
            | SocialItem::CommentEdit(comment)
            | SocialItem::CommentDelete(comment) => &comment.txid,
            SocialItem::CommentScore(score) => &score.txid,
            SocialItem::Subscribe(subscription) => &subscription.txid,
            SocialItem::Blocking(blocking) => &blocking.txid,
            SocialItem::ProfileChange(profile) => &profile.txid,
        }
    }

    pub fn author(&self) -> &str {
        match self {
            SocialItem::Post(post) | SocialItem::PostEdit(post) => &post.author,
            SocialItem::Score(score) => &score.author,
            SocialItem::Complaint(complaint) => &complaint.author,
            SocialItem::Comment(comment)
            | SocialItem::CommentEdit(comment)
            | SocialItem::CommentDelete(comment) => &comment.author,
            SocialItem::CommentScore(score) => &score.author,
            SocialItem::Subscribe(subscription) => &subscription.author,
            SocialItem::Blocking(blocking) => &blocking.author,
            SocialItem::ProfileChange(profile) => &profile.address,
        }
    }

    pub fn time(&self) -> u64 {
        match self {
            SocialItem::Post(post) | SocialItem::PostEdit(post) => post.time,
            SocialItem::Score(score) => score.time,
            SocialItem::Complaint(complaint) => complaint.time,
            SocialItem::Comment(comment)
            | SocialItem::CommentEdit(comment)
            | SocialItem::CommentDelete(comment) => comment.time,
            SocialItem::CommentScore(score) => score.time,
            SocialItem::Subscribe(subscription) => subscription.time,
            SocialItem::Blocking(blocking) => blocking.time,
            SocialItem::ProfileChange(profile) => profile.time,
        }
    }

    pub fn set_block_height(&mut self, height: u64) {
        let slot = match self {
            SocialItem::Post(post) | SocialItem::PostEdit(post) => &mut post.block_height,
            SocialItem::Score(score) => &mut score.block_height,
            SocialItem::Complaint(complaint) => &mut complaint.block_height,
            SocialItem::Comment(comment)
            | SocialItem::CommentEdit(comment)
            | SocialItem::CommentDelete(comment) => &mut comment.block_height,
            SocialItem::CommentScore(score) => &mut score.block_height,
            SocialItem::Subscribe(subscription) => &mut subscription.block_height,
            SocialItem::Blocking(blocking) => &mut blocking.block_height,
            SocialItem::ProfileChange(profile) => &mut profile.block_height,
        };
        *slot = Some(height);
    }
}

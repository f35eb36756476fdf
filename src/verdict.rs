use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Outcome of an admission check. The numeric codes are part of the RPC wire
/// contract and must never be renumbered; code 36 was retired upstream and is
/// intentionally absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Success,
    NotRegistered,
    PostLimit,
    ScoreLimit,
    DoubleScore,
    SelfScore,
    ChangeInfoLimit,
    InvalideSubscribe,
    DoubleSubscribe,
    SelfSubscribe,
    Unknown,
    Failed,
    NotFound,
    DoubleComplain,
    SelfComplain,
    ComplainLimit,
    LowReputation,
    ContentSizeLimit,
    NicknameDouble,
    NicknameLong,
    ReferrerSelf,
    FailedOpReturn,
    InvalidBlocking,
    DoubleBlocking,
    SelfBlocking,
    DoublePostEdit,
    PostEditLimit,
    PostEditUnauthorized,
    ManyTransactions,
    CommentLimit,
    CommentEditLimit,
    CommentScoreLimit,
    Blocking,
    Size,
    InvalidParentComment,
    InvalidAnswerComment,
    DoubleCommentEdit,
    SelfCommentScore,
    DoubleCommentDelete,
    DoubleCommentScore,
    OpReturnFailed,
    CommentDeletedEdit,
}

impl Verdict {
    pub fn code(self) -> u32 {
        match self {
            Verdict::Success => 0,
            Verdict::NotRegistered => 1,
            Verdict::PostLimit => 2,
            Verdict::ScoreLimit => 3,
            Verdict::DoubleScore => 4,
            Verdict::SelfScore => 5,
            Verdict::ChangeInfoLimit => 6,
            Verdict::InvalideSubscribe => 7,
            Verdict::DoubleSubscribe => 8,
            Verdict::SelfSubscribe => 9,
            Verdict::Unknown => 10,
            Verdict::Failed => 11,
            Verdict::NotFound => 12,
            Verdict::DoubleComplain => 13,
            Verdict::SelfComplain => 14,
            Verdict::ComplainLimit => 15,
            Verdict::LowReputation => 16,
            Verdict::ContentSizeLimit => 17,
            Verdict::NicknameDouble => 18,
            Verdict::NicknameLong => 19,
            Verdict::ReferrerSelf => 20,
            Verdict::FailedOpReturn => 21,
            Verdict::InvalidBlocking => 22,
            Verdict::DoubleBlocking => 23,
            Verdict::SelfBlocking => 24,
            Verdict::DoublePostEdit => 25,
            Verdict::PostEditLimit => 26,
            Verdict::PostEditUnauthorized => 27,
            Verdict::ManyTransactions => 28,
            Verdict::CommentLimit => 29,
            Verdict::CommentEditLimit => 30,
            Verdict::CommentScoreLimit => 31,
            Verdict::Blocking => 32,
            Verdict::Size => 33,
            Verdict::InvalidParentComment => 34,
            Verdict::InvalidAnswerComment => 35,
            Verdict::DoubleCommentEdit => 37,
            Verdict::SelfCommentScore => 38,
            Verdict::DoubleCommentDelete => 39,
            Verdict::DoubleCommentScore => 40,
            Verdict::OpReturnFailed => 41,
            Verdict::CommentDeletedEdit => 42,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let verdict = match code {
            0 => Verdict::Success,
            1 => Verdict::NotRegistered,
            2 => Verdict::PostLimit,
            3 => Verdict::ScoreLimit,
            4 => Verdict::DoubleScore,
            5 => Verdict::SelfScore,
            6 => Verdict::ChangeInfoLimit,
            7 => Verdict::InvalideSubscribe,
            8 => Verdict::DoubleSubscribe,
            9 => Verdict::SelfSubscribe,
            10 => Verdict::Unknown,
            11 => Verdict::Failed,
            12 => Verdict::NotFound,
            13 => Verdict::DoubleComplain,
            14 => Verdict::SelfComplain,
            15 => Verdict::ComplainLimit,
            16 => Verdict::LowReputation,
            17 => Verdict::ContentSizeLimit,
            18 => Verdict::NicknameDouble,
            19 => Verdict::NicknameLong,
            20 => Verdict::ReferrerSelf,
            21 => Verdict::FailedOpReturn,
            22 => Verdict::InvalidBlocking,
            23 => Verdict::DoubleBlocking,
            24 => Verdict::SelfBlocking,
            25 => Verdict::DoublePostEdit,
            26 => Verdict::PostEditLimit,
            27 => Verdict::PostEditUnauthorized,
            28 => Verdict::ManyTransactions,
            29 => Verdict::CommentLimit,
            30 => Verdict::CommentEditLimit,
            31 => Verdict::CommentScoreLimit,
            32 => Verdict::Blocking,
            33 => Verdict::Size,
            34 => Verdict::InvalidParentComment,
            35 => Verdict::InvalidAnswerComment,
            37 => Verdict::DoubleCommentEdit,
            38 => Verdict::SelfCommentScore,
            39 => Verdict::DoubleCommentDelete,
            40 => Verdict::DoubleCommentScore,
            41 => Verdict::OpReturnFailed,
            42 => Verdict::CommentDeletedEdit,
            _ => return None,
        };
        Some(verdict)
    }

    pub fn is_success(self) -> bool {
        self == Verdict::Success
    }

    /// Transient verdicts signal infrastructure trouble. Callers must retry
    /// later instead of treating the item as permanently invalid.
    pub fn is_transient(self) -> bool {
        matches!(self, Verdict::Failed | Verdict::Unknown)
    }

    pub fn name(self) -> &'static str {
        match self {
            Verdict::Success => "Success",
            Verdict::NotRegistered => "NotRegistered",
            Verdict::PostLimit => "PostLimit",
            Verdict::ScoreLimit => "ScoreLimit",
            Verdict::DoubleScore => "DoubleScore",
            Verdict::SelfScore => "SelfScore",
            Verdict::ChangeInfoLimit => "ChangeInfoLimit",
            Verdict::InvalideSubscribe => "InvalideSubscribe",
            Verdict::DoubleSubscribe => "DoubleSubscribe",
            Verdict::SelfSubscribe => "SelfSubscribe",
            Verdict::Unknown => "Unknown",
            Verdict::Failed => "Failed",
            Verdict::NotFound => "NotFound",
            Verdict::DoubleComplain => "DoubleComplain",
            Verdict::SelfComplain => "SelfComplain",
            Verdict::ComplainLimit => "ComplainLimit",
            Verdict::LowReputation => "LowReputation",
            Verdict::ContentSizeLimit => "ContentSizeLimit",
            Verdict::NicknameDouble => "NicknameDouble",
            Verdict::NicknameLong => "NicknameLong",
            Verdict::ReferrerSelf => "ReferrerSelf",
            Verdict::FailedOpReturn => "FailedOpReturn",
            Verdict::InvalidBlocking => "InvalidBlocking",
            Verdict::DoubleBlocking => "DoubleBlocking",
            Verdict::SelfBlocking => "SelfBlocking",
            Verdict::DoublePostEdit => "DoublePostEdit",
            Verdict::PostEditLimit => "PostEditLimit",
            Verdict::PostEditUnauthorized => "PostEditUnauthorized",
            Verdict::ManyTransactions => "ManyTransactions",
            Verdict::CommentLimit => "CommentLimit",
            Verdict::CommentEditLimit => "CommentEditLimit",
            Verdict::CommentScoreLimit => "CommentScoreLimit",
            Verdict::Blocking => "Blocking",
            Verdict::Size => "Size",
            Verdict::InvalidParentComment => "InvalidParentComment",
            Verdict::InvalidAnswerComment => "InvalidAnswerComment",
            Verdict::DoubleCommentEdit => "DoubleCommentEdit",
            Verdict::SelfCommentScore => "SelfCommentScore",
            Verdict::DoubleCommentDelete => "DoubleCommentDelete",
            Verdict::DoubleCommentScore => "DoubleCommentScore",
            Verdict::OpReturnFailed => "OpReturnFailed",
            Verdict::CommentDeletedEdit => "CommentDeletedEdit",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl Serialize for Verdict {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = u32::deserialize(deserializer)?;
        Verdict::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown verdict code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=42u32 {
            match Verdict::from_code(code) {
                Some(verdict) => assert_eq!(verdict.code(), code),
                None => assert_eq!(code, 36),
            }
        }
    }

    #[test]
    fn transient_verdicts_are_not_terminal() {
        assert!(Verdict::Failed.is_transient());
        assert!(Verdict::Unknown.is_transient());
        assert!(!Verdict::PostLimit.is_transient());
        assert!(!Verdict::Success.is_transient());
    }

    #[test]
    fn serde_uses_wire_codes() {
        let encoded = serde_json::to_string(&Verdict::CommentDeletedEdit).unwrap();
        assert_eq!(encoded, "42");
        let decoded: Verdict = serde_json::from_str("28").unwrap();
        assert_eq!(decoded, Verdict::ManyTransactions);
        assert!(serde_json::from_str::<Verdict>("36").is_err());
    }
}

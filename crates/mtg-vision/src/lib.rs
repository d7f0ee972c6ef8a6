pub mod detection;
pub mod frame_change;
pub mod name_matcher;
pub mod similarity;

pub use detection::{
    parse_reply, resolve_reply, CardDetection, DetectionPolicy, DetectionResult, RecognizerReply,
    ReplyParseError, Resolution,
};
pub use frame_change::{fingerprint, is_similar, FrameChangeDetector, FrameFingerprint};
pub use name_matcher::{
    exact_lookup, fuzzy_match, MatchCandidate, MatchResult, NameMatcher, NameResolution,
    DEFAULT_MIN_SCORE, STRICT_MIN_SCORE,
};
pub use similarity::{edit_distance, edit_distance_within, similarity};

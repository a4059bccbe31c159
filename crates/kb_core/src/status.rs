use crate::verdict::Verdict;

/// Process status contract consumed by build/CI automation. This mapping is
/// the sole external contract; changing its shape requires a version bump.
pub const EXIT_PASS: i32 = 0;
pub const EXIT_WARN: i32 = 1;
pub const EXIT_FAIL: i32 = 2;
/// Engine fault: malformed scan root, unreadable filesystem, corrupted
/// baseline. Never used for content violations.
pub const EXIT_ENGINE_FAULT: i32 = 3;

pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => EXIT_PASS,
        Verdict::Warn => EXIT_WARN,
        Verdict::Fail => EXIT_FAIL,
    }
}

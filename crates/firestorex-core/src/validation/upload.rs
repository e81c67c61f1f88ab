//! Client-side upload guard.
//!
//! Classifies a candidate file before any network call. Two checks, in order:
//!
//! 1. the lower-cased file name must not end with a blocked executable/script suffix;
//! 2. the payload size must not exceed the cap (a file of exactly the cap passes).
//!
//! Only one reason is ever reported; when both checks fail the extension reason wins.
//! There is no MIME sniffing and no path inspection: this is a suffix check only.

use thiserror::Error;

use crate::constants::{BLOCKED_EXTENSIONS, MAX_UPLOAD_SIZE_BYTES};
use crate::models::CandidateFile;

/// Why a candidate was rejected. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("Security Alert: File type not allowed. This attempt has been logged.")]
    BlockedExtension { extension: &'static str },

    #[error("File size exceeds the {}MB limit.", .max / 1024 / 1024)]
    TooLarge { size: u64, max: u64 },
}

/// Outcome of validating one candidate. Exactly one of accepted / reason holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(&self) -> Option<&RejectionReason> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }
}

/// Upload guard with a fixed denylist and size cap.
#[derive(Debug, Clone, Copy)]
pub struct UploadGuard {
    max_size: u64,
    blocked_extensions: &'static [&'static str],
}

impl Default for UploadGuard {
    fn default() -> Self {
        Self {
            max_size: MAX_UPLOAD_SIZE_BYTES,
            blocked_extensions: BLOCKED_EXTENSIONS,
        }
    }
}

impl UploadGuard {
    /// Return the denylisted suffix the name ends with, if any.
    pub fn blocked_suffix(&self, file_name: &str) -> Option<&'static str> {
        let lowered = file_name.to_lowercase();
        self.blocked_extensions
            .iter()
            .copied()
            .find(|ext| lowered.ends_with(ext))
    }

    pub fn validate(&self, candidate: &CandidateFile) -> Verdict {
        self.check(&candidate.name, candidate.size())
    }

    /// Validate from a name and size alone.
    pub fn check(&self, file_name: &str, size: u64) -> Verdict {
        if let Some(extension) = self.blocked_suffix(file_name) {
            return Verdict::Rejected(RejectionReason::BlockedExtension { extension });
        }

        if size > self.max_size {
            return Verdict::Rejected(RejectionReason::TooLarge {
                size,
                max: self.max_size,
            });
        }

        Verdict::Accepted
    }
}

/// Validate a candidate against the default guard.
pub fn validate(candidate: &CandidateFile) -> Verdict {
    UploadGuard::default().validate(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, size: u64) -> Verdict {
        UploadGuard::default().check(name, size)
    }

    #[test]
    fn accepts_ordinary_document() {
        assert_eq!(check("resume.pdf", 1024), Verdict::Accepted);
    }

    #[test]
    fn rejects_every_blocked_suffix_regardless_of_size() {
        for ext in BLOCKED_EXTENSIONS {
            for size in [0, 10, MAX_UPLOAD_SIZE_BYTES + 1] {
                let verdict = check(&format!("payload{}", ext), size);
                assert!(
                    matches!(
                        verdict,
                        Verdict::Rejected(RejectionReason::BlockedExtension { .. })
                    ),
                    "{} at {} bytes should be blocked",
                    ext,
                    size
                );
            }
        }
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        let verdict = check("Setup.EXE", 10);
        assert_eq!(
            verdict,
            Verdict::Rejected(RejectionReason::BlockedExtension { extension: ".exe" })
        );
        assert!(!check("Install.Sh", 10).is_accepted());
    }

    #[test]
    fn suffix_only_no_substring_match() {
        assert!(check("notes.js.txt", 10).is_accepted());
        assert!(check("python_guide.pdf", 10).is_accepted());
        // ".json" does not end with ".js"
        assert!(check("data.json", 10).is_accepted());
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert!(check("archive.zip", 52_428_800).is_accepted());

        let verdict = check("archive.zip", 52_428_801);
        assert_eq!(
            verdict,
            Verdict::Rejected(RejectionReason::TooLarge {
                size: 52_428_801,
                max: 52_428_800
            })
        );
    }

    #[test]
    fn extension_reason_wins_when_both_fail() {
        let verdict = check("tool.exe", 60_000_000);
        assert!(matches!(
            verdict,
            Verdict::Rejected(RejectionReason::BlockedExtension { extension: ".exe" })
        ));
    }

    #[test]
    fn candidate_is_checked_by_payload_length() {
        let small = CandidateFile::new("notes.txt", None, vec![0u8; 16]);
        assert!(validate(&small).is_accepted());

        let mut swapped = small.clone();
        swapped.data = vec![0u8; MAX_UPLOAD_SIZE_BYTES as usize + 1].into();
        assert_eq!(
            validate(&swapped),
            Verdict::Rejected(RejectionReason::TooLarge {
                size: MAX_UPLOAD_SIZE_BYTES + 1,
                max: MAX_UPLOAD_SIZE_BYTES
            })
        );
    }

    #[test]
    fn rejection_messages() {
        let blocked = check("tool.exe", 10);
        assert_eq!(
            blocked.reason().unwrap().to_string(),
            "Security Alert: File type not allowed. This attempt has been logged."
        );

        let big = check("big.bin", 60_000_000);
        assert_eq!(
            big.reason().unwrap().to_string(),
            "File size exceeds the 50MB limit."
        );
        assert!(Verdict::Accepted.reason().is_none());
    }
}

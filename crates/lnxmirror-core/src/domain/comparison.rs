//! One-level directory comparison result
//!
//! Produced fresh for every directory pair visited during a pass. Names are
//! kept in ordered sets so iteration is deterministic (and log output stable)
//! regardless of the order the OS lists directory entries in.

use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::OsString,
    fmt,
};

/// Why a source entry is left out of the mirror
///
/// Symbolic links to regular files are followed and mirrored as files. Every
/// other link is skipped so the walk can never loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Link whose target is a directory
    DirectoryLink,
    /// Link whose target does not exist
    DanglingLink,
    /// Socket, FIFO, device node, or a link to one
    SpecialFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::DirectoryLink => "symbolic link to a directory is not followed",
            SkipReason::DanglingLink => "dangling symbolic link",
            SkipReason::SpecialFile => "special file is not mirrored",
        })
    }
}

/// Partition of the immediate children of a source/replica directory pair
///
/// Every name appears in at most one set. Names that are byte-identical on
/// both sides appear in none. Names whose metadata or content could not be
/// read land in `unreadable` together with the failure reason. Source
/// entries that are not mirrored are listed in `skipped`; the same name may
/// also be right-only when the replica holds something under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    /// Subdirectories present on both sides
    pub common_dirs: BTreeSet<OsString>,
    /// Entries present only in the source
    pub left_only: BTreeSet<OsString>,
    /// Entries present only in the replica
    pub right_only: BTreeSet<OsString>,
    /// Regular files present on both sides whose content differs
    pub diff_files: BTreeSet<OsString>,
    /// Names that are a file on one side and a directory on the other
    pub type_mismatch: BTreeSet<OsString>,
    /// Names that could not be classified, with the reason
    pub unreadable: BTreeMap<OsString, String>,
    /// Source entries left out of the mirror
    pub skipped: BTreeMap<OsString, SkipReason>,
}

impl ComparisonResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing at this level requires a mutation
    ///
    /// Common subdirectories still need to be visited and unreadable names
    /// cannot be acted on, so neither is considered here.
    pub fn is_settled(&self) -> bool {
        self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.diff_files.is_empty()
            && self.type_mismatch.is_empty()
    }

    /// Checks that no name was classified into more than one set
    ///
    /// `skipped` describes the source side only and is not part of the
    /// partition.
    pub fn is_disjoint(&self) -> bool {
        let sets = [
            &self.common_dirs,
            &self.left_only,
            &self.right_only,
            &self.diff_files,
            &self.type_mismatch,
        ];
        let total: usize = sets.iter().map(|s| s.len()).sum::<usize>() + self.unreadable.len();
        let union: BTreeSet<&OsString> = sets
            .iter()
            .flat_map(|s| s.iter())
            .chain(self.unreadable.keys())
            .collect();
        union.len() == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_settled_and_disjoint() {
        let result = ComparisonResult::new();
        assert!(result.is_settled());
        assert!(result.is_disjoint());
    }

    #[test]
    fn test_common_dirs_do_not_unsettle() {
        let mut result = ComparisonResult::new();
        result.common_dirs.insert("docs".into());
        assert!(result.is_settled());
    }

    #[test]
    fn test_overlap_detected() {
        let mut result = ComparisonResult::new();
        result.left_only.insert("a.txt".into());
        result.diff_files.insert("a.txt".into());
        assert!(!result.is_disjoint());
        assert!(!result.is_settled());
    }

    #[test]
    fn test_unreadable_counts_toward_disjointness() {
        let mut result = ComparisonResult::new();
        result.right_only.insert("x".into());
        result
            .unreadable
            .insert("x".into(), "Permission denied".to_string());
        assert!(!result.is_disjoint());

        result.right_only.clear();
        assert!(result.is_disjoint());
        assert!(result.is_settled());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut result = ComparisonResult::new();
        result.left_only.insert("b".into());
        result.left_only.insert("a".into());
        result.left_only.insert("c".into());
        let names: Vec<_> = result.left_only.iter().cloned().collect();
        assert_eq!(names, vec![OsString::from("a"), "b".into(), "c".into()]);
    }

    #[test]
    fn test_skipped_is_outside_the_partition() {
        let mut result = ComparisonResult::new();
        result.right_only.insert("link".into());
        result.skipped.insert("link".into(), SkipReason::DirectoryLink);
        assert!(result.is_disjoint());
        assert_eq!(
            SkipReason::DanglingLink.to_string(),
            "dangling symbolic link"
        );
    }
}

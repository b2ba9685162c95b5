//! Turning a repository reference into a fetchable archive locator

const ARCHIVE_SEGMENT: &str = "archive/";
const TARBALL_SUFFIX: &str = ".tar.gz";
const DEFAULT_BRANCH_ARCHIVE: &str = "archive/master.tar.gz";

/// Check whether a reference already points at a branch or tag tarball
pub fn is_archive_locator(reference: &str) -> bool {
    reference
        .find(ARCHIVE_SEGMENT)
        .map(|idx| &reference[idx + ARCHIVE_SEGMENT.len()..])
        .is_some_and(|rest| rest.len() > TARBALL_SUFFIX.len() && rest.contains(TARBALL_SUFFIX))
}

/// Canonical archive locator for a repository reference.
///
/// Archive locators pass through unchanged; a bare repository URL gets the
/// `master` branch tarball appended. The caller guarantees `reference` is
/// non-empty.
pub fn normalize(reference: &str) -> String {
    if is_archive_locator(reference) {
        return reference.to_string();
    }

    if reference.ends_with('/') {
        format!("{}{}", reference, DEFAULT_BRANCH_ARCHIVE)
    } else {
        format!("{}/{}", reference, DEFAULT_BRANCH_ARCHIVE)
    }
}

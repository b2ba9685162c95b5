//! Unpacking downloaded archives into the project tree
//!
//! Repository snapshots wrap everything in one top-level directory
//! (`theme-master/...`); that directory is stripped so the contents land
//! directly in the destination. Links are kept only when they resolve
//! inside the destination.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use zip::ZipArchive;

/// Archive formats we know how to unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from the leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Unpack an archive into `dest`, returning the number of files written
pub fn unpack(bytes: &[u8], dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    match ArchiveFormat::sniff(bytes) {
        Some(ArchiveFormat::TarGz) => unpack_tarball(bytes, dest),
        Some(ArchiveFormat::Zip) => unpack_zip(bytes, dest),
        None => anyhow::bail!("Unrecognized archive format (expected .tar.gz or .zip)"),
    }
}

/// Path of an entry relative to the destination, without the top-level
/// directory. `Ok(None)` for the top-level directory itself.
fn strip_top_level(path: &Path) -> Result<Option<PathBuf>> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        None => return Ok(None),
        Some(_) => anyhow::bail!("Archive entry escapes the destination: {}", path.display()),
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => anyhow::bail!("Archive entry escapes the destination: {}", path.display()),
        }
    }

    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Where a symlink at `relative` (inside the destination) would point,
/// relative to the destination. Fails when the link leaves it.
fn resolve_symlink(relative: &Path, link: &Path) -> Result<PathBuf> {
    let escapes = || {
        anyhow::anyhow!(
            "Archive link escapes the destination: {} -> {}",
            relative.display(),
            link.display()
        )
    };

    let mut resolved: Vec<_> = relative
        .parent()
        .map(|parent| parent.components().collect())
        .unwrap_or_default();
    for component in link.components() {
        match component {
            Component::Normal(_) => resolved.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop().ok_or_else(escapes)?;
            }
            Component::RootDir | Component::Prefix(_) => return Err(escapes()),
        }
    }
    Ok(resolved.iter().collect())
}

fn unpack_tarball(bytes: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = tar::Archive::new(GzDecoder::new(Cursor::new(bytes)));
    let root = dest
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dest.display()))?;
    let mut written = 0;

    for entry in archive.entries().context("Failed to read tarball")? {
        let mut entry = entry.context("Failed to read tarball entry")?;

        // Metadata records (GitHub adds a pax_global_header)
        if matches!(
            entry.header().entry_type(),
            EntryType::XGlobalHeader | EntryType::XHeader
        ) {
            continue;
        }

        let path = entry.path().context("Invalid path in tarball")?.into_owned();
        let Some(relative) = strip_top_level(&path)? else {
            continue;
        };

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            // An earlier link may have redirected the parent
            let resolved = parent
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", parent.display()))?;
            if !resolved.starts_with(&root) {
                anyhow::bail!("Archive entry escapes the destination: {}", path.display());
            }
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::Symlink => {
                let link = entry
                    .link_name()
                    .context("Invalid link in tarball")?
                    .ok_or_else(|| anyhow::anyhow!("Symlink without a target: {}", path.display()))?;
                resolve_symlink(&relative, &link)?;
            }
            EntryType::Link => {
                // Hard links name another entry of the same archive
                let link = entry
                    .link_name()
                    .context("Invalid link in tarball")?
                    .ok_or_else(|| anyhow::anyhow!("Hard link without a target: {}", path.display()))?
                    .into_owned();
                let source = strip_top_level(&link)?.ok_or_else(|| {
                    anyhow::anyhow!("Hard link to the archive root: {}", path.display())
                })?;
                std::fs::hard_link(dest.join(&source), &target)
                    .with_context(|| format!("Failed to link {}", target.display()))?;
                written += 1;
                continue;
            }
            _ => {}
        }

        entry
            .unpack(&target)
            .with_context(|| format!("Failed to unpack {}", target.display()))?;

        if entry_type.is_file() {
            written += 1;
        }
    }

    Ok(written)
}

fn unpack_zip(bytes: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Failed to read zip archive")?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = file
            .enclosed_name()
            .ok_or_else(|| anyhow::anyhow!("Archive entry escapes the destination: {}", file.name()))?;
        let Some(relative) = strip_top_level(&path)? else {
            continue;
        };

        let target = dest.join(&relative);
        if file.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut out = std::fs::File::create(&target)
            .with_context(|| format!("Failed to write file: {}", target.display()))?;
        std::io::copy(&mut file, &mut out)
            .with_context(|| format!("Failed to write file: {}", target.display()))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a gzip tarball whose entries live under `top/`
    pub(crate) fn tarball(top: &str, files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{}/{}", top, path), content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Build a gzip tarball of link entries (`path`, `target`, `kind`)
    fn link_tarball(files: &[(&str, &str)], links: &[(&str, &str, EntryType)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        for (path, target, kind) in links {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(*kind);
            header.set_size(0);
            header.set_mode(0o777);
            header.set_link_name(target).unwrap();
            header.set_cksum();
            builder
                .append_data(&mut header, path, std::io::empty())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (path, content) in entries {
                zip.start_file(*path, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(
            ArchiveFormat::sniff(&tarball("a", &[("x", "1")])),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::sniff(&zip_archive(&[("a/x", "1")])),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(ArchiveFormat::sniff(b"<html>"), None);
    }

    #[test]
    fn test_tarball_top_level_is_stripped() {
        let dir = TempDir::new().unwrap();
        let bytes = tarball(
            "WordPress-6.4",
            &[
                ("index.php", "<?php"),
                ("wp-content/themes/twentyten/style.css", "/* */"),
            ],
        );

        let written = unpack(&bytes, dir.path()).unwrap();

        assert_eq!(written, 2);
        assert!(dir.path().join("index.php").is_file());
        assert!(dir
            .path()
            .join("wp-content/themes/twentyten/style.css")
            .is_file());
        assert!(!dir.path().join("WordPress-6.4").exists());
    }

    #[test]
    fn test_zip_top_level_is_stripped() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_archive(&[("theme-master/style.css", "body {}")]);

        let written = unpack(&bytes, dir.path()).unwrap();

        assert_eq!(written, 1);
        let content = std::fs::read_to_string(dir.path().join("style.css")).unwrap();
        assert_eq!(content, "body {}");
    }

    #[test]
    fn test_zip_entry_escaping_destination_is_rejected() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_archive(&[("theme/../../evil.txt", "boom")]);

        assert!(unpack(&bytes, dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_destination_is_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let dest = dir.path().join("theme");
        let target = outside.path().to_string_lossy().into_owned();
        let mut bytes = link_tarball(&[], &[("top/link", &target, EntryType::Symlink)]);

        assert!(unpack(&bytes, &dest).is_err());

        bytes = link_tarball(&[], &[("top/link", "../../..", EntryType::Symlink)]);
        assert!(unpack(&bytes, &dest).is_err());
        assert!(std::fs::read_dir(outside.path()).unwrap().next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_redirected_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let dest = dir.path().join("theme");
        std::fs::create_dir_all(&dest).unwrap();
        std::os::unix::fs::symlink(outside.path(), dest.join("link")).unwrap();
        let bytes = tarball("top", &[("link/evil.txt", "boom")]);

        assert!(unpack(&bytes, &dest).is_err());
        assert!(!outside.path().join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_links_inside_destination_are_kept() {
        let dir = TempDir::new().unwrap();
        let bytes = link_tarball(
            &[("top/css/style.css", "body {}")],
            &[
                ("top/style.css", "css/style.css", EntryType::Symlink),
                ("top/copy.css", "top/css/style.css", EntryType::Link),
            ],
        );

        let written = unpack(&bytes, dir.path()).unwrap();

        assert_eq!(written, 2);
        let via_symlink = std::fs::read_to_string(dir.path().join("style.css")).unwrap();
        assert_eq!(via_symlink, "body {}");
        let via_hard_link = std::fs::read_to_string(dir.path().join("copy.css")).unwrap();
        assert_eq!(via_hard_link, "body {}");
    }

    #[test]
    fn test_hard_link_out_of_destination_is_rejected() {
        let dir = TempDir::new().unwrap();
        let bytes = link_tarball(&[], &[("top/copy", "top/../../secret", EntryType::Link)]);

        assert!(unpack(&bytes, dir.path()).is_err());
    }

    #[test]
    fn test_resolve_symlink() {
        assert_eq!(
            resolve_symlink(Path::new("a/b/link"), Path::new("../c")).unwrap(),
            PathBuf::from("a/c")
        );
        assert!(resolve_symlink(Path::new("link"), Path::new("../x")).is_err());
        assert!(resolve_symlink(Path::new("a/link"), Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = unpack(b"not an archive", dir.path()).unwrap_err();
        assert!(err.to_string().contains("Unrecognized archive format"));
    }

    #[test]
    fn test_strip_top_level() {
        assert_eq!(strip_top_level(Path::new("top")).unwrap(), None);
        assert_eq!(
            strip_top_level(Path::new("top/a/b.txt")).unwrap(),
            Some(PathBuf::from("a/b.txt"))
        );
        assert!(strip_top_level(Path::new("top/../x")).is_err());
        assert!(strip_top_level(Path::new("/abs/x")).is_err());
    }
}

//! Naming strategies for stored files.
//!
//! A [`NamingStrategy`] turns the client-supplied name of an uploaded file
//! into the name it is stored under. A [`DirectoryStrategy`] decides which
//! directory inside the backend the stored name lands in.

use std::path::Path;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::{join_path, remote_key};

const DEFAULT_HASH_LENGTH: usize = 32;
const DEFAULT_ID_PREFIX_CHARS: usize = 8;
const FALLBACK_NAME: &str = "unnamed";

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}

fn default_id_prefix_chars() -> usize {
    DEFAULT_ID_PREFIX_CHARS
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Keep the client's original file name.
    #[default]
    Original,
    /// Reuse the name already recorded on the mapping, if any.
    Preassigned,
    /// Random UUID plus the original extension.
    Uniqid,
    /// Truncated SHA-256 of random bytes plus the original extension.
    /// `length` is capped at 64, the hex length of the digest.
    Hash {
        #[serde(default = "default_hash_length")]
        length: usize,
    },
}

impl NamingStrategy {
    pub fn name(&self, original_name: &str, preassigned: Option<&str>) -> String {
        match self {
            NamingStrategy::Original => sanitize(original_name),
            NamingStrategy::Preassigned => match preassigned.filter(|n| !n.is_empty()) {
                Some(name) => name.to_string(),
                None => sanitize(original_name),
            },
            NamingStrategy::Uniqid => {
                with_extension(Uuid::new_v4().simple().to_string(), original_name)
            }
            NamingStrategy::Hash { length } => {
                let mut seed = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut seed);
                let mut digest = hex::encode(Sha256::digest(seed));
                digest.truncate((*length).max(1));
                with_extension(digest, original_name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryStrategy {
    /// Store at the backend root.
    #[default]
    Flat,
    /// Store under a fixed directory.
    Fixed { dir: String },
    /// Store under the first `chars` characters of the owning object's id.
    IdPrefix {
        #[serde(default = "default_id_prefix_chars")]
        chars: usize,
    },
}

impl DirectoryStrategy {
    /// Remote path for `name` stored on behalf of `object_id`.
    pub fn path_for(&self, object_id: &str, name: &str) -> String {
        match self {
            DirectoryStrategy::Flat => join_path(&[name]),
            DirectoryStrategy::Fixed { dir } => join_path(&[dir, name]),
            DirectoryStrategy::IdPrefix { chars } => remote_key("", object_id, *chars, name),
        }
    }
}

/// Reduce a client-supplied name to its final path component.
fn sanitize(original_name: &str) -> String {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    match name {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        other => other.to_string(),
    }
}

fn with_extension(stem: String, original_name: &str) -> String {
    let ext = Path::new(&sanitize(original_name))
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_keeps_client_name() {
        let name = NamingStrategy::Original.name("originalName.txt", Some("test.txt"));
        assert_eq!(name, "originalName.txt");
    }

    #[test]
    fn test_original_strips_directories() {
        assert_eq!(NamingStrategy::Original.name("../../etc/passwd", None), "passwd");
        assert_eq!(NamingStrategy::Original.name("C:\\Users\\me\\cv.pdf", None), "cv.pdf");
        assert_eq!(NamingStrategy::Original.name("dir/", None), "unnamed");
    }

    #[test]
    fn test_preassigned_falls_back_to_original() {
        let s = NamingStrategy::Preassigned;
        assert_eq!(s.name("originalName.txt", Some("test.txt")), "test.txt");
        assert_eq!(s.name("originalName.txt", Some("")), "originalName.txt");
        assert_eq!(s.name("originalName.txt", None), "originalName.txt");
    }

    #[test]
    fn test_uniqid_keeps_lowercase_extension() {
        let name = NamingStrategy::Uniqid.name("Photo.JPG", None);
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 32 + 4);
        assert_ne!(name, NamingStrategy::Uniqid.name("Photo.JPG", None));
    }

    #[test]
    fn test_hash_respects_length() {
        let name = NamingStrategy::Hash { length: 10 }.name("archive.tar.gz", None);
        assert_eq!(name.len(), 10 + 3);
        assert!(name.ends_with(".gz"));

        let bare = NamingStrategy::Hash { length: 16 }.name("README", None);
        assert_eq!(bare.len(), 16);
        assert!(bare.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_directory_paths() {
        assert_eq!(DirectoryStrategy::Flat.path_for("42", "a.txt"), "a.txt");
        let fixed = DirectoryStrategy::Fixed { dir: "/docs/".into() };
        assert_eq!(fixed.path_for("42", "a.txt"), "docs/a.txt");
        let prefixed = DirectoryStrategy::IdPrefix { chars: 2 };
        assert_eq!(prefixed.path_for("c0ffee", "a.txt"), "c0/a.txt");
    }

    #[test]
    fn test_strategies_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            namer: NamingStrategy,
            directory: DirectoryStrategy,
        }
        let h: Holder = toml::from_str(
            r#"
namer = { kind = "hash" }
directory = { kind = "id_prefix" }
"#,
        )
        .unwrap();
        assert_eq!(h.namer, NamingStrategy::Hash { length: 32 });
        assert_eq!(h.directory, DirectoryStrategy::IdPrefix { chars: 8 });
    }
}

use crate::errors::{LectureError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const REPLACEMENT: char = '_';

/// Makes a remote name safe to use as a single path component.
/// Path separators and whitespace become `_`, everything else is kept.
pub fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}

/// Local directory name for a remote folder. An alias wins over the folder's own name.
/// Only separators are rewritten, so a folder literally named `..` maps to the parent of the output dir.
pub fn folder_dir_name(folder_name: &str, aliases: &HashMap<String, String>) -> String {
    match aliases.get(folder_name) {
        Some(alias) => alias.to_owned(),
        None => normalize(folder_name),
    }
}

/// Resolves (and creates, parents included) the directory a folder's sessions are saved to.
#[tracing::instrument(skip(aliases))]
pub async fn resolve_folder_dir(
    output_dir: &Path,
    folder_name: &str,
    aliases: &HashMap<String, String>,
) -> Result<PathBuf> {
    let dir = output_dir.join(folder_dir_name(folder_name, aliases));
    if let Err(e) = fs::create_dir_all(&dir).await {
        tracing::error!("Failed to create folder directory {}", dir.to_string_lossy());
        return Err(LectureError::file_op(&dir, e));
    }
    Ok(dir)
}

/// `<dest_dir>/<normalized name>.mp4`, or `<dest_dir>/<normalized name>_<index>.mp4` for streams.
pub fn session_file(dest_dir: &Path, session_name: &str, stream_index: Option<usize>) -> PathBuf {
    let f_name = match stream_index {
        None => format!("{}.mp4", normalize(session_name)),
        Some(i) => format!("{}_{}.mp4", normalize(session_name), i),
    };
    dest_dir.join(f_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_separators() {
        assert_eq!(normalize("A/B"), "A_B");
        assert_eq!(normalize("Lecture 1/Intro"), "Lecture_1_Intro");
        assert_eq!(normalize(r"week\2"), "week_2");
        assert_eq!(normalize("Intro"), "Intro");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_never_yields_separator() {
        for name in ["../../etc/passwd", "a//b", "/", "x\\y/z", "Über/Straße 3"] {
            let normalized = normalize(name);
            assert!(!normalized.contains('/'), "{normalized}");
            assert!(!normalized.contains('\\'), "{normalized}");
            assert_eq!(normalized.chars().count(), name.chars().count());
        }
    }

    #[test]
    fn test_alias_precedence() {
        let aliases = HashMap::from([("CS101".to_string(), "cs".to_string())]);
        assert_eq!(folder_dir_name("CS101", &aliases), "cs");
        assert_eq!(folder_dir_name("MATH 200/A", &aliases), "MATH_200_A");
    }

    #[test]
    fn test_dot_dot_folder_name_is_kept() {
        let aliases = HashMap::new();
        assert_eq!(folder_dir_name("..", &aliases), "..");
        let aliases = HashMap::from([("..".to_string(), "parent".to_string())]);
        assert_eq!(folder_dir_name("..", &aliases), "parent");
    }

    #[test]
    fn test_session_file_names() {
        let dir = Path::new("/out/cs");
        assert_eq!(
            session_file(dir, "Lecture 1/Intro", None),
            PathBuf::from("/out/cs/Lecture_1_Intro.mp4")
        );
        assert_eq!(
            session_file(dir, "Lecture 1/Intro", Some(1)),
            PathBuf::from("/out/cs/Lecture_1_Intro_1.mp4")
        );
    }

    #[tokio::test]
    async fn test_resolve_folder_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let output_dir = tmp.path().join("not").join("yet");
        let aliases = HashMap::new();
        let dir = resolve_folder_dir(&output_dir, "CS101", &aliases)
            .await
            .unwrap();
        assert_eq!(dir, output_dir.join("CS101"));
        assert!(dir.is_dir());
    }
}

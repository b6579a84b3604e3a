//! Mapping between logical adapter paths and absolute MFS paths

use crate::error::ValidationError;

/// Prefixes logical paths with the adapter root
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    /// Normalized root: empty, or `segment/.../` without a leading separator
    prefix: String,
}

impl PathPrefixer {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        Self {
            prefix: if prefix.is_empty() {
                String::new()
            } else {
                format!("{}/", prefix)
            },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn prefix_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    /// Normalized logical path, relative to the adapter root
    pub fn relative(&self, path: &str) -> Result<String, ValidationError> {
        normalize(path)
    }

    /// Absolute MFS path for a logical path; `.` and `..` are resolved and
    /// may not climb above the root
    pub fn location(&self, path: &str) -> Result<String, ValidationError> {
        let relative = normalize(path)?;
        Ok(format!("/{}", self.prefix_path(&relative).trim_matches('/')))
    }
}

/// Lexically resolve `.`/`..` and drop empty segments
fn normalize(path: &str) -> Result<String, ValidationError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ValidationError::InvalidPath(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_without_prefix() {
        let prefixer = PathPrefixer::new("");

        assert_eq!(prefixer.location("/some/deep/nested/").unwrap(), "/some/deep/nested");
        assert_eq!(prefixer.location("path.txt").unwrap(), "/path.txt");
        assert_eq!(prefixer.location("").unwrap(), "/");
        assert_eq!(prefixer.location("a//b/./c").unwrap(), "/a/b/c");
    }

    #[test]
    fn test_location_with_prefix() {
        let prefixer = PathPrefixer::new("/root/");

        assert_eq!(prefixer.prefix(), "root/");
        assert_eq!(prefixer.location("a/b.txt").unwrap(), "/root/a/b.txt");
        assert_eq!(prefixer.location("/").unwrap(), "/root");
        assert_eq!(prefixer.location("a/../b").unwrap(), "/root/b");
    }

    #[test]
    fn test_location_rejects_escape() {
        let prefixer = PathPrefixer::new("root");
        assert_eq!(
            prefixer.location("../etc"),
            Err(ValidationError::InvalidPath("../etc".into()))
        );
    }

    #[test]
    fn test_relative() {
        let prefixer = PathPrefixer::new("root");

        assert_eq!(prefixer.relative("/a/./b/").unwrap(), "a/b");
        assert_eq!(prefixer.relative("/").unwrap(), "");
        assert!(prefixer.relative("a/../..").is_err());
    }
}

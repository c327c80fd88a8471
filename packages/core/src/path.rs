//! Mount-relative paths with traversal rejection.

use std::fmt;

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A `..` component would escape the mount root.
    Traversal { path: String, position: usize },
    /// A path component contains a character that cannot be sent to a mount.
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Traversal { path, position } => {
                write!(
                    f,
                    "upward traversal at position {} in '{}' is not allowed",
                    position, path
                )
            }
            PathError::InvalidComponent {
                component,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid path component '{}' at position {}: {}",
                    component, position, message
                )
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A validated path relative to a mount root.
///
/// Parsing never produces a path that points above the root: `..` is
/// rejected outright rather than resolved, and `.` and empty components are
/// dropped. Whether the input text ended in `/` is remembered, since some
/// mounts use it as a hint that the caller means a directory.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VfsPath {
    components: Vec<String>,
    trailing_separator: bool,
}

impl VfsPath {
    /// Parse a path string.
    ///
    /// # Path Syntax
    ///
    /// - Components are separated by `/`
    /// - A leading `/` is ignored; every path is relative to its mount
    /// - Empty and `.` components are dropped
    /// - `..` is rejected with [`PathError::Traversal`]
    /// - `\` and NUL are rejected with [`PathError::InvalidComponent`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remotefs_core::VfsPath;
    ///
    /// let path = VfsPath::parse("models/./tree.bam").unwrap();
    /// assert_eq!(path.to_string(), "models/tree.bam");
    ///
    /// assert!(VfsPath::parse("models/../../etc/passwd").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let mut components = Vec::new();
        for (i, component) in s.split('/').enumerate() {
            match component {
                "" | "." => continue,
                ".." => {
                    return Err(PathError::Traversal {
                        path: s.to_string(),
                        position: i,
                    })
                }
                _ => {
                    Self::validate_component(component, i)?;
                    components.push(component.to_string());
                }
            }
        }

        let trailing_separator = !components.is_empty() && s.ends_with('/');
        Ok(VfsPath {
            components,
            trailing_separator,
        })
    }

    /// The empty path, naming the mount root itself.
    pub fn root() -> Self {
        Self::default()
    }

    fn validate_component(component: &str, position: usize) -> Result<(), PathError> {
        if let Some(c) = component.chars().find(|c| *c == '\\' || *c == '\0') {
            return Err(PathError::InvalidComponent {
                component: component.to_string(),
                position,
                message: format!("character {:?} is not allowed", c),
            });
        }
        Ok(())
    }

    /// Check if this path is empty (the mount root).
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// True if the parsed text ended in `/`.
    pub fn has_trailing_separator(&self) -> bool {
        self.trailing_separator
    }

    /// The same components without a trailing separator.
    #[must_use]
    pub fn without_trailing_separator(&self) -> VfsPath {
        VfsPath {
            components: self.components.clone(),
            trailing_separator: false,
        }
    }

    /// The last component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Join this path with another. The result takes the trailing separator
    /// of `other`.
    #[must_use]
    pub fn join(&self, other: &VfsPath) -> VfsPath {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        VfsPath {
            components,
            trailing_separator: other.trailing_separator
                || (other.is_empty() && self.trailing_separator),
        }
    }

    /// Check if this path has the given prefix, component-wise.
    pub fn has_prefix(&self, prefix: &VfsPath) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &VfsPath) -> Option<VfsPath> {
        if self.has_prefix(prefix) {
            let components = self.components[prefix.components.len()..].to_vec();
            let trailing_separator = self.trailing_separator && !components.is_empty();
            Some(VfsPath {
                components,
                trailing_separator,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))?;
        if self.trailing_separator {
            write!(f, "/")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for VfsPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VfsPath::parse(s)
    }
}

/// Build a [`VfsPath`] from a literal, panicking if it is invalid.
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::VfsPath::parse($s).expect("invalid path literal")
    };
}

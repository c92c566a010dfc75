// Invariant: should always begin with a '.' (dot)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct FullyQualifiedName(String);

impl FullyQualifiedName {
    /// The name of a package, e.g. `.library.v1`, or `.` for the root package.
    pub fn package(package: &str) -> Self {
        Self(format!(".{}", package.trim_matches('.')))
    }

    pub fn from_type_name(type_name: &str) -> Self {
        Self(format!(".{}", type_name.trim_start_matches('.')))
    }

    pub fn path_iterator(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0[1..].split('.')
    }

    pub fn join(&self, path: &str) -> Self {
        Self(format!("{}.{}", self.0.trim_end_matches('.'), path))
    }

    /// Returns the segments of this name nested below `package`, or `None` if the name belongs
    /// to another package.
    pub fn strip_package(&self, package: &str) -> Option<Vec<&str>> {
        let mut path = self.path_iterator();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            if path.next() != Some(segment) {
                return None;
            }
        }
        Some(path.collect())
    }
}

impl AsRef<str> for FullyQualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<FullyQualifiedName> for String {
    fn from(name: FullyQualifiedName) -> String {
        name.0
    }
}

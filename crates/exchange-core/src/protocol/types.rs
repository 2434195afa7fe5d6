use serde::{Deserialize, Serialize};

/// Identifier of a resource or data object
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(pub String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Uri(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Uri(uri.to_string())
    }
}

/// Kind of node in a store's resource tree
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    UriProtocol,
    DataSpace,
    Folder,
    DataObject,
}

/// A discovered resource
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resource {
    pub uri: Uri,
    pub name: String,
    pub content_type: String,
    pub kind: ResourceKind,
    /// `None` when the store does not know
    pub children_count: Option<u32>,
    /// Microseconds since the Unix epoch
    pub last_changed: i64,
}

/// A stored data object and its serialized content
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataObject {
    pub resource: Resource,
    pub content_encoding: String,
    pub data: Vec<u8>,
}

impl Resource {
    pub fn new(uri: impl Into<Uri>, name: impl Into<String>, kind: ResourceKind) -> Self {
        Resource {
            uri: uri.into(),
            name: name.into(),
            content_type: String::new(),
            kind,
            children_count: None,
            last_changed: 0,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_children(mut self, count: u32) -> Self {
        self.children_count = Some(count);
        self
    }
}

impl DataObject {
    pub fn new(resource: Resource, data: Vec<u8>) -> Self {
        DataObject {
            resource,
            content_encoding: String::new(),
            data,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.resource.uri
    }
}

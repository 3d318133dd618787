//! Resource specifiers and the specifier string grammar

use serde::{Deserialize, Serialize};

use super::resource::ResourceId;

/// A loosely-typed reference to a resource, as accepted by the tagging
/// operations.
///
/// String specifiers follow the grammar
///
/// ```text
/// specifier := "uri:" <any-chars>        explicit URI
///            | <class> ":" <value>       first unescaped colon splits
///            | <value>                   bare value, no class
/// ```
///
/// where `\:` inside class or value decodes to a literal colon. Integers
/// reference resources by id, attribute records by whichever attributes
/// they carry, and an absent specifier (`None`) means the empty resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceSpec {
    /// No resource in this role; resolves to the empty sentinel.
    Empty,
    /// An existing resource, referenced by surrogate id.
    ById(ResourceId),
    /// A resource carrying exactly this URI.
    ByUri(String),
    /// A resource by value, optionally under a named class.
    ByClassValue {
        class: Option<String>,
        value: String,
    },
    /// A resource by an explicit attribute record.
    ByFields(ResourceFields),
}

impl ResourceSpec {
    /// Parse a specifier string.
    pub fn parse(input: &str) -> Self {
        if let Some(uri) = input.strip_prefix("uri:") {
            return ResourceSpec::ByUri(uri.to_string());
        }
        match split_unescaped_colon(input) {
            Some((class, value)) => ResourceSpec::ByClassValue {
                class: Some(unescape_colons(class)),
                value: unescape_colons(value),
            },
            None => ResourceSpec::ByClassValue {
                class: None,
                value: unescape_colons(input),
            },
        }
    }

    /// The attribute record this specifier describes, if it is
    /// attribute-shaped. `Empty`, `ById` and attribute records with no
    /// attributes set yield `None`.
    pub fn to_fields(&self) -> Option<ResourceFields> {
        match self {
            ResourceSpec::Empty | ResourceSpec::ById(_) => None,
            ResourceSpec::ByUri(uri) => Some(ResourceFields::new().with_uri(uri.clone())),
            ResourceSpec::ByClassValue { class, value } => {
                let mut fields = ResourceFields::new().with_value(value.clone());
                if let Some(name) = class {
                    fields = fields.with_class(ClassSpec::Name(name.clone()));
                }
                Some(fields)
            }
            ResourceSpec::ByFields(fields) if fields.is_unset() => None,
            ResourceSpec::ByFields(fields) => Some(fields.clone()),
        }
    }
}

impl From<ResourceId> for ResourceSpec {
    fn from(id: ResourceId) -> Self {
        ResourceSpec::ById(id)
    }
}

impl From<i64> for ResourceSpec {
    fn from(id: i64) -> Self {
        ResourceSpec::ById(ResourceId::new(id))
    }
}

impl From<i32> for ResourceSpec {
    fn from(id: i32) -> Self {
        ResourceSpec::ById(ResourceId::new(id as i64))
    }
}

impl From<&str> for ResourceSpec {
    fn from(input: &str) -> Self {
        ResourceSpec::parse(input)
    }
}

impl From<String> for ResourceSpec {
    fn from(input: String) -> Self {
        ResourceSpec::parse(&input)
    }
}

impl From<ResourceFields> for ResourceSpec {
    fn from(fields: ResourceFields) -> Self {
        ResourceSpec::ByFields(fields)
    }
}

impl<T: Into<ResourceSpec>> From<Option<T>> for ResourceSpec {
    fn from(spec: Option<T>) -> Self {
        match spec {
            Some(inner) => inner.into(),
            None => ResourceSpec::Empty,
        }
    }
}

/// A class reference inside an attribute record: the id of an existing
/// class resource, or a class name resolved through the class
/// meta-resource (and created under it on the write path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassSpec {
    Id(ResourceId),
    Name(String),
}

/// Attribute record of a resource specifier: whichever of uri, class,
/// value and content are set participate in lookup and creation. An id
/// cannot be carried here; id references use [`ResourceSpec::ById`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFields {
    pub uri: Option<String>,
    pub class: Option<ClassSpec>,
    pub value: Option<String>,
    pub content: Option<String>,
}

impl ResourceFields {
    /// Create a record with no attributes set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the uri attribute.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the class attribute.
    pub fn with_class(mut self, class: ClassSpec) -> Self {
        self.class = Some(class);
        self
    }

    /// Set the value attribute.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the content attribute.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// True when no attribute is set.
    pub fn is_unset(&self) -> bool {
        self.uri.is_none() && self.class.is_none() && self.value.is_none() && self.content.is_none()
    }
}

/// Split on the first colon not preceded by a backslash.
fn split_unescaped_colon(input: &str) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b':' && (i == 0 || bytes[i - 1] != b'\\') {
            return Some((&input[..i], &input[i + 1..]));
        }
    }
    None
}

fn unescape_colons(part: &str) -> String {
    part.replace("\\:", ":")
}

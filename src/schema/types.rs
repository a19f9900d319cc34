//! Entity schemas: collection naming, per-field rules, and references between collections.

/// Value type a schema field is cast to before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// Object id naming a document in `collection`.
    Reference { collection: &'static str },
}

#[derive(Clone, Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// Trim surrounding whitespace before length checks.
    pub trim: bool,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub fn string(name: &'static str) -> Self {
        FieldRule {
            name,
            field_type: FieldType::String,
            required: false,
            trim: false,
            max_length: None,
        }
    }

    pub fn reference(name: &'static str, collection: &'static str) -> Self {
        FieldRule {
            name,
            field_type: FieldType::Reference { collection },
            required: false,
            trim: false,
            max_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

#[derive(Clone, Debug)]
pub struct EntitySchema {
    /// Collection name: path segment under `/api`, store collection, and JSON:API `type`.
    pub collection: &'static str,
    /// Singular name used in messages ("course").
    pub kind: &'static str,
    /// Declared fields and their rules.
    pub fields: Vec<FieldRule>,
    /// Strict schemas drop undeclared keys; free-form schemas keep every sanitized key.
    pub strict: bool,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields populated with the referenced document on list and read.
    pub fn references(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.fields.iter().filter_map(|f| match f.field_type {
            FieldType::Reference { collection } => Some((f.name, collection)),
            FieldType::String => None,
        })
    }
}

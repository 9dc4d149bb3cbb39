/// The shared descriptor of a pattern.
///
/// Built once when a `pat` declaration is evaluated and shared (via `Rc`)
/// between the pattern's module value and every instance, so field lookups
/// and the instance/field-count invariant always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatDef {
    /// The pattern name.
    pub name:        String,
    /// The ordered field names, one per `var` declaration in the body.
    pub field_names: Vec<String>,
}

impl PatDef {
    /// Creates a descriptor from the pattern name and its field names.
    #[must_use]
    pub const fn new(name: String, field_names: Vec<String>) -> Self {
        Self { name, field_names }
    }

    /// The number of fields an instance carries.
    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.field_names.len()
    }

    /// Finds the position of a named field by linear scan.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|field| field == name)
    }
}

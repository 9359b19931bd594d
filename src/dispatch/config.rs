use crate::typing::ClassId;

/// What a registry classifies its queries by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchLevel {
    /// Queries are types; patterns are matched against the type the query denotes.
    Type,
    /// Queries are values; patterns are matched against the value.
    Value,
}

impl Default for DispatchLevel {
    fn default() -> DispatchLevel {
        DispatchLevel::Value
    }
}

impl std::fmt::Display for DispatchLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchLevel::Type => write!(f, "type"),
            DispatchLevel::Value => write!(f, "value"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegistryConfig {
    pub name: String,
    pub level: DispatchLevel,
    /// Origins whose arguments are never looked at: patterns and queries with one of these
    /// origins are reduced to the bare origin.
    pub isolated: Vec<ClassId>,
}

impl RegistryConfig {
    pub fn new<S: Into<String>>(name: S) -> RegistryConfig {
        RegistryConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn level(mut self, level: DispatchLevel) -> RegistryConfig {
        self.level = level;
        self
    }

    pub fn type_level(self) -> RegistryConfig {
        self.level(DispatchLevel::Type)
    }

    pub fn isolate(mut self, origin: ClassId) -> RegistryConfig {
        if !self.isolated.contains(&origin) {
            self.isolated.push(origin);
        }
        self
    }

    pub fn is_isolated(&self, origin: ClassId) -> bool {
        self.isolated.contains(&origin)
    }
}

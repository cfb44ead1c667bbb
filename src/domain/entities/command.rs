/// A recognized bot command parsed from raw message text.
///
/// `name` is the trigger token that matched; `argument` is the rest of the
/// message, trimmed, used verbatim as a collection slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub argument: String,
}

impl Command {
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }

    pub fn has_argument(&self) -> bool {
        !self.argument.is_empty()
    }
}

//! Edit state and update events.
//!
//! States are immutable. An update produces a new state that shares every untouched
//! sub-state with its predecessor (struct and union states sit behind `Rc`).
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    /// Raw text of a single-field editor, possibly invalid.
    Field(String),
    Struct(Rc<StructState>),
    Union(Rc<UnionState>),
    Void,
    /// State of a node with no editor: carries the value it was built from, if any.
    Opaque(Option<Value>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructState {
    /// One sub-state per declared field, in declaration order.
    pub fields: IndexMap<String, EditState>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnionState {
    pub current: Option<String>,
    /// Every branch that has ever been selected keeps its sub-state, so switching
    /// back restores earlier edits.
    pub branches: IndexMap<String, EditState>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Replace the text of a field editor.
    SetText(String),
    /// Route an event to one field of a struct.
    FieldUpdate { field: String, event: Box<Event> },
    /// Select a union branch; `None` clears the selection.
    Switch(Option<String>),
    /// Route an event to the currently selected union branch.
    BranchUpdate(Box<Event>),
}

impl EditState {
    pub fn field(text: impl Into<String>) -> Self {
        EditState::Field(text.into())
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            EditState::Field(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Rc<StructState>> {
        match self {
            EditState::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Rc<UnionState>> {
        match self {
            EditState::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            EditState::Field(_) => "field",
            EditState::Struct(_) => "struct",
            EditState::Union(_) => "union",
            EditState::Void => "void",
            EditState::Opaque(_) => "opaque",
        }
    }
}

impl StructState {
    pub fn get(&self, field: &str) -> Option<&EditState> {
        self.fields.get(field)
    }
}

impl UnionState {
    /// The selected branch name together with its sub-state.
    pub fn selected(&self) -> Option<(&str, Option<&EditState>)> {
        self.current
            .as_deref()
            .map(|name| (name, self.branches.get(name)))
    }
}

impl Event {
    pub fn set_text(text: impl Into<String>) -> Self {
        Event::SetText(text.into())
    }

    pub fn field(field: impl Into<String>, event: Event) -> Self {
        Event::FieldUpdate {
            field: field.into(),
            event: Box::new(event),
        }
    }

    pub fn switch(branch: impl Into<String>) -> Self {
        Event::Switch(Some(branch.into()))
    }

    pub fn branch(event: Event) -> Self {
        Event::BranchUpdate(Box::new(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builders_nest() {
        let e = Event::field("address", Event::branch(Event::set_text("x")));
        let Event::FieldUpdate { field, event } = e else {
            panic!("expected field update");
        };
        assert_eq!(field, "address");
        assert_eq!(*event, Event::BranchUpdate(Box::new(Event::SetText("x".into()))));
    }

    #[test]
    fn test_union_selected() {
        let mut u = UnionState::default();
        assert_eq!(u.selected(), None);
        u.current = Some("male".into());
        assert_eq!(u.selected(), Some(("male", None)));
        u.branches.insert("male".into(), EditState::Void);
        assert_eq!(u.selected(), Some(("male", Some(&EditState::Void))));
    }
}

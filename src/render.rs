//! Rendering, abstracted over the UI toolkit.
//!
//! The engine decides *what* to show: which fields, labels, choices and messages,
//! and how events are routed back up. A [`RenderFactory`] decides how each piece
//! looks. Every node renders to an optional fragment shown beside its label and an
//! optional fragment shown below it.
use std::fmt;
use std::rc::Rc;

use crate::adlast::TypeExpr;
use crate::customize::Operation;
use crate::error::{Error, Result};
use crate::fields::FieldFnsRef;
use crate::state::{EditState, Event, StructState};
use crate::visitor::{
    Acceptors, FieldDescriptor, FieldDetails, StructDescriptor, UnimplementedDescriptor, UnionDescriptor,
    VoidDescriptor,
};

/// Receives events raised by a rendered node, already wrapped for delivery at the
/// root of the editor.
pub type UpdateFn = Rc<dyn Fn(Event)>;

#[derive(Clone)]
pub struct RenderProps {
    pub state: EditState,
    pub disabled: bool,
    pub on_update: UpdateFn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered<T> {
    pub beside: Option<T>,
    pub below: Option<T>,
}

pub struct FieldEditorProps<'a> {
    pub texpr: &'a TypeExpr,
    pub fieldfns: &'a FieldFnsRef,
    pub text: &'a str,
    /// Result of validating `text`.
    pub error: Option<String>,
    pub disabled: bool,
    pub on_update: UpdateFn,
}

pub struct StructEditorProps<'a, T> {
    pub texpr: &'a TypeExpr,
    pub fields: Vec<StructFieldProps<T>>,
    pub disabled: bool,
}

pub struct StructFieldProps<T> {
    pub name: String,
    pub label: String,
    pub rendered: Rendered<T>,
}

pub struct UnionEditorProps<'a, T> {
    pub texpr: &'a TypeExpr,
    pub choices: Vec<Choice>,
    pub current: Option<String>,
    /// The selected branch, rendered.
    pub branch: Option<Rendered<T>>,
    pub disabled: bool,
    pub on_update: UpdateFn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub label: String,
}

pub struct UnimplementedEditorProps<'a> {
    pub texpr: &'a TypeExpr,
}

pub trait RenderFactory {
    type Fragment: 'static;

    fn render_field(&self, props: FieldEditorProps<'_>) -> Rendered<Self::Fragment>;
    fn render_struct(&self, props: StructEditorProps<'_, Self::Fragment>) -> Rendered<Self::Fragment>;
    fn render_union(&self, props: UnionEditorProps<'_, Self::Fragment>) -> Rendered<Self::Fragment>;
    fn render_void(&self) -> Rendered<Self::Fragment>;
    fn render_unimplemented(&self, props: UnimplementedEditorProps<'_>) -> Rendered<Self::Fragment>;
}

/// The render operation as an acceptor table over a factory.
pub struct RenderAcceptors<'f, F> {
    factory: &'f F,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<T> Default for Rendered<T> {
    fn default() -> Self {
        Self {
            beside: None,
            below: None,
        }
    }
}

impl<T> Rendered<T> {
    pub fn beside(fragment: T) -> Self {
        Self {
            beside: Some(fragment),
            below: None,
        }
    }

    pub fn below(fragment: T) -> Self {
        Self {
            beside: None,
            below: Some(fragment),
        }
    }
}

impl FieldEditorProps<'_> {
    pub fn set_text(&self, text: impl Into<String>) {
        (self.on_update)(Event::SetText(text.into()));
    }
}

impl<T> UnionEditorProps<'_, T> {
    pub fn select(&self, branch: Option<String>) {
        (self.on_update)(Event::Switch(branch));
    }
}

/// Render one struct field with events routed to it through the parent.
///
/// Struct overrides use this to lay out a subset or reordering of the fields.
pub fn render_struct_field<F: RenderFactory>(
    factory: &F,
    field: &FieldDetails,
    state: &StructState,
    parent: &RenderProps,
) -> Result<StructFieldProps<F::Fragment>> {
    let child = state.get(&field.name).cloned().ok_or_else(|| Error::StateMismatch {
        texpr: field.binding.texpr().clone(),
        expected: "complete struct",
    })?;
    let on_update = route(&parent.on_update, {
        let name = field.name.clone();
        move |event| Event::field(name.clone(), event)
    });
    let props = RenderProps {
        state: child,
        disabled: parent.disabled,
        on_update,
    };
    let rendered = field
        .visitor
        .visit(Operation::Render, props, &RenderAcceptors::new(factory))?;
    Ok(StructFieldProps {
        name: field.name.clone(),
        label: field.label.clone(),
        rendered,
    })
}

fn route(parent: &UpdateFn, wrap: impl Fn(Event) -> Event + 'static) -> UpdateFn {
    let parent = parent.clone();
    Rc::new(move |event| parent(wrap(event)))
}

impl<'f, F> RenderAcceptors<'f, F> {
    pub fn new(factory: &'f F) -> Self {
        Self { factory }
    }
}

impl<F: RenderFactory> Acceptors for RenderAcceptors<'_, F> {
    type Input = RenderProps;
    type Output = Rendered<F::Fragment>;

    fn accept_field(&self, props: RenderProps, desc: &FieldDescriptor) -> Result<Self::Output> {
        let text = props.state.as_field().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "field",
        })?;
        Ok(self.factory.render_field(FieldEditorProps {
            texpr: &desc.texpr,
            fieldfns: &desc.fieldfns,
            text,
            error: desc.fieldfns.validate(text),
            disabled: props.disabled,
            on_update: props.on_update.clone(),
        }))
    }

    fn accept_struct(&self, props: RenderProps, desc: &StructDescriptor) -> Result<Self::Output> {
        let state = props.state.as_struct().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "struct",
        })?;
        let fields = desc
            .fields
            .iter()
            .map(|field| render_struct_field(self.factory, field, state, &props))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.factory.render_struct(StructEditorProps {
            texpr: &desc.texpr,
            fields,
            disabled: props.disabled,
        }))
    }

    fn accept_union(&self, props: RenderProps, desc: &UnionDescriptor) -> Result<Self::Output> {
        let state = props.state.as_union().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "union",
        })?;
        let branch = match state.selected() {
            None => None,
            Some((kind, child)) => {
                let branch = desc.branch(kind).ok_or_else(|| Error::UnknownBranch {
                    texpr: desc.texpr.clone(),
                    branch: kind.to_string(),
                })?;
                let child = child.cloned().ok_or_else(|| Error::StateMismatch {
                    texpr: desc.texpr.clone(),
                    expected: "initialized branch",
                })?;
                let child_props = RenderProps {
                    state: child,
                    disabled: props.disabled,
                    on_update: route(&props.on_update, Event::branch),
                };
                Some(branch.visitor()?.visit(Operation::Render, child_props, self)?)
            }
        };
        Ok(self.factory.render_union(UnionEditorProps {
            texpr: &desc.texpr,
            choices: desc
                .branches
                .iter()
                .map(|b| Choice {
                    name: b.name.clone(),
                    label: b.label.clone(),
                })
                .collect(),
            current: state.current.clone(),
            branch,
            disabled: props.disabled,
            on_update: props.on_update.clone(),
        }))
    }

    fn accept_void(&self, _props: RenderProps, _desc: &VoidDescriptor) -> Result<Self::Output> {
        Ok(self.factory.render_void())
    }

    fn accept_unimplemented(&self, _props: RenderProps, desc: &UnimplementedDescriptor) -> Result<Self::Output> {
        Ok(self
            .factory
            .render_unimplemented(UnimplementedEditorProps { texpr: &desc.texpr }))
    }
}

impl fmt::Debug for RenderProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderProps")
            .field("state", &self.state)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

//! Plain-text render factory: draws an editor as an indented outline.
//!
//! ```text
//! Name:
//!   First: [Ann]
//!   Last: [<string>]
//! Age: [abc]  ! not a valid integer
//! Gender: Female  {female | male}
//! ```
use crate::render::{
    FieldEditorProps, RenderFactory, Rendered, StructEditorProps, UnimplementedEditorProps, UnionEditorProps,
};

#[derive(Debug, Clone, Copy)]
pub struct TextOutline {
    pub indent: usize,
}

impl Default for TextOutline {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl TextOutline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a root rendering into one block of text.
    pub fn to_text(&self, rendered: Rendered<String>) -> String {
        match (rendered.beside, rendered.below) {
            (Some(beside), Some(below)) => format!("{beside}\n{below}"),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => String::new(),
        }
    }

    fn indented(&self, block: &str) -> String {
        let pad = " ".repeat(self.indent);
        block
            .lines()
            .map(|line| format!("{pad}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RenderFactory for TextOutline {
    type Fragment = String;

    fn render_field(&self, props: FieldEditorProps<'_>) -> Rendered<String> {
        let shown = match props.text {
            "" => format!("<{}>", props.fieldfns.describe()),
            text => text.to_string(),
        };
        let mut line = match props.disabled {
            true => shown,
            false => format!("[{shown}]"),
        };
        if let Some(error) = props.error {
            line.push_str("  ! ");
            line.push_str(&error);
        }
        Rendered::beside(line)
    }

    fn render_struct(&self, props: StructEditorProps<'_, String>) -> Rendered<String> {
        let mut lines = Vec::with_capacity(props.fields.len());
        for field in props.fields {
            match field.rendered.beside {
                Some(beside) => lines.push(format!("{}: {beside}", field.label)),
                None => lines.push(format!("{}:", field.label)),
            }
            if let Some(below) = field.rendered.below {
                lines.push(self.indented(&below));
            }
        }
        if lines.is_empty() {
            return Rendered::default();
        }
        Rendered::below(lines.join("\n"))
    }

    fn render_union(&self, props: UnionEditorProps<'_, String>) -> Rendered<String> {
        let names = props
            .choices
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        let selected = props
            .current
            .as_deref()
            .and_then(|current| props.choices.iter().find(|c| c.name == current));
        let mut beside = match (selected, props.disabled) {
            (Some(choice), true) => choice.label.clone(),
            (Some(choice), false) => format!("{}  {{{names}}}", choice.label),
            (None, _) => format!("<select>  {{{names}}}"),
        };
        let mut below = None;
        if let Some(branch) = props.branch {
            if let Some(inner) = branch.beside {
                beside = format!("{beside}\n{}", self.indented(&inner));
            }
            below = branch.below;
        }
        Rendered {
            beside: Some(beside),
            below,
        }
    }

    fn render_void(&self) -> Rendered<String> {
        Rendered::default()
    }

    fn render_unimplemented(&self, props: UnimplementedEditorProps<'_>) -> Rendered<String> {
        Rendered::beside(format!("<no editor for {}>", props.texpr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adlast::texpr_string;
    use crate::fields::{primitive_field_fns, FieldFnsRef};
    use crate::render::{Choice, StructFieldProps, UpdateFn};
    use std::rc::Rc;

    fn noop() -> UpdateFn {
        Rc::new(|_| {})
    }

    #[test]
    fn test_field_shows_placeholder_and_error() {
        let outline = TextOutline::new();
        let texpr = texpr_string();
        let fns: FieldFnsRef = primitive_field_fns("Int32").unwrap();
        let rendered = outline.render_field(FieldEditorProps {
            texpr: &texpr,
            fieldfns: &fns,
            text: "",
            error: Some("not a valid integer".into()),
            disabled: false,
            on_update: noop(),
        });
        assert_eq!(rendered.beside.as_deref(), Some("[<integer>]  ! not a valid integer"));
    }

    #[test]
    fn test_nested_struct_is_indented() {
        let outline = TextOutline::new();
        let texpr = texpr_string();
        let inner = outline.render_struct(StructEditorProps {
            texpr: &texpr,
            fields: vec![StructFieldProps {
                name: "first".into(),
                label: "First".into(),
                rendered: Rendered::beside("[Ann]".to_string()),
            }],
            disabled: false,
        });
        let outer = outline.render_struct(StructEditorProps {
            texpr: &texpr,
            fields: vec![StructFieldProps {
                name: "name".into(),
                label: "Name".into(),
                rendered: inner,
            }],
            disabled: false,
        });
        assert_eq!(outline.to_text(outer), "Name:\n  First: [Ann]");
    }

    #[test]
    fn test_union_without_selection() {
        let outline = TextOutline::new();
        let texpr = texpr_string();
        let rendered = outline.render_union(UnionEditorProps {
            texpr: &texpr,
            choices: vec![
                Choice {
                    name: "female".into(),
                    label: "Female".into(),
                },
                Choice {
                    name: "male".into(),
                    label: "Male".into(),
                },
            ],
            current: None,
            branch: None,
            disabled: false,
            on_update: noop(),
        });
        assert_eq!(rendered.beside.as_deref(), Some("<select>  {female | male}"));
    }
}

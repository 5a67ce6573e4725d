//! Schema-driven value editors for ADL types.
//!
//! Given a type expression and a declaration resolver, [`create_veditor`] builds an
//! editor that can produce an initial edit state, project values into state,
//! validate and update that state, turn it back into a value, and render it
//! through any [`render::RenderFactory`].
//!
//! ```no_run
//! use std::rc::Rc;
//! use adl_veditor::{create_veditor, path_de, Customizers, Event, TypeExpr};
//!
//! let ast = path_de::load_ast_map("schemas/examples.json".as_ref())?;
//! let person: TypeExpr = "examples.Person".parse()?;
//! let editor = create_veditor(&person, Rc::new(ast), Customizers::new())?;
//! let state = editor.initial_state()?;
//! let state = editor.update(&state, Event::field("age", Event::set_text("42")))?;
//! println!("{:?}", editor.validate(&state)?);
//! # Ok::<(), adl_veditor::Error>(())
//! ```
pub mod adlast;
pub mod customize;
pub mod error;
pub mod fields;
pub mod json_binding;
pub mod outline;
pub mod path_de;
pub mod render;
pub mod resolver;
pub mod state;
pub mod tree;
pub mod veditor;
pub mod visitor;

pub use adlast::{ScopedName, TypeExpr};
pub use customize::{Customizers, Kind, Mapper, Operation, Override};
pub use error::{Error, Result};
pub use json_binding::JsonBinding;
pub use resolver::{AstMap, DeclResolver};
pub use state::{EditState, Event};
pub use veditor::{create_veditor, Checked, VEditor};
pub use visitor::{create_visitor, Visitor};

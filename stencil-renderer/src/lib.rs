//! # stencil-renderer
//!
//! Variable binding and object rendering for stencil templates.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stencil_core::types::{Template, ValueMap};
//! use stencil_renderer::{Renderer, VariableMap};
//!
//! fn render_all(template: &Template, namespace: &str, values: &ValueMap) {
//!     if let Ok(renderer) = Renderer::new() {
//!         for object in &template.objects {
//!             let vars = VariableMap::bind(template, object, namespace, values);
//!             match renderer.render(object, &vars, namespace, &[]) {
//!                 Ok(rendered) => println!("{}", rendered.reference()),
//!                 Err(e) => eprintln!("{}: {e}", object.key_in(namespace)),
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod object;

pub use context::VariableMap;
pub use engine::Renderer;
pub use error::RenderError;
pub use object::RenderedObject;

//! Product templates
//!
//! Read-only descriptions of printable products: views, mockups and the
//! printable area of each view. Includes runtime validation of untrusted
//! template JSON, the built-in demo templates, and mode-dependent loading.

pub mod catalog;
pub mod loader;
pub mod registry;
pub mod template;
pub mod validator;

pub use catalog::{LoadStatus, ProductCatalog};
pub use loader::{FileTemplateSource, TemplateLoader, TemplateSource};
pub use registry::{mug_template, phonecase_template, tshirt_template, TemplateRegistry};
pub use template::{
    Point, PrintableArea, PrintableShape, ProductTemplate, ProductType, ProductView,
};
pub use validator::{validate_template, validate_templates, DEFAULT_MIN_DPI};

//! Doctor's consultation record: the editable draft, the form that owns it,
//! and name suggestions from the reference lists.

mod draft;
mod form;
mod reference;
mod suggest;

pub use draft::*;
pub use form::*;
pub use reference::*;
pub use suggest::*;

//! Publisher side: the publish gate and the page's input form.

pub mod form;
pub mod gate;

pub use form::{PublisherForm, TargetInput};
pub use gate::PublishGate;

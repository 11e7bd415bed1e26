pub mod inspector;
pub mod model;
pub mod values;

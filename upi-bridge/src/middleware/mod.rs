pub mod payload;

pub use payload::JsonOrForm;

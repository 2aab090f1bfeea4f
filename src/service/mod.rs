pub mod event;
pub mod lifecycle;

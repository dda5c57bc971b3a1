pub mod category;
pub mod task;
pub mod view;

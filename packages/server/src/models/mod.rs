pub mod batch;
pub mod dashboard;
pub mod detection;
pub mod image;
pub mod item;
pub mod recipe;
pub mod shared;

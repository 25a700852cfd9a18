pub mod batch;
pub mod batch_event;
pub mod image;
pub mod item;
pub mod recipe;
pub mod recipe_ingredient;

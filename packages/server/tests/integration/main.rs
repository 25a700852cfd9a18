mod common;

mod batch;
mod detection;
mod recipe;

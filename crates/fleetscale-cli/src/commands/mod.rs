pub mod activity;
pub mod capacity;
pub mod settings;

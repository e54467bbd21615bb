pub mod browse;
pub mod export;
pub mod preview;
pub mod select;
pub mod subscribe;
pub mod summary;

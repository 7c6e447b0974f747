pub mod accumulate;
pub mod bridge;
pub mod scene;

pub mod animation;
pub mod camera;
pub mod characters;
pub mod constants;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod player;
pub mod rng;
pub mod scheduler;
pub mod server_protocol;
pub mod types;
pub mod world;

pub mod face_engine;
pub mod face_store;

//! Domain models shared across the database and API layers

pub mod face_tag;
pub mod person;

pub use face_tag::{FaceTag, TaggedCrop};
pub use person::{Kinship, Person};

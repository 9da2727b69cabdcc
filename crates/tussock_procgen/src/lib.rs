pub mod buffers;
pub mod card;
pub mod instance;
pub mod mesh;
pub mod path;
pub mod texture;
pub mod tube;

pub use buffers::*;
pub use card::*;
pub use instance::*;
pub use mesh::*;
pub use path::*;
pub use texture::*;
pub use tube::*;

pub mod object3d;
pub mod scene;
pub mod transform;

pub use object3d::{EditorProps, Object3D, ObjectId};
pub use scene::Scene;

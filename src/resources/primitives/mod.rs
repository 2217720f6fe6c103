pub mod box_shape;
pub mod cylinder;
pub mod grid;
pub mod plane;
pub mod points;
pub mod sphere;

pub use box_shape::create_box;
pub use cylinder::{CylinderOptions, create_cylinder};
pub use grid::{GRID_CENTER_GROUP, GRID_LINES_GROUP, create_grid};
pub use plane::create_plane;
pub use points::create_points;
pub use sphere::{SphereOptions, create_sphere};

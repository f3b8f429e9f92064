mod intersection;
mod matrix_engine;
mod resample;
mod state;
mod string_engine;
mod string_loop;

pub use intersection::{find_self_intersection, split_arcs, squared_distances, LoopArc};
pub use matrix_engine::{brane_positions, connection_strengths, hermitian_eigenvalues, MatrixEngine};
pub use resample::{resample_loop, resample_to, target_point_count};
pub use state::{MatrixState, StringState};
pub use string_engine::StringEngine;
pub use string_loop::{StringLoop, Vec3};

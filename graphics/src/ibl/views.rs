//! Capture cameras for cubemap bakes.

use prism_core::math::{Mat4, mat4_to_cols_array_2d, perspective_rh};

use crate::types::CubeFace;

const CAPTURE_FOV_DEGREES: f32 = 90.0;
const CAPTURE_NEAR: f32 = 0.1;
const CAPTURE_FAR: f32 = 10.0;

/// Projection shared by all six capture cameras.
pub fn capture_projection() -> Mat4 {
    perspective_rh(CAPTURE_FOV_DEGREES.to_radians(), 1.0, CAPTURE_NEAR, CAPTURE_FAR)
}

/// Column-major view-projection of the capture camera for each face, in
/// layer order.
pub fn capture_view_projections() -> [(CubeFace, [[f32; 4]; 4]); 6] {
    let projection = capture_projection();
    CubeFace::ALL.map(|face| {
        (
            face,
            mat4_to_cols_array_2d(&(projection * face.view_matrix())),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::math::Vec4;

    #[test]
    fn face_centre_projects_to_ndc_origin() {
        let projection = capture_projection();
        for face in CubeFace::ALL {
            let forward = face.forward();
            let clip = projection * face.view_matrix() * Vec4::new(forward.x, forward.y, forward.z, 1.0);
            assert!((clip.x / clip.w).abs() < 1e-5, "{}", face.name());
            assert!((clip.y / clip.w).abs() < 1e-5, "{}", face.name());
        }
    }

    #[test]
    fn views_cover_every_face_once() {
        let views = capture_view_projections();
        for (layer, (face, _)) in views.iter().enumerate() {
            assert_eq!(face.layer() as usize, layer);
        }
        // +X sees +Y at the bottom of its image
        let (_, view_proj) = views[0];
        let m = Mat4::from_fn(|r, c| view_proj[c][r]);
        let up = m * Vec4::new(1.0, 0.5, 0.0, 1.0);
        assert!(up.y / up.w < 0.0);
    }
}

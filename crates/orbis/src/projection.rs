//! # Projection — Object Space to Window Pixels
//!
//! Stateless helpers that push a point through the model and projection
//! matrices and the viewport transform, the way `gluProject` does:
//!
//! ```text
//!   object ──model──▶ eye ──proj──▶ clip (x, y, z, w)
//!                                     │  ÷ w
//!                                     ▼
//!                                    NDC ──viewport──▶ window (x, y)
//! ```
//!
//! [`project`] deliberately returns the clip-space **w** as its third
//! component instead of a normalized depth. For a perspective matrix, w is the
//! eye-space distance in front of the camera. The overlay code uses it both to
//! cull markers on the far side of the planet and to scale markers with
//! distance. [`project_ndc`] returns the conventional `[0, 1]` depth for round
//! trips through [`unproject`].
//!
//! Window coordinates are bottom-up (origin at the viewport's lower-left).
//! [`screen_location`] flips Y for top-down input coordinates.

use crate::math::{Mat4, Vec3, Vec4, Viewport};

/// Clip-space `w` magnitudes below this are treated as 1 to avoid dividing by
/// (nearly) zero.
pub const W_EPSILON: f32 = 1e-4;

/// Multiply a column-major 4×4 matrix by a column vector.
///
/// `out[i] = Σₖ v[k] · m[k·4 + i]`, the layout OpenGL uses for `float[16]`
/// matrices and the one [`Mat4::to_cols_array`] produces.
pub fn mult_matrix_vec4(m: &[f32; 16], v: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (i, o) in out.iter_mut().enumerate() {
        *o = v[0] * m[i] + v[1] * m[4 + i] + v[2] * m[8 + i] + v[3] * m[12 + i];
    }
    out
}

fn to_clip(point: Vec3, model: &Mat4, proj: &Mat4) -> [f32; 4] {
    let eye = mult_matrix_vec4(&model.to_cols_array(), [point.x, point.y, point.z, 1.0]);
    mult_matrix_vec4(&proj.to_cols_array(), eye)
}

fn guarded_w(w: f32) -> f32 {
    if w.abs() < W_EPSILON { 1.0 } else { w }
}

fn to_window(ndc_x: f32, ndc_y: f32, viewport: &Viewport) -> (f32, f32) {
    (
        (ndc_x * 0.5 + 0.5) * viewport.width as f32 + viewport.x as f32,
        (ndc_y * 0.5 + 0.5) * viewport.height as f32 + viewport.y as f32,
    )
}

/// Project `point` to bottom-up window coordinates.
///
/// Returns `(x, y, w)` where `w` is the clip-space w after the near-zero
/// guard (see [`W_EPSILON`]).
pub fn project(point: Vec3, model: &Mat4, proj: &Mat4, viewport: &Viewport) -> Vec3 {
    let clip = to_clip(point, model, proj);
    let w = guarded_w(clip[3]);
    let (x, y) = to_window(clip[0] / w, clip[1] / w, viewport);
    Vec3::new(x, y, w)
}

/// Project `point` to bottom-up window coordinates with depth in `[0, 1]`.
pub fn project_ndc(point: Vec3, model: &Mat4, proj: &Mat4, viewport: &Viewport) -> Vec3 {
    let clip = to_clip(point, model, proj);
    let w = guarded_w(clip[3]);
    let (x, y) = to_window(clip[0] / w, clip[1] / w, viewport);
    Vec3::new(x, y, clip[2] / w * 0.5 + 0.5)
}

/// Project `point` and flip Y into top-down screen coordinates.
///
/// The third component is the clip-space w, as in [`project`].
pub fn screen_location(point: Vec3, model: &Mat4, proj: &Mat4, viewport: &Viewport) -> Vec3 {
    let p = project(point, model, proj, viewport);
    Vec3::new(p.x, viewport.height as f32 - p.y, p.z)
}

/// Map a bottom-up window point with `[0, 1]` depth back to object space.
///
/// Returns `None` when `proj · model` is singular or the result lands at
/// infinity.
pub fn unproject(window: Vec3, model: &Mat4, proj: &Mat4, viewport: &Viewport) -> Option<Vec3> {
    let m = *proj * *model;
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let ndc = Vec4::new(
        (window.x - viewport.x as f32) / viewport.width.max(1) as f32 * 2.0 - 1.0,
        (window.y - viewport.y as f32) / viewport.height.max(1) as f32 * 2.0 - 1.0,
        window.z * 2.0 - 1.0,
        1.0,
    );
    let obj = m.inverse() * ndc;
    if obj.w == 0.0 {
        return None;
    }
    Some(obj.truncate() / obj.w)
}

//! Ray/sphere geometry and raymarch interval classification.

use glam::Vec3;

/// Lowest altitude, in kilometers, at which a viewer is placed for LUT
/// parameterization. Keeps the viewer strictly outside the ground sphere so
/// upward rays do not register a ground hit at `t = 0`.
pub const MIN_VIEW_ALTITUDE_KM: f32 = 0.01;

/// Convert a world-space position (meters, ground at `z = 0`) to earth space
/// (kilometers, planet center at the origin).
pub fn ws_to_es(pos_ws: Vec3, bottom_radius: f32) -> Vec3 {
    pos_ws * 0.001 + Vec3::new(0.0, 0.0, bottom_radius)
}

/// Remove the component of `v` along the unit normal `n`.
pub fn project_to_plane(v: Vec3, n: Vec3) -> Vec3 {
    v - v.dot(n) * n
}

/// Move an earth-space position radially so it sits at least
/// [`MIN_VIEW_ALTITUDE_KM`] above the ground. A position at the planet
/// center is lifted along `+Z`.
pub(crate) fn lift_above_ground(pos_es: Vec3, bottom_radius: f32) -> Vec3 {
    let min_height = bottom_radius + MIN_VIEW_ALTITUDE_KM;
    let height = pos_es.length();
    if height >= min_height {
        pos_es
    } else {
        pos_es.try_normalize().unwrap_or(Vec3::Z) * min_height
    }
}

/// Distance along `dir` from `origin` to the nearest non-negative
/// intersection with the sphere, or `None` if the ray misses it.
///
/// `None` is returned when the discriminant is negative, when both roots
/// lie behind the origin, or when `dir` is the zero vector. From inside the
/// sphere the single forward root (the exit point) is returned.
pub fn ray_sphere_intersect_nearest(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let a = dir.dot(dir);
    if a == 0.0 {
        return None;
    }
    let oc = origin - center;
    let b = 2.0 * dir.dot(oc);
    // (|oc| - r)(|oc| + r) keeps precision for origins close to the surface.
    let dist = oc.length();
    let c = (dist - radius) * (dist + radius);
    let delta = b * b - 4.0 * a * c;
    if delta < 0.0 {
        return None;
    }

    let sqrt_delta = delta.sqrt();
    let sol0 = (-b - sqrt_delta) / (2.0 * a);
    let sol1 = (-b + sqrt_delta) / (2.0 * a);
    if sol1 < 0.0 {
        None
    } else if sol0 < 0.0 {
        Some(sol1)
    } else {
        Some(sol0)
    }
}

/// The part of a ray that lies inside the atmosphere shell, as distances
/// from the ray origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaymarchInterval {
    pub t_min: f32,
    pub t_max: f32,
}

impl RaymarchInterval {
    pub fn length(&self) -> f32 {
        self.t_max - self.t_min
    }
}

/// Find the segment of the ray `start + t * dir` to integrate over.
///
/// | ground | top | viewer                 | segment                      |
/// |--------|-----|------------------------|------------------------------|
/// | hit    | hit | below ground           | none (the planet occludes)   |
/// | hit    | hit | inside the atmosphere  | `[0, ground]`                |
/// | hit    | hit | in space               | `[top entry, ground]`        |
/// | miss   | hit | inside the atmosphere  | `[0, top exit]`              |
/// | miss   | hit | in space               | `[top entry, top exit]`      |
/// | miss   | miss| anywhere               | none                         |
///
/// Hitting the ground without hitting the top is geometrically impossible;
/// it traps in debug builds and yields `None` otherwise.
pub fn compute_raymarch_interval(
    start: Vec3,
    dir: Vec3,
    earth_center: Vec3,
    bottom_radius: f32,
    top_radius: f32,
) -> Option<RaymarchInterval> {
    let t_bottom = ray_sphere_intersect_nearest(start, dir, earth_center, bottom_radius);
    let t_top = ray_sphere_intersect_nearest(start, dir, earth_center, top_radius);
    let view_height = (start - earth_center).length();

    match (t_bottom, t_top) {
        (Some(t_bottom), Some(t_top)) => {
            if view_height < bottom_radius {
                None
            } else if view_height < top_radius {
                Some(RaymarchInterval {
                    t_min: 0.0,
                    t_max: t_bottom,
                })
            } else {
                Some(RaymarchInterval {
                    t_min: t_top,
                    t_max: t_bottom,
                })
            }
        }
        (None, Some(t_top)) => {
            if view_height < top_radius {
                return Some(RaymarchInterval {
                    t_min: 0.0,
                    t_max: t_top,
                });
            }
            // Cast back from beyond the far side of the shell to find where
            // the ray leaves the atmosphere again.
            let overshoot = t_top + top_radius * 2.01;
            let back = ray_sphere_intersect_nearest(
                start + dir * overshoot,
                -dir,
                earth_center,
                top_radius,
            )?;
            Some(RaymarchInterval {
                t_min: t_top,
                t_max: (overshoot - back).max(t_top),
            })
        }
        (Some(_), None) => {
            if cfg!(debug_assertions) {
                unreachable!("ray from {start} along {dir} hits the ground but not the atmosphere");
            }
            tracing::error!(%start, %dir, "ray hits the ground but not the atmosphere top");
            None
        }
        (None, None) => None,
    }
}

//! Analytic demo scene used to drive the shading pipeline headless.
//!
//! The scene stands in for the mesher and the GPU passes the pipeline
//! normally sits between: it builds the camera and sun matrices, bakes the
//! sun depth map by ray casting, and produces surface points per pixel.

use glam::{Mat4, Vec2, Vec3};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ShadowMapError;
use crate::frame::{GlobalFrameState, PerDrawState, VertexAttributes};
use crate::shadow::DepthShadowMap;

/// Distance of the sun camera from the shadow focus.
pub const SUN_DISTANCE: f32 = 200.0;
/// Half extent of the orthographic sun frustum, in world units.
pub const SHADOW_EXTENT: f32 = 60.0;
pub const SUN_NEAR: f32 = -200.0;
pub const SUN_FAR: f32 = 500.0;

/// Slope scaled bias of the depth-only pass, in texels of depth slope.
pub const DEPTH_BIAS_SLOPE_SCALE: f32 = 2.0;
const MAX_BIAS_STEEPNESS: f32 = 10.0;

const HIT_EPSILON: f32 = 1e-3;

/// World size of one shadow map texel.
pub fn shadow_texel_world(shadow_map_size: u32) -> f32 {
    2.0 * SHADOW_EXTENT / shadow_map_size.max(1) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Distance along the unit direction `dir` to the first surface crossing
    /// in front of `origin`.
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let oc = origin - self.center;
        let b = oc.dot(dir);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near > HIT_EPSILON {
            Some(near)
        } else if far > HIT_EPSILON {
            Some(far)
        } else {
            None
        }
    }

    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        (point - self.center).normalize()
    }
}

/// One drawable body of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub sphere: Sphere,
    /// Gamma encoded surface color.
    pub color: Vec3,
    pub opacity: f32,
}

impl SceneObject {
    pub fn draw_state(&self) -> PerDrawState {
        PerDrawState::with_opacity(self.opacity)
    }
}

/// A ray/object intersection, already expressed as a mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: usize,
    pub distance: f32,
    pub vertex: VertexAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetScene {
    pub objects: Vec<SceneObject>,
    pub camera_pos: Vec3,
    pub camera_target: Vec3,
    pub fov_y: f32,
    /// Unit vector towards the sun.
    pub sun_dir: Vec3,
    /// Point the sun frustum is centred on.
    pub shadow_focus: Vec3,
}

impl Default for PlanetScene {
    fn default() -> Self {
        let sun_dir = Vec3::new(0.5, 0.8, 0.4).normalize();
        let focus = Vec3::new(0.0, 200.0, 0.0);
        Self {
            objects: vec![
                SceneObject {
                    name: "planet".to_string(),
                    sphere: Sphere {
                        center: Vec3::ZERO,
                        radius: 200.0,
                    },
                    color: Vec3::new(0.42, 0.55, 0.28),
                    opacity: 1.0,
                },
                SceneObject {
                    name: "moon".to_string(),
                    sphere: Sphere {
                        center: focus + sun_dir * 45.0,
                        radius: 12.0,
                    },
                    color: Vec3::new(0.75, 0.72, 0.68),
                    opacity: 1.0,
                },
            ],
            camera_pos: Vec3::new(0.0, 262.0, 110.0),
            camera_target: focus,
            fov_y: 60.0,
            sun_dir,
            shadow_focus: focus,
        }
    }
}

impl PlanetScene {
    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }

    /// Camera view projection with a 0..1 depth range.
    pub fn camera_view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.camera_pos, self.camera_target, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(0.01), 0.5, 2000.0);
        projection * view
    }

    /// Orthographic sun matrix centred on the shadow focus.
    ///
    /// The light space translation is snapped to whole shadow map texels, so
    /// shadow edges do not crawl as the focus moves.
    pub fn sun_view_proj(&self, shadow_map_size: u32) -> Mat4 {
        let rotation = Mat4::look_at_rh(Vec3::ZERO, -self.sun_dir, Vec3::Y);

        let texel = shadow_texel_world(shadow_map_size);
        let focus = rotation.transform_point3(self.shadow_focus);
        let snapped = (focus.truncate() / texel).round() * texel;
        let sun_view =
            Mat4::from_translation(-snapped.extend(focus.z + SUN_DISTANCE)) * rotation;

        let projection = Mat4::orthographic_rh(
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            SUN_NEAR,
            SUN_FAR,
        );
        projection * sun_view
    }

    pub fn frame_state(&self, aspect: f32, shadow_map_size: u32) -> GlobalFrameState {
        GlobalFrameState {
            view_proj: self.camera_view_proj(aspect),
            light_view_proj: self.sun_view_proj(shadow_map_size),
            camera_pos: self.camera_pos,
            sun_dir: self.sun_dir,
        }
    }

    /// Every surface crossing along a ray, nearest first.
    pub fn hits_along(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(index, object)| {
                let distance = object.sphere.intersect(origin, dir)?;
                if distance > max_distance {
                    return None;
                }
                let position = origin + dir * distance;
                Some(Hit {
                    object: index,
                    distance,
                    vertex: VertexAttributes {
                        position,
                        color: object.color,
                        normal: object.sphere.normal_at(position),
                    },
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    pub fn nearest_hit(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<Hit> {
        self.hits_along(origin, dir, max_distance).into_iter().next()
    }

    /// Renders the sun depth map the way the depth-only pass would.
    pub fn bake_shadow_map(
        &self,
        light_view_proj: &Mat4,
        size: u32,
    ) -> Result<DepthShadowMap, ShadowMapError> {
        if size == 0 {
            return Err(ShadowMapError::Empty {
                width: size,
                height: size,
            });
        }
        let inverse = light_view_proj.inverse();
        let texel = 1.0 / size as f32;
        // Depth change across one texel for a surface one unit steep.
        let texel_depth = shadow_texel_world(size) / (SUN_FAR - SUN_NEAR);
        let mut depths = vec![1.0; size as usize * size as usize];
        depths
            .par_chunks_mut(size as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, depth) in row.iter_mut().enumerate() {
                    let uv = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * texel;
                    *depth = self.light_depth(light_view_proj, &inverse, uv, texel_depth);
                }
            });
        debug!("baked {size}x{size} sun depth map");
        DepthShadowMap::new(size, size, depths)
    }

    fn light_depth(&self, light_view_proj: &Mat4, inverse: &Mat4, uv: Vec2, texel_depth: f32) -> f32 {
        let (origin, dir, span) = unproject_ray(inverse, texture_to_ndc(uv));
        let Some(hit) = self.nearest_hit(origin, dir, span) else {
            return 1.0;
        };
        let cos = hit.vertex.normal.dot(self.sun_dir).abs().max(1e-3);
        let steepness = ((1.0 - cos * cos).sqrt() / cos).min(MAX_BIAS_STEEPNESS);
        let depth = light_view_proj.project_point3(hit.vertex.position).z;
        (depth + DEPTH_BIAS_SLOPE_SCALE * steepness * texel_depth).min(1.0)
    }

    /// Camera ray through a window space position.
    pub fn camera_ray(&self, inverse_view_proj: &Mat4, frag_coord: Vec2, viewport: Vec2) -> (Vec3, Vec3, f32) {
        let ndc = Vec2::new(
            frag_coord.x / viewport.x * 2.0 - 1.0,
            1.0 - frag_coord.y / viewport.y * 2.0,
        );
        unproject_ray(inverse_view_proj, ndc)
    }
}

/// Texture space (v down) to normalized device xy (y up).
fn texture_to_ndc(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

/// Ray between the near and far planes at `ndc`: origin, unit direction and
/// length.
fn unproject_ray(inverse_view_proj: &Mat4, ndc: Vec2) -> (Vec3, Vec3, f32) {
    let near = inverse_view_proj.project_point3(ndc.extend(0.0));
    let far = inverse_view_proj.project_point3(ndc.extend(1.0));
    let span = far - near;
    (near, span.normalize(), span.length())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::{fetch_shadow, ShadowFilter};
    use crate::transform::{shadow_coords, NORMAL_OFFSET};

    #[test]
    fn ray_hits_sphere_front_face() {
        let sphere = Sphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        let distance = sphere.intersect(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z).unwrap();
        assert!((distance - 8.0).abs() < 1e-4);
        assert!(sphere.intersect(Vec3::new(5.0, 0.0, 10.0), -Vec3::Z).is_none());
        assert!(sphere.intersect(Vec3::new(0.0, 0.0, 10.0), Vec3::Z).is_none());
    }

    #[test]
    fn ray_from_inside_hits_the_far_side() {
        let sphere = Sphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        let distance = sphere.intersect(Vec3::ZERO, Vec3::X).unwrap();
        assert!((distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn hits_are_sorted_front_to_back() {
        let scene = PlanetScene::default();
        let moon = &scene.objects[1].sphere;
        let origin = moon.center + scene.sun_dir * 100.0;
        let hits = scene.hits_along(origin, -scene.sun_dir, 1000.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(scene.objects[hits[0].object].name, "moon");
        assert_eq!(scene.objects[hits[1].object].name, "planet");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn sun_matrix_keeps_the_focus_inside_the_shadow_map() {
        let scene = PlanetScene::default();
        let clip = scene.sun_view_proj(1024).project_point3(scene.shadow_focus);
        assert!(clip.x.abs() < 0.01 && clip.y.abs() < 0.01);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn moving_the_focus_shifts_the_projection_by_whole_texels() {
        let scene = PlanetScene::default();
        let mut moved = scene.clone();
        moved.shadow_focus += Vec3::new(3.37, 0.0, -1.91);

        let texel_ndc = 2.0 / 512.0;
        let sample_point = Vec3::new(10.0, 205.0, -4.0);
        let before = scene.sun_view_proj(512).project_point3(sample_point);
        let after = moved.sun_view_proj(512).project_point3(sample_point);
        for shift in [(after.x - before.x) / texel_ndc, (after.y - before.y) / texel_ndc] {
            assert!((shift - shift.round()).abs() < 1e-2, "{shift}");
        }

        let focus = moved.sun_view_proj(512).project_point3(moved.shadow_focus);
        assert!(focus.x.abs() <= texel_ndc && focus.y.abs() <= texel_ndc);
    }

    #[test]
    fn moon_shadows_the_ground_below_it() {
        let scene = PlanetScene::default();
        let light_view_proj = scene.sun_view_proj(256);
        let map = scene.bake_shadow_map(&light_view_proj, 256).unwrap();
        let filter = ShadowFilter::default();

        let planet = &scene.objects[0].sphere;
        let moon = &scene.objects[1].sphere;
        let below_moon = scene
            .nearest_hit(moon.center - scene.sun_dir * 13.0, -scene.sun_dir, 500.0)
            .unwrap();
        assert_eq!(below_moon.object, 0);

        let shade = |point: Vec3| {
            let normal = planet.normal_at(point);
            let coords = shadow_coords(point, normal, &light_view_proj, NORMAL_OFFSET);
            fetch_shadow(&map, coords, normal.dot(scene.sun_dir).max(0.0), &filter)
        };
        assert!(shade(below_moon.vertex.position) < 0.1);
        let open_ground = Vec3::new(-40.0, 200.0, -30.0).normalize() * planet.radius;
        assert!(shade(open_ground) > 0.75);
    }

    #[test]
    fn zero_sized_bake_is_an_error() {
        let scene = PlanetScene::default();
        assert!(scene.bake_shadow_map(&Mat4::IDENTITY, 0).is_err());
    }

    #[test]
    fn camera_ray_through_the_centre_looks_at_the_target() {
        let scene = PlanetScene::default();
        let inverse = scene.camera_view_proj(1.0).inverse();
        let (origin, dir, _) = scene.camera_ray(&inverse, Vec2::splat(50.0), Vec2::splat(100.0));
        let expected = (scene.camera_target - scene.camera_pos).normalize();
        assert!(dir.dot(expected) > 0.9999);
        assert!(origin.distance(scene.camera_pos) < 1.0);
    }
}

//! Spatial queries against the physics world
//!
//! The movement controllers only ever see the [`SpatialQuery`] trait, so
//! they can run against the rapier world or a scripted stand-in.

use glam::Vec3;
use rapier3d::parry::query::{PointQuery, ShapeCastOptions};
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{to_vec3, PhysicsWorld};

/// Bit set of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Ordinary level geometry
    pub const DEFAULT: LayerMask = LayerMask(1 << 0);
    /// Surfaces a grapple or swing cable can attach to
    pub const GRAPPLEABLE: LayerMask = LayerMask(1 << 1);
    /// The player character
    pub const CHARACTER: LayerMask = LayerMask(1 << 2);
    /// Every layer
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Union of two masks
    pub const fn with(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }

    /// Whether the masks share any layer
    pub const fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Groups for a collider that lives on these layers
    pub fn collider_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_truncate(self.0), Group::ALL)
    }

    /// Groups for a query that should only see these layers
    pub fn query_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.0))
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Which colliders a query may report
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueryMask {
    /// Layers the query sees
    pub layers: LayerMask,
    /// A body whose colliders are ignored (usually the querying character)
    pub exclude_body: Option<RigidBodyHandle>,
}

impl QueryMask {
    /// Query the given layers
    pub fn layers(layers: LayerMask) -> Self {
        Self {
            layers,
            exclude_body: None,
        }
    }

    /// Ignore the colliders attached to `body`
    pub fn excluding(mut self, body: Option<RigidBodyHandle>) -> Self {
        self.exclude_body = body;
        self
    }

    fn filter(&self) -> QueryFilter<'static> {
        let filter = QueryFilter::new().groups(self.layers.query_groups());
        match self.exclude_body {
            Some(body) => filter.exclude_rigid_body(body),
            None => filter,
        }
    }
}

/// Detailed ray or shape cast hit information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Distance travelled along the cast direction
    pub distance: f32,
    /// World-space hit point on the surface
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
}

/// A collider found inside an overlap volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    /// The overlapping collider
    pub collider: ColliderHandle,
    /// Lower corner of its world-space bounds
    pub bounds_min: Vec3,
    /// Upper corner of its world-space bounds
    pub bounds_max: Vec3,
}

/// Synchronous world queries used by the movement controllers
pub trait SpatialQuery {
    /// First hit along a ray, if any within `max_distance`
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<RaycastHit>;

    /// First hit when sweeping a sphere of `radius` along a ray
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<RaycastHit>;

    /// All colliders overlapping a sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: QueryMask) -> Vec<OverlapHit>;
}

impl SpatialQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<RaycastHit> {
        let direction = direction.try_normalize()?;
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                mask.filter(),
            )
            .map(|(handle, intersection)| RaycastHit {
                collider: handle,
                distance: intersection.time_of_impact,
                point: origin + direction * intersection.time_of_impact,
                normal: to_vec3(&intersection.normal),
            })
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<RaycastHit> {
        let direction = direction.try_normalize()?;
        let ball = Ball::new(radius);
        let start = Isometry::translation(origin.x, origin.y, origin.z);
        let velocity = vector![direction.x, direction.y, direction.z];

        let (handle, hit) = self.query_pipeline.cast_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &start,
            &velocity,
            &ball,
            ShapeCastOptions::with_max_time_of_impact(max_distance),
            mask.filter(),
        )?;

        // Contact point: the closest surface point to the swept sphere's centre
        let collider = self.collider_set.get(handle)?;
        let center = origin + direction * hit.time_of_impact;
        let projection = collider.shape().project_point(
            collider.position(),
            &point![center.x, center.y, center.z],
            true,
        );
        let point = Vec3::new(projection.point.x, projection.point.y, projection.point.z);

        Some(RaycastHit {
            collider: handle,
            distance: hit.time_of_impact,
            point,
            normal: (center - point).try_normalize().unwrap_or(-direction),
        })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: QueryMask) -> Vec<OverlapHit> {
        let ball = Ball::new(radius);
        let position = Isometry::translation(center.x, center.y, center.z);
        let mut hits = Vec::new();

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &position,
            &ball,
            mask.filter(),
            |handle| {
                if let Some(collider) = self.collider_set.get(handle) {
                    let aabb = collider.compute_aabb();
                    hits.push(OverlapHit {
                        collider: handle,
                        bounds_min: Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
                        bounds_max: Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
                    });
                }
                true
            },
        );

        hits
    }
}

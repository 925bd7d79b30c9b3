//! Several surfaces sharing one plot frame.
//!
//! The frame's domain is the per-axis union of every member's domain and its
//! scale follows an [`AxisPolicy`]. Each member is then sized and offset by
//! mapping its own domain through the shared frame.
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::plot_frame::PlotFrame;
use super::surface::{DepthSource, DepthSurface, SurfacePlacement};
use crate::engine::math::{Axis, Domain, Interval, Mapping};

/// How axis lengths relate to domain extents across a composite plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPolicy {
    /// Base scale on every axis regardless of extents.
    #[default]
    Uniform,
    /// x and y in true proportion to each other, z untouched.
    XyEqual,
    /// All three axes in true proportion.
    Equal,
}

/// Shared frame scale for a union domain.
pub fn shared_scale(domain: &Domain, base: Vec3, policy: AxisPolicy) -> Vec3 {
    let [ex, ey, ez] = domain.extents();
    let ratio = |extent: f64, max: f64| {
        let r = extent / max;
        if r.is_finite() { r as f32 } else { 1.0 }
    };

    match policy {
        AxisPolicy::Uniform => base,
        AxisPolicy::XyEqual => {
            let max = ex.max(ey);
            Vec3::new(base.x * ratio(ex, max), base.y * ratio(ey, max), base.z)
        }
        AxisPolicy::Equal => {
            let max = ex.max(ey).max(ez);
            Vec3::new(
                base.x * ratio(ex, max),
                base.y * ratio(ey, max),
                base.z * ratio(ez, max),
            )
        }
    }
}

/// Placement of one member inside the shared frame.
pub fn place_in_frame(member: &Domain, frame: &Domain, scale: Vec3) -> SurfacePlacement {
    let map = |axis: Axis| {
        Mapping::new(
            frame.axis(axis),
            Interval::new(0.0, axis.component(scale) as f64),
        )
    };
    let (fx, fy, fz) = (map(Axis::X), map(Axis::Y), map(Axis::Z));
    let extent = |f: &Mapping, i: Interval| (f.apply(i.hi) - f.apply(i.lo)) as f32;

    SurfacePlacement {
        offset: Vec3::new(
            fx.apply(member.x.lerp(0.5)) as f32,
            fy.apply(member.y.lerp(0.5)) as f32,
            fz.apply(member.z.lo) as f32,
        ),
        scale: Vec3::new(
            extent(&fx, member.x),
            extent(&fy, member.y),
            extent(&fz, member.z),
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLayout {
    pub domain: Domain,
    pub scale: Vec3,
    pub placements: Vec<SurfacePlacement>,
}

/// Union domain, shared scale and per-member placement. No members gives the
/// unit domain.
pub fn composite_layout(members: &[Domain], policy: AxisPolicy, base: Vec3) -> CompositeLayout {
    let domain = Domain::union_all(members).unwrap_or_default();
    let scale = shared_scale(&domain, base, policy);
    let placements = members
        .iter()
        .map(|member| place_in_frame(member, &domain, scale))
        .collect();
    CompositeLayout {
        domain,
        scale,
        placements,
    }
}

/// Plot root laying out its [`SurfaceDomain`] children. Owns the frame's
/// domain and scale; the host sets `policy` and `base_scale` instead.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(PlotFrame, CompositeMembers)]
pub struct MultiSurface {
    pub policy: AxisPolicy,
    pub base_scale: Vec3,
}

impl Default for MultiSurface {
    fn default() -> Self {
        Self {
            policy: AxisPolicy::Uniform,
            base_scale: Vec3::ONE,
        }
    }
}

/// Members of a [`MultiSurface`] as of its last layout, in child order.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeMembers(Vec<Entity>);

impl CompositeMembers {
    pub fn entities(&self) -> &[Entity] {
        &self.0
    }
}

/// Data domain covered by one member of a [`MultiSurface`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceDomain(pub Domain);

pub fn spawn_domain_surface(
    commands: &mut Commands,
    frame: Entity,
    surface: DepthSurface,
    source: DepthSource,
    domain: Domain,
) -> Entity {
    commands
        .spawn((
            surface,
            source,
            SurfaceDomain(domain),
            ChildOf(frame),
            Name::new("Composite surface"),
        ))
        .id()
}

/// Recompute composite layouts when membership, member domains, policy or
/// base scale change.
pub fn layout_multi_surfaces(
    mut frames: Query<(
        Entity,
        Ref<MultiSurface>,
        &mut PlotFrame,
        &mut CompositeMembers,
        Option<&Children>,
    )>,
    mut members: Query<(Ref<SurfaceDomain>, &mut SurfacePlacement)>,
) {
    for (entity, multi, mut frame, mut laid_out, children) in frames.iter_mut() {
        let ids: Vec<Entity> = children
            .map(|children| {
                let children: &[Entity] = children;
                children
                    .iter()
                    .copied()
                    .filter(|&child| members.contains(child))
                    .collect()
            })
            .unwrap_or_default();
        let membership_changed = laid_out.0 != ids;
        if !multi.is_changed() && !membership_changed && !member_domain_changed(&ids, &members) {
            continue;
        }
        if membership_changed {
            debug!("Composite {entity}: {} member surfaces", ids.len());
            laid_out.0 = ids.clone();
        }

        let domains: Vec<Domain> = ids
            .iter()
            .filter_map(|&child| members.get(child).ok().map(|(domain, _)| domain.0))
            .collect();
        let layout = composite_layout(&domains, multi.policy, multi.base_scale);

        if frame.domain != layout.domain {
            frame.domain = layout.domain;
        }
        if frame.scale != layout.scale {
            debug!("Composite {entity}: shared scale {:?}", layout.scale);
            frame.scale = layout.scale;
        }
        for (id, placement) in ids.into_iter().zip(layout.placements) {
            if let Ok((_, mut current)) = members.get_mut(id) {
                current.set_if_neq(placement);
            }
        }
    }
}

fn member_domain_changed(
    children: &[Entity],
    members: &Query<(Ref<SurfaceDomain>, &mut SurfacePlacement)>,
) -> bool {
    children
        .iter()
        .any(|&child| members.get(child).is_ok_and(|(domain, _)| domain.is_changed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(x: [f64; 2], y: [f64; 2], z: [f64; 2]) -> Domain {
        Domain::new(x.into(), y.into(), z.into())
    }

    #[test]
    fn policy_names_match_host_strings() {
        let parsed: AxisPolicy = serde_json::from_str("\"xyequal\"").unwrap();
        assert_eq!(parsed, AxisPolicy::XyEqual);
        let parsed: AxisPolicy = serde_json::from_str("\"equal\"").unwrap();
        assert_eq!(parsed, AxisPolicy::Equal);
    }

    #[test]
    fn empty_layout_uses_unit_domain() {
        let layout = composite_layout(&[], AxisPolicy::Equal, Vec3::ONE);
        assert_eq!(layout.domain, Domain::default());
        assert_eq!(layout.scale, Vec3::ONE);
        assert!(layout.placements.is_empty());
    }

    #[test]
    fn uniform_keeps_base_scale() {
        let d = domain([0.0, 100.0], [0.0, 1.0], [0.0, 5.0]);
        assert_eq!(shared_scale(&d, Vec3::new(1.0, 2.0, 3.0), AxisPolicy::Uniform), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn equal_uses_largest_extent() {
        let d = domain([0.0, 10.0], [0.0, 5.0], [0.0, 20.0]);
        let s = shared_scale(&d, Vec3::ONE, AxisPolicy::Equal);
        assert_eq!(s, Vec3::new(0.5, 0.25, 1.0));
        let s = shared_scale(&d, Vec3::ONE, AxisPolicy::XyEqual);
        assert_eq!(s, Vec3::new(1.0, 0.5, 1.0));
    }

    #[test]
    fn degenerate_union_keeps_base_scale() {
        let d = domain([1.0, 1.0], [2.0, 2.0], [0.0, 1.0]);
        assert_eq!(shared_scale(&d, Vec3::ONE, AxisPolicy::XyEqual), Vec3::ONE);
    }

    #[test]
    fn member_offset_is_centre_and_floor() {
        let frame = domain([0.0, 20.0], [0.0, 10.0], [-1.0, 1.0]);
        let member = domain([10.0, 20.0], [0.0, 10.0], [0.0, 1.0]);
        let p = place_in_frame(&member, &frame, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(p.offset, Vec3::new(1.5, 0.5, 0.5));
        assert_eq!(p.scale, Vec3::new(1.0, 1.0, 0.5));
    }

    #[test]
    fn layout_system_writes_frame_and_members() {
        let mut app = App::new();
        app.add_systems(Update, layout_multi_surfaces);

        let root = app
            .world_mut()
            .spawn(MultiSurface {
                policy: AxisPolicy::XyEqual,
                base_scale: Vec3::ONE,
            })
            .id();
        let a = app
            .world_mut()
            .spawn((
                SurfaceDomain(domain([0.0, 10.0], [0.0, 20.0], [0.0, 1.0])),
                SurfacePlacement::default(),
                ChildOf(root),
            ))
            .id();
        let b = app
            .world_mut()
            .spawn((
                SurfaceDomain(domain([0.0, 20.0], [0.0, 20.0], [0.0, 1.0])),
                SurfacePlacement::default(),
                ChildOf(root),
            ))
            .id();
        app.update();

        let frame = app.world().get::<PlotFrame>(root).unwrap();
        assert_eq!(frame.domain.x, Interval::new(0.0, 20.0));
        let pa = app.world().get::<SurfacePlacement>(a).unwrap();
        let pb = app.world().get::<SurfacePlacement>(b).unwrap();
        assert!((pa.scale.x - 0.5).abs() < 1e-6);
        assert!((pb.scale.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn layout_follows_membership_only() {
        let mut app = App::new();
        app.add_systems(Update, layout_multi_surfaces);
        let root = app.world_mut().spawn(MultiSurface::default()).id();
        app.update();
        assert!(app.world().get::<CompositeMembers>(root).unwrap().entities().is_empty());

        // An idle composite is not laid out again.
        app.world_mut().get_mut::<PlotFrame>(root).unwrap().scale = Vec3::splat(3.0);
        app.update();
        assert_eq!(app.world().get::<PlotFrame>(root).unwrap().scale, Vec3::splat(3.0));

        let member = app
            .world_mut()
            .spawn((
                SurfaceDomain(domain([0.0, 4.0], [0.0, 2.0], [0.0, 1.0])),
                SurfacePlacement::default(),
                ChildOf(root),
            ))
            .id();
        app.update();
        let frame = app.world().get::<PlotFrame>(root).unwrap();
        assert_eq!(frame.scale, Vec3::ONE);
        assert_eq!(frame.domain.x, Interval::new(0.0, 4.0));
        assert_eq!(
            app.world().get::<CompositeMembers>(root).unwrap().entities(),
            &[member]
        );

        app.world_mut().entity_mut(member).despawn();
        app.update();
        let frame = app.world().get::<PlotFrame>(root).unwrap();
        assert_eq!(frame.domain, Domain::default());
        assert!(app.world().get::<CompositeMembers>(root).unwrap().entities().is_empty());
    }
}

use eframe::egui::vec2;

use super::LayoutConfig;
use super::forces::{
    Axis, AxisForce, CenterForce, ClusterForce, CollisionForce, Force, KindTable, LevelBandForce,
    LevelSpreadForce, LinkForce, ManyBodyForce, RadialForce, Spring,
};
use crate::graph::{DisplayMode, EdgeKind};

const COLLISION_PASSES: usize = 2;

/// A resolved edge between two body indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) kind: EdgeKind,
}

pub fn rest_length(mode: DisplayMode, kind: EdgeKind) -> f32 {
    match mode {
        DisplayMode::Overview | DisplayMode::Focused => match kind {
            EdgeKind::SystemToInterface => 150.0,
            EdgeKind::InterfaceToFlow => 120.0,
            EdgeKind::SystemToSystem => 350.0,
            _ => 180.0,
        },
        DisplayMode::Technical => match kind {
            EdgeKind::SystemToFlow | EdgeKind::FlowToSystem => 180.0,
            EdgeKind::FlowToInterface => 130.0,
            EdgeKind::InterfaceToInterface => 100.0,
            EdgeKind::SystemToSystem => 350.0,
            _ => 200.0,
        },
    }
}

/// Spring stiffness per edge kind. Shadow links only hint at proximity.
pub fn link_strength(mode: DisplayMode, kind: EdgeKind) -> f32 {
    match (mode, kind) {
        (_, EdgeKind::SystemToSystem) => 0.1,
        (DisplayMode::Technical, _) => 0.3,
        _ => 0.4,
    }
}

pub fn collision_radius(mode: DisplayMode) -> KindTable<f32> {
    match mode {
        DisplayMode::Technical => KindTable {
            system: 100.0,
            interface: 60.0,
            flow: 50.0,
        },
        _ => KindTable {
            system: 100.0,
            interface: 50.0,
            flow: 60.0,
        },
    }
}

/// Composes the force stack for one display mode.
pub(super) fn force_stack(
    mode: DisplayMode,
    links: &[Link],
    body_count: usize,
    config: &LayoutConfig,
) -> Vec<Box<dyn Force>> {
    let springs = links
        .iter()
        .map(|link| Spring {
            source: link.source,
            target: link.target,
            rest_length: rest_length(mode, link.kind),
            strength: link_strength(mode, link.kind),
        })
        .collect::<Vec<_>>();

    let (width, height) = (config.width, config.height);

    match mode {
        DisplayMode::Overview | DisplayMode::Focused => vec![
            Box::new(LinkForce::new(springs, body_count)),
            Box::new(ManyBodyForce::new(KindTable {
                system: -1200.0,
                interface: -600.0,
                flow: -400.0,
            })),
            Box::new(LevelBandForce::new(height, 0.9)),
            Box::new(AxisForce::new(Axis::X, 0.0, 0.05)),
            Box::new(CollisionForce::new(
                collision_radius(mode),
                0.7,
                COLLISION_PASSES,
            )),
            Box::new(LevelSpreadForce::new(width, 0.3)),
        ],
        DisplayMode::Technical => {
            let short_side = width.min(height);
            vec![
                Box::new(LinkForce::new(springs, body_count)),
                Box::new(
                    ManyBodyForce::new(KindTable {
                        system: -1800.0,
                        interface: -900.0,
                        flow: -600.0,
                    })
                    .with_hub_charge(-2000.0),
                ),
                Box::new(CenterForce::new(0.05)),
                Box::new(CollisionForce::new(
                    collision_radius(mode),
                    0.85,
                    COLLISION_PASSES,
                )),
                Box::new(RadialForce::new(short_side * 0.4, short_side * 0.25, 0.3)),
                Box::new(AxisForce::new(Axis::X, 0.0, 0.02)),
                Box::new(AxisForce::new(Axis::Y, 0.0, 0.02)),
                Box::new(ClusterForce::new(
                    KindTable {
                        system: vec2(0.0, -0.2 * height),
                        interface: vec2(0.0, 0.1 * height),
                        flow: vec2(0.0, 0.2 * height),
                    },
                    0.1,
                )),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(mode: DisplayMode) -> Vec<&'static str> {
        force_stack(mode, &[], 0, &LayoutConfig::default())
            .iter()
            .map(|force| force.name())
            .collect()
    }

    #[test]
    fn tiered_modes_band_and_spread() {
        for mode in [DisplayMode::Overview, DisplayMode::Focused] {
            let names = names(mode);
            assert!(names.contains(&"level-band"));
            assert!(names.contains(&"level-spread"));
            assert!(!names.contains(&"radial"));
        }
    }

    #[test]
    fn technical_mode_clusters_around_rings() {
        let names = names(DisplayMode::Technical);
        for expected in ["radial", "center", "cluster", "axis-x", "axis-y"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert!(!names.contains(&"level-band"));
    }

    #[test]
    fn shadow_links_are_weakest() {
        for mode in DisplayMode::ALL {
            let shadow = link_strength(mode, EdgeKind::SystemToSystem);
            assert!(shadow < link_strength(mode, EdgeKind::SystemToInterface));
            assert!(shadow < link_strength(mode, EdgeKind::InterfaceToInterface));
        }
        assert_eq!(link_strength(DisplayMode::Overview, EdgeKind::SystemToInterface), 0.4);
        assert_eq!(link_strength(DisplayMode::Technical, EdgeKind::FlowToInterface), 0.3);
    }

    #[test]
    fn shadow_links_are_longest() {
        for mode in DisplayMode::ALL {
            assert!(
                rest_length(mode, EdgeKind::SystemToSystem)
                    > rest_length(mode, EdgeKind::SystemToInterface)
            );
        }
    }
}

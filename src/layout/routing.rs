//! Deterministic parent-to-child connector geometry. Pure functions: two
//! station centers and radii in, a crossing-free polyline out.

/// Clearance added past the target radius so the final segment lands just
/// outside the glyph outline.
const ENTRY_EPSILON: f32 = 0.5;
/// Upper bound on rounded-corner radius.
const MAX_CORNER_RADIUS: f32 = 18.0;
/// Extra clearance used when the route must detour around the target.
const DETOUR_PAD: f32 = 12.0;
/// Length of the stub below the exit before a lateral stagger jog.
const STAGGER_STUB: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    QuadTo { cx: f32, cy: f32, x: f32, y: f32 },
}

#[derive(Debug, Clone)]
pub struct ConnectorRoute {
    pub commands: Vec<PathCommand>,
    /// Point where the route leaves the source glyph, exactly
    /// `source_radius` from its snapped center along the vertical axis.
    pub exit: (f32, f32),
    /// Point where the route meets the target glyph, `target_radius` plus a
    /// small epsilon from its snapped center along the horizontal axis.
    pub entry: (f32, f32),
}

fn snap(value: f32, grid: f32) -> f32 {
    if grid > 0.0 {
        (value / grid).round() * grid
    } else {
        value
    }
}

fn sign_or(value: f32, fallback: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        fallback
    }
}

fn corner_radius(horizontal_gap: f32, vertical_gap: f32) -> f32 {
    MAX_CORNER_RADIUS
        .min(horizontal_gap.abs() / 2.0)
        .min(vertical_gap.abs() / 2.0)
        .max(0.0)
}

/// Route one connector. Both centers are snapped to the grid first; the
/// route exits the source vertically toward the target and enters the
/// target horizontally, never crossing either glyph's interior. A non-zero
/// `lateral_offset` staggers the vertical leg so multiple connectors toward
/// the same row don't fully overlap.
pub fn route_connector(
    source: (f32, f32),
    source_radius: f32,
    target: (f32, f32),
    target_radius: f32,
    grid: f32,
    lateral_offset: f32,
) -> ConnectorRoute {
    let sx = snap(source.0, grid);
    let sy = snap(source.1, grid);
    let tx = snap(target.0, grid);
    let ty = snap(target.1, grid);

    let down = sign_or(ty - sy, 1.0);
    let exit = (sx, sy + down * source_radius);

    let mut commands = vec![PathCommand::MoveTo {
        x: exit.0,
        y: exit.1,
    }];

    // Stagger: jog the vertical leg sideways just past the exit stub.
    let leg_x = sx + lateral_offset;
    if lateral_offset != 0.0 {
        let jog_y = exit.1 + down * STAGGER_STUB;
        commands.push(PathCommand::LineTo { x: sx, y: jog_y });
        commands.push(PathCommand::LineTo { x: leg_x, y: jog_y });
    }

    let entry;
    if (tx - leg_x).abs() >= target_radius + ENTRY_EPSILON {
        // Enough horizontal separation: vertical leg, rounded corner,
        // horizontal leg into the target. The margin covers the entry
        // epsilon too, otherwise the final segment would overshoot the
        // vertical leg and cut through the glyph.
        let side = sign_or(tx - leg_x, 1.0);
        entry = (tx - side * (target_radius + ENTRY_EPSILON), ty);
        let radius = corner_radius(entry.0 - leg_x, ty - exit.1);
        commands.push(PathCommand::LineTo {
            x: leg_x,
            y: ty - down * radius,
        });
        commands.push(PathCommand::QuadTo {
            cx: leg_x,
            cy: ty,
            x: leg_x + side * radius,
            y: ty,
        });
        commands.push(PathCommand::LineTo { x: entry.0, y: entry.1 });
    } else {
        // The vertical leg would cut through the target: detour laterally
        // at a row clear of both glyphs, descend outside the target radius,
        // then approach along the row.
        let side = sign_or(tx - leg_x, 1.0);
        entry = (tx - side * (target_radius + ENTRY_EPSILON), ty);
        let detour_x = tx - side * (target_radius + DETOUR_PAD + lateral_offset.abs());
        let mut leg_y = ty - down * (target_radius + DETOUR_PAD);
        if down * (leg_y - sy) < source_radius + DETOUR_PAD {
            leg_y = sy + down * (source_radius + DETOUR_PAD);
        }
        let toward = sign_or(detour_x - leg_x, -side);
        let upper = corner_radius(detour_x - leg_x, leg_y - exit.1);
        let lower = corner_radius(entry.0 - detour_x, ty - leg_y);

        commands.push(PathCommand::LineTo {
            x: leg_x,
            y: leg_y - down * upper,
        });
        commands.push(PathCommand::QuadTo {
            cx: leg_x,
            cy: leg_y,
            x: leg_x + toward * upper,
            y: leg_y,
        });
        commands.push(PathCommand::LineTo {
            x: detour_x - toward * upper,
            y: leg_y,
        });
        commands.push(PathCommand::QuadTo {
            cx: detour_x,
            cy: leg_y,
            x: detour_x,
            y: leg_y + down * upper,
        });
        commands.push(PathCommand::LineTo {
            x: detour_x,
            y: ty - down * lower,
        });
        commands.push(PathCommand::QuadTo {
            cx: detour_x,
            cy: ty,
            x: detour_x + side * lower,
            y: ty,
        });
        commands.push(PathCommand::LineTo { x: entry.0, y: entry.1 });
    }

    ConnectorRoute {
        commands,
        exit,
        entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    /// Flatten the route into a dense point sample for clearance checks.
    fn sample(route: &ConnectorRoute) -> Vec<(f32, f32)> {
        let mut points = Vec::new();
        let mut cursor = (0.0f32, 0.0f32);
        for command in &route.commands {
            match *command {
                PathCommand::MoveTo { x, y } => {
                    cursor = (x, y);
                    points.push(cursor);
                }
                PathCommand::LineTo { x, y } => {
                    for step in 1..=32 {
                        let t = step as f32 / 32.0;
                        points.push((
                            cursor.0 + (x - cursor.0) * t,
                            cursor.1 + (y - cursor.1) * t,
                        ));
                    }
                    cursor = (x, y);
                }
                PathCommand::QuadTo { cx, cy, x, y } => {
                    for step in 1..=32 {
                        let t = step as f32 / 32.0;
                        let u = 1.0 - t;
                        points.push((
                            u * u * cursor.0 + 2.0 * u * t * cx + t * t * x,
                            u * u * cursor.1 + 2.0 * u * t * cy + t * t * y,
                        ));
                    }
                    cursor = (x, y);
                }
            }
        }
        points
    }

    #[test]
    fn exit_is_exactly_source_radius_from_center() {
        let route = route_connector((0.0, 0.0), 10.0, (100.0, 90.0), 12.0, 10.0, 0.0);
        assert_eq!(route.exit, (0.0, 10.0));
        assert_eq!(distance(route.exit, (0.0, 0.0)), 10.0);
        assert_eq!(route.commands[0], PathCommand::MoveTo { x: 0.0, y: 10.0 });
    }

    #[test]
    fn entry_sits_just_outside_target_radius() {
        let route = route_connector((0.0, 0.0), 10.0, (100.0, 90.0), 12.0, 10.0, 0.0);
        assert_eq!(route.entry, (100.0 - 12.5, 90.0));
        let last = route.commands.last().unwrap();
        assert_eq!(
            *last,
            PathCommand::LineTo {
                x: route.entry.0,
                y: route.entry.1
            }
        );
    }

    #[test]
    fn straight_route_clears_both_glyphs() {
        let route = route_connector((0.0, 0.0), 10.0, (100.0, 90.0), 12.0, 10.0, 0.0);
        for point in sample(&route) {
            assert!(
                distance(point, (0.0, 0.0)) >= 10.0 - 1e-3,
                "point {point:?} inside source glyph"
            );
            assert!(
                distance(point, (100.0, 90.0)) >= 12.0 + 1e-3,
                "point {point:?} inside target glyph"
            );
        }
    }

    #[test]
    fn centers_snap_to_the_grid() {
        let route = route_connector((3.0, 4.0), 10.0, (101.0, 88.0), 12.0, 10.0, 0.0);
        // 3,4 -> 0,0 and 101,88 -> 100,90
        assert_eq!(route.exit, (0.0, 10.0));
        assert_eq!(route.entry.1, 90.0);
    }

    #[test]
    fn narrow_horizontal_separation_detours_around_target() {
        let target = (4.0, 200.0);
        let route = route_connector((0.0, 0.0), 10.0, target, 16.0, 0.0, 0.0);
        // Snapping disabled (grid 0), so centers are used as given.
        for point in sample(&route) {
            assert!(
                distance(point, target) >= 16.0 + 1e-3,
                "point {point:?} inside target glyph"
            );
        }
        assert_eq!(route.entry, (4.0 - 16.5, 200.0));
    }

    #[test]
    fn separation_inside_entry_margin_still_detours() {
        // Separation exactly equal to the target radius: a straight descent
        // would place the entry on the far side of the vertical leg and run
        // the final segment through the glyph.
        let target = (16.0, 200.0);
        let route = route_connector((0.0, 0.0), 10.0, target, 16.0, 0.0, 0.0);
        for point in sample(&route) {
            assert!(
                distance(point, target) >= 16.0,
                "point {point:?} inside target glyph"
            );
        }
        assert_eq!(route.entry, (16.0 - 16.5, 200.0));
    }

    #[test]
    fn upward_target_exits_through_the_top() {
        let route = route_connector((0.0, 200.0), 10.0, (100.0, 0.0), 12.0, 10.0, 0.0);
        assert_eq!(route.exit, (0.0, 190.0));
    }

    #[test]
    fn lateral_offset_staggers_the_vertical_leg() {
        let plain = route_connector((0.0, 0.0), 10.0, (200.0, 90.0), 12.0, 10.0, 0.0);
        let offset = route_connector((0.0, 0.0), 10.0, (200.0, 90.0), 12.0, 10.0, 14.0);
        assert_eq!(plain.exit, offset.exit);
        assert_eq!(plain.entry, offset.entry);
        assert!(offset.commands.len() > plain.commands.len());
        assert!(offset.commands.contains(&PathCommand::LineTo {
            x: 14.0,
            y: 18.0
        }));
    }

    #[test]
    fn identical_input_routes_identically() {
        let a = route_connector((0.0, 0.0), 10.0, (140.0, 90.0), 12.0, 10.0, 6.0);
        let b = route_connector((0.0, 0.0), 10.0, (140.0, 90.0), 12.0, 10.0, 6.0);
        assert_eq!(a.commands, b.commands);
    }
}

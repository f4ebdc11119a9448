//! Tag filters for drivable roads.

/// Travel direction permitted along a way, relative to its node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Both,
    Forward,
    Backward,
}

/// Classify a way: `None` when cars cannot use it, otherwise the permitted
/// direction.
pub(super) fn drivable_direction<'a, T>(tags: T) -> Option<Direction>
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut highway = None;
    let mut oneway = None;
    let mut roundabout = false;
    for (key, value) in tags {
        match key {
            "highway" => highway = Some(value),
            "oneway" => oneway = Some(value),
            "junction" => roundabout = matches!(value, "roundabout" | "circular"),
            "area" if value == "yes" => return None,
            "access" | "motor_vehicle" | "motorcar" if is_prohibitive(value) => return None,
            "service" if is_excluded_service(value) => return None,
            _ => {}
        }
    }
    if !highway.is_some_and(is_drivable_highway) {
        return None;
    }
    Some(match oneway {
        Some("yes" | "true" | "1") => Direction::Forward,
        Some("-1" | "reverse") => Direction::Backward,
        Some("no" | "false" | "0") => Direction::Both,
        _ if roundabout => Direction::Forward,
        _ => Direction::Both,
    })
}

fn is_drivable_highway(value: &str) -> bool {
    matches!(
        value,
        "motorway"
            | "motorway_link"
            | "trunk"
            | "trunk_link"
            | "primary"
            | "primary_link"
            | "secondary"
            | "secondary_link"
            | "tertiary"
            | "tertiary_link"
            | "unclassified"
            | "residential"
            | "living_street"
            | "road"
            | "service"
    )
}

fn is_prohibitive(value: &str) -> bool {
    matches!(value, "no" | "private")
}

fn is_excluded_service(value: &str) -> bool {
    matches!(
        value,
        "parking" | "parking_aisle" | "driveway" | "private" | "emergency_access"
    )
}

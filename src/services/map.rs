//! Room and floor drawings as KML.
//!
//! Rooms of a building floor are drawn as outlined polygons with a label
//! point each; a requested room is highlighted.

use crate::client::{MapClient, Room};
use crate::error::Result;

// KML colors are aabbggrr.
const LINE_COLOR: &str = "ff000000";
const HIGHLIGHT_COLOR: &str = "ff0074e8";
const LABEL_COLOR: &str = "ffd3d3d3";
const LABEL_HIGHLIGHT_COLOR: &str = "ffc7e5fc";
const ROOM_FILL: &str = "55aaaaaa";

/// What to draw inside a building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawTarget {
    /// A room such as `1.102`; its floor is drawn with the room highlighted
    Room(String),
    /// A whole floor such as `1`
    Floor(String),
}

impl DrawTarget {
    /// Rooms contain a `.` (`2.410`); anything else names a floor.
    pub fn parse(raw: &str) -> Self {
        if raw.contains('.') {
            DrawTarget::Room(raw.to_string())
        } else {
            DrawTarget::Floor(raw.to_string())
        }
    }

    pub fn floor(&self) -> &str {
        match self {
            DrawTarget::Room(room) => room.split('.').next().unwrap_or(room),
            DrawTarget::Floor(floor) => floor,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DrawTarget::Room(value) | DrawTarget::Floor(value) => value,
        }
    }
}

/// A rendered drawing.
#[derive(Debug, Clone)]
pub struct Drawing {
    pub kml: String,
    pub rooms_drawn: usize,
    /// Full name of the highlighted room, e.g. `JO 1.102`
    pub highlight: Option<String>,
    pub highlight_found: bool,
}

/// Fetch a building's rooms and draw the target floor.
///
/// Returns `None` when the building has no interior map.
pub async fn draw_building(
    client: &MapClient,
    building_code: &str,
    target: &DrawTarget,
) -> Result<Option<Drawing>> {
    let Some(interior) = client.building_interior(building_code).await? else {
        log::warn!("No interior map for building {}", building_code);
        return Ok(None);
    };

    let drawing = render_kml(building_code, target, &interior.children.locations);
    if let (Some(name), false) = (&drawing.highlight, drawing.highlight_found) {
        log::warn!("Unable to find room {}", name);
    }
    Ok(Some(drawing))
}

/// Render the rooms on `target`'s floor as a KML document.
pub fn render_kml(building_code: &str, target: &DrawTarget, rooms: &[Room]) -> Drawing {
    let floor_prefix = format!("{} {}", building_code, target.floor());
    let highlight = match target {
        DrawTarget::Room(room) => Some(format!("{building_code} {room}")),
        DrawTarget::Floor(_) => None,
    };

    let mut body = String::new();
    let mut rooms_drawn = 0;
    let mut highlight_found = false;

    for room in rooms.iter().filter(|r| r.name.contains(&floor_prefix)) {
        let highlighted = highlight.as_deref() == Some(room.name.as_str());
        highlight_found |= highlighted;
        rooms_drawn += 1;

        let outline = room.outline();
        if !outline.is_empty() {
            body.push_str(&polygon_placemark(&room.name, &outline, highlighted));
        }
        body.push_str(&label_placemark(room, highlighted));
    }

    let kml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n\
         <Document>\n<name>{}</name>\n{}</Document>\n</kml>\n",
        escape(&floor_prefix),
        body
    );

    Drawing {
        kml,
        rooms_drawn,
        highlight,
        highlight_found,
    }
}

fn polygon_placemark(name: &str, outline: &[(f64, f64)], highlighted: bool) -> String {
    // KML wants lon,lat and a closed ring.
    let mut coords: Vec<String> = outline
        .iter()
        .map(|(lat, lon)| format!("{lon},{lat},0"))
        .collect();
    coords.push(coords[0].clone());

    let (color, width) = if highlighted {
        (HIGHLIGHT_COLOR, 4)
    } else {
        (LINE_COLOR, 2)
    };

    format!(
        "<Placemark>\n<name>{}</name>\n\
         <Style><LineStyle><color>{color}</color><width>{width}</width></LineStyle>\
         <PolyStyle><color>{ROOM_FILL}</color></PolyStyle></Style>\n\
         <Polygon><outerBoundaryIs><LinearRing><coordinates>{}</coordinates>\
         </LinearRing></outerBoundaryIs></Polygon>\n</Placemark>\n",
        escape(name),
        coords.join(" ")
    )
}

fn label_placemark(room: &Room, highlighted: bool) -> String {
    let (color, scale) = if highlighted {
        (LABEL_HIGHLIGHT_COLOR, 0.75)
    } else {
        (LABEL_COLOR, 0.55)
    };

    format!(
        "<Placemark>\n<name>{}</name>\n\
         <Style><IconStyle><Icon><href></href></Icon></IconStyle>\
         <LabelStyle><color>{color}</color><scale>{scale}</scale></LabelStyle></Style>\n\
         <Point><coordinates>{},{},0</coordinates></Point>\n</Placemark>\n",
        escape(&room.name),
        room.lng,
        room.lat
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Static map page rendering.
///
/// Produces one self-contained HTML document: the grouped coordinates and
/// the color table are embedded as JSON literals in a fixed script template
/// that builds the markers, the toggle menu and the visible-marker counter.
/// The only external reference is the map provider's script.

use crate::analysis::grouping::GroupedObservations;
use crate::model::{EncryptionClass, MapCenter, MapError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::path::Path;

const MAPS_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";

pub const DEFAULT_TITLE: &str = "Interactive Map with ALL Menu";
pub const DEFAULT_ZOOM: u8 = 10;

/// Values the page needs beyond the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    /// Map provider API key, placed in the script URL.
    pub api_key: String,
    pub zoom: u8,
    pub title: String,
}

impl PageOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            zoom: DEFAULT_ZOOM,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// `{"Open": "red", ...}` in canonical class order.
struct ColorTable;

impl Serialize for ColorTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EncryptionClass::ALL.len()))?;
        for class in EncryptionClass::ALL {
            map.serialize_entry(class.label(), class.color())?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Renders the complete page. Pure: identical inputs give identical bytes.
pub fn render_page(
    grouped: &GroupedObservations,
    center: &MapCenter,
    options: &PageOptions,
) -> Result<String, MapError> {
    let grouped_json =
        serde_json::to_string(grouped).map_err(|e| MapError::Render(e.to_string()))?;
    let colors_json =
        serde_json::to_string(&ColorTable).map_err(|e| MapError::Render(e.to_string()))?;
    let center_lat =
        serde_json::to_string(&center.latitude).map_err(|e| MapError::Render(e.to_string()))?;
    let center_lng =
        serde_json::to_string(&center.longitude).map_err(|e| MapError::Render(e.to_string()))?;

    let script_src = format!("{}?key={}", MAPS_SCRIPT_URL, percent_encode(&options.api_key));

    // Title goes last so operator text is never scanned for placeholders.
    Ok(PAGE_TEMPLATE
        .replace("{{SCRIPT_SRC}}", &escape_html(&script_src))
        .replace("{{CENTER_LAT}}", &center_lat)
        .replace("{{CENTER_LNG}}", &center_lng)
        .replace("{{ZOOM}}", &options.zoom.to_string())
        .replace("{{GROUPED_DATA}}", &grouped_json)
        .replace("{{COLORS}}", &colors_json)
        .replace("{{TITLE}}", &escape_html(&options.title)))
}

/// Writes `html` to `path`, replacing any existing file.
///
/// The document goes to a sibling temporary file first and is renamed over
/// the target, so a failed write never leaves a truncated page behind.
pub fn write_page(path: &Path, html: &str) -> Result<(), MapError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| MapError::Io(format!("output path {} has no file name", path.display())))?;

    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp_path, html) {
        let _ = fs::remove_file(&tmp_path);
        return Err(MapError::Io(format!("cannot write {}: {}", tmp_path.display(), e)));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        MapError::Io(format!("cannot replace {}: {}", path.display(), e))
    })
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{{TITLE}}</title>
    <script src="{{SCRIPT_SRC}}"></script>
    <style>
        body {
            font-family: 'Arial', sans-serif;
            margin: 0;
            padding: 0;
            height: 100%;
            display: flex;
            flex-direction: column;
            justify-content: space-between;
        }
        #map {
            height: 90vh;
            width: 100%;
        }
        #menu {
            display: flex;
            justify-content: center;
            align-items: center;
            background-color: white;
            padding: 10px;
            border-bottom: 1px solid #ddd;
            box-shadow: 0 2px 6px rgba(0,0,0,0.3);
        }
        #menu button {
            margin: 0 5px;
            padding: 10px 20px;
            border: none;
            border-radius: 3px;
            background-color: #007BFF;
            color: white;
            cursor: pointer;
        }
        #menu button:hover {
            background-color: #0056b3;
        }
        #counter {
            text-align: center;
            font-size: 24px;
            font-weight: bold;
            color: #333;
            margin-top: 20px;
            padding: 10px;
            background-color: #f8f9fa;
            border-radius: 5px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
            width: 100%;
            display: flex;
            justify-content: center;
            align-items: center;
        }
    </style>
</head>
<body>
    <div id="menu"></div>
    <div id="counter">Showing: 0 markers</div>
    <div id="map"></div>
    <script>
        const groupedData = {{GROUPED_DATA}};
        const colors = {{COLORS}};
        const markerGroups = {};
        let map;

        function visibleMarkerCount() {
            let count = 0;
            for (const group in markerGroups) {
                count += markerGroups[group].filter(marker => marker.getMap() === map).length;
            }
            return count;
        }

        function updateMarkerCount() {
            document.getElementById('counter').textContent =
                "Showing: " + visibleMarkerCount() + " markers";
        }

        function showOnlyMarkers(groupName) {
            for (const group in markerGroups) {
                const visible = groupName === "ALL" || group === groupName;
                markerGroups[group].forEach(marker => marker.setMap(visible ? map : null));
            }
            updateMarkerCount();
        }

        function initMap() {
            map = new google.maps.Map(document.getElementById('map'), {
                center: {lat: {{CENTER_LAT}}, lng: {{CENTER_LNG}}},
                zoom: {{ZOOM}}
            });

            for (const [groupName, locations] of Object.entries(groupedData)) {
                const color = colors[groupName];
                markerGroups[groupName] = locations.map(([lat, lng]) => new google.maps.Marker({
                    position: {lat, lng},
                    map: map,
                    icon: {
                        path: google.maps.SymbolPath.BACKWARD_CLOSED_ARROW,
                        scale: 3,
                        fillColor: color,
                        fillOpacity: 1,
                        strokeWeight: 1
                    }
                }));
            }

            const menu = document.getElementById('menu');
            ["ALL", ...Object.keys(groupedData)].forEach(groupName => {
                const button = document.createElement('button');
                button.textContent = groupName;
                button.onclick = () => showOnlyMarkers(groupName);
                menu.appendChild(button);
            });

            showOnlyMarkers("ALL");
        }

        window.onload = initMap;
    </script>
</body>
</html>
"#;

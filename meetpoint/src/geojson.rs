//! GeoJSON export of a meeting plan.
//!
//! Turns a [`MeetingPlan`] into a `FeatureCollection` any web map can draw:
//! one Point feature per input labelled `Point {i}`, plus a distinguished
//! midpoint marker. Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use meetpoint::geojson::plan_to_feature_collection;
//!
//! let plan = planner.plan("849VCWC8+R9\n849VCWG9+5X")?;
//! let collection = plan_to_feature_collection(&plan);
//! std::fs::write("meeting.geojson", serde_json::to_string_pretty(&collection)?)?;
//! ```

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::coord::{BoundingBox, Coordinate};
use crate::planner::MeetingPlan;
use crate::report::point_label;

/// Label of the midpoint feature.
pub const MIDPOINT_LABEL: &str = "Midpoint";

/// Marker color used for the midpoint.
pub const MIDPOINT_COLOR: &str = "red";

/// Build the map FeatureCollection for `plan`.
///
/// Input features carry `label`, `code` and `distance_km` properties. The
/// midpoint feature is last and carries `label = "Midpoint"`,
/// `role = "midpoint"` and `marker-color = "red"`. The collection's bbox
/// encloses the inputs and the midpoint.
pub fn plan_to_feature_collection(plan: &MeetingPlan) -> FeatureCollection {
    let midpoint = plan.midpoint();

    let mut features: Vec<Feature> = plan
        .coordinates
        .iter()
        .enumerate()
        .map(|(i, &coord)| {
            let mut properties = JsonObject::new();
            properties.insert("label".to_string(), JsonValue::from(point_label(i)));
            if let Some(code) = plan.resolved_codes.get(i) {
                properties.insert("code".to_string(), JsonValue::from(code.as_str()));
            }
            if let Some(entry) = plan.report.get(i) {
                properties.insert("distance_km".to_string(), JsonValue::from(entry.distance_km));
            }
            point_feature(coord, properties)
        })
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("label".to_string(), JsonValue::from(MIDPOINT_LABEL));
    properties.insert("role".to_string(), JsonValue::from("midpoint"));
    properties.insert("marker-color".to_string(), JsonValue::from(MIDPOINT_COLOR));
    features.push(point_feature(midpoint, properties));

    let bbox = BoundingBox::enclosing(&plan.coordinates)
        .map(|bbox| bbox.including(midpoint).to_geojson_bbox());

    FeatureCollection {
        bbox,
        features,
        foreign_members: None,
    }
}

/// A Point geometry in GeoJSON `[lng, lat]` order.
pub fn point_geometry(coord: Coordinate) -> Geometry {
    Geometry::new(Value::Point(vec![coord.lng(), coord.lat()]))
}

fn point_feature(coord: Coordinate, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(point_geometry(coord)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::MeetingPlanner;

    fn plan() -> MeetingPlan {
        MeetingPlanner::builder()
            .build()
            .unwrap()
            .plan("40.0,-75.0\nnowhere\n41.0,-74.0")
            .unwrap()
    }

    fn property<'a>(feature: &'a Feature, key: &str) -> &'a JsonValue {
        feature.properties.as_ref().unwrap().get(key).unwrap()
    }

    #[test]
    fn test_point_geometry_is_lng_lat() {
        let geometry = point_geometry(Coordinate::new(35.3606, 138.7274).unwrap());
        match geometry.value {
            Value::Point(coords) => assert_eq!(coords, vec![138.7274, 35.3606]),
            _ => panic!("Expected Point"),
        }
    }

    #[test]
    fn test_feature_per_input_plus_midpoint() {
        let plan = plan();
        let collection = plan_to_feature_collection(&plan);

        assert_eq!(collection.features.len(), 3);

        let first = &collection.features[0];
        assert_eq!(property(first, "label"), "Point 1");
        assert_eq!(property(first, "code"), "40.0,-75.0");
        assert_eq!(property(first, "distance_km"), &JsonValue::from(plan.report[0].distance_km));

        let second = &collection.features[1];
        assert_eq!(property(second, "label"), "Point 2");
        assert_eq!(property(second, "code"), "41.0,-74.0");
    }

    #[test]
    fn test_midpoint_feature() {
        let plan = plan();
        let collection = plan_to_feature_collection(&plan);
        let midpoint = collection.features.last().unwrap();

        assert_eq!(property(midpoint, "label"), "Midpoint");
        assert_eq!(property(midpoint, "role"), "midpoint");
        assert_eq!(property(midpoint, "marker-color"), "red");

        match &midpoint.geometry.as_ref().unwrap().value {
            Value::Point(coords) => {
                assert_eq!(coords[0], plan.midpoint().lng());
                assert_eq!(coords[1], plan.midpoint().lat());
            }
            _ => panic!("Expected Point"),
        }
    }

    #[test]
    fn test_bbox_encloses_inputs() {
        let collection = plan_to_feature_collection(&plan());
        assert_eq!(collection.bbox, Some(vec![-75.0, 40.0, -74.0, 41.0]));
    }

    #[test]
    fn test_serializes_as_feature_collection() {
        let json = serde_json::to_value(plan_to_feature_collection(&plan())).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["type"], "Point");
    }
}

//! Trip preference form.
//!
//! Not a flow: the form is validated locally before the planner calls any
//! backend, but it uses the same schema machinery so that each multi-select
//! field reports its own targeted message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result, RoadhogError,
    schema::{ObjectSchema, Schema, validate},
};

/// Name reported on validation errors of the form.
pub const FORM: &str = "tripPreferences";

pub const TRIP_TYPE_OPTIONS: [&str; 4] = ["Business", "Leisure", "Family Vacation", "Just Exploring"];
pub const VEHICLE_TYPE_OPTIONS: [&str; 7] = ["Car", "Van", "RV", "Truck", "Rental", "Toy Hauler", "5th Wheel"];
pub const INTEREST_OPTIONS: [&str; 8] = ["Relax", "Shopping", "Hiking", "Biking", "Water Sports", "Sporting Events", "Concerts", "Comedy"];
pub const LODGING_OPTIONS: [&str; 5] = ["Hotel", "RV Park", "Glamping", "Camping", "Free Places to Stay (e.g., Cracker Barrel)"];
pub const MEMBERSHIP_OPTIONS: [&str; 4] = ["Military", "Elks Lodge", "KOA", "Harvest Host"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripPreferences {
    pub trip_type: Vec<String>,
    pub vehicle_type: Vec<String>,
    pub interests: Vec<String>,
    pub lodging_preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lodging_memberships: Option<Vec<String>>,
}

pub fn trip_preferences_schema() -> Schema {
    ObjectSchema::new()
        .required("tripType", Schema::non_empty_array(Schema::string(), Some("Please select at least one trip type.")), "")
        .required("vehicleType", Schema::non_empty_array(Schema::string(), Some("Please select a vehicle type.")), "")
        .required("interests", Schema::non_empty_array(Schema::string(), Some("Please select at least one interest.")), "")
        .required(
            "lodgingPreferences",
            Schema::non_empty_array(Schema::string(), Some("Please select at least one lodging preference.")),
            "",
        )
        .optional("lodgingMemberships", Schema::optional(Schema::array(Schema::string())), "")
        .into()
}

/// Validates submitted form data.
///
/// Every violated field is reported at once, each with the message the form
/// shows next to that field.
pub fn validate_trip_preferences(value: &Value) -> Result<TripPreferences> {
    let value = validate(&trip_preferences_schema(), value).map_err(|violations| RoadhogError::InputValidation {
        flow: FORM.to_string(),
        violations,
    })?;
    serde_json::from_value(value).map_err(|err| RoadhogError::Convert(format!("{}: {}", FORM, err)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::ViolationKind;

    #[test]
    fn test_valid_preferences() {
        let prefs = validate_trip_preferences(&json!({
            "tripType": ["Leisure"],
            "vehicleType": ["RV"],
            "interests": ["Hiking", "Concerts"],
            "lodgingPreferences": ["RV Park"],
            "lodgingMemberships": ["KOA"]
        }))
        .unwrap();
        assert_eq!(prefs.vehicle_type, vec!["RV"]);
        assert_eq!(prefs.lodging_memberships, Some(vec!["KOA".to_string()]));
    }

    #[test]
    fn test_memberships_are_optional() {
        let prefs = validate_trip_preferences(&json!({
            "tripType": ["Business"],
            "vehicleType": ["Car"],
            "interests": ["Relax"],
            "lodgingPreferences": ["Hotel"]
        }))
        .unwrap();
        assert_eq!(prefs.lodging_memberships, None);
    }

    #[test]
    fn test_empty_trip_type_names_field() {
        let err = validate_trip_preferences(&json!({
            "tripType": [],
            "vehicleType": ["Car"],
            "interests": ["Relax"],
            "lodgingPreferences": ["Hotel"]
        }))
        .unwrap_err();

        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field(), "tripType");
        assert_eq!(
            violations[0].kind,
            ViolationKind::EmptySelection {
                message: "Please select at least one trip type.".to_string()
            }
        );
        assert_eq!(violations[0].to_string(), "tripType: Please select at least one trip type.");
    }

    #[test]
    fn test_every_empty_field_reported() {
        let err = validate_trip_preferences(&json!({
            "tripType": [],
            "vehicleType": [],
            "interests": [],
            "lodgingPreferences": []
        }))
        .unwrap_err();

        let fields: Vec<&str> = err.violations().iter().map(|v| v.field()).collect();
        assert_eq!(fields, vec!["tripType", "vehicleType", "interests", "lodgingPreferences"]);
        assert!(matches!(err, RoadhogError::InputValidation { ref flow, .. } if flow == FORM));
    }

    #[test]
    fn test_options_are_accepted() {
        let prefs = TripPreferences {
            trip_type: TRIP_TYPE_OPTIONS.iter().map(|s| s.to_string()).collect(),
            vehicle_type: vec![VEHICLE_TYPE_OPTIONS[6].to_string()],
            interests: vec![INTEREST_OPTIONS[0].to_string()],
            lodging_preferences: vec![LODGING_OPTIONS[4].to_string()],
            lodging_memberships: Some(MEMBERSHIP_OPTIONS.iter().map(|s| s.to_string()).collect()),
        };
        let value = serde_json::to_value(&prefs).unwrap();
        assert_eq!(validate_trip_preferences(&value).unwrap(), prefs);
    }
}

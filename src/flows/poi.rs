//! Point-of-interest flows: review summaries and alternatives for closed places.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, TypedFlow},
    schema::{ObjectSchema, Schema},
    template::Template,
};

pub const SUMMARIZE_REVIEWS: &str = "summarizePoiReviewsFlow";
pub const SUGGEST_ALTERNATIVE: &str = "suggestAlternativePoiFlow";

pub const SUMMARIZE_REVIEWS_FLOW: TypedFlow<ReviewsRequest, ReviewSummary> = TypedFlow::new(SUMMARIZE_REVIEWS);
pub const SUGGEST_ALTERNATIVE_FLOW: TypedFlow<AlternativePoiRequest, AlternativePoiSuggestion> = TypedFlow::new(SUGGEST_ALTERNATIVE);

const SUMMARIZE_PROMPT: &str = "You summarize user reviews of a point of interest (POI).

Summarize these reviews of {{poiName}}:

Reviews: {{{reviews}}}

Summary: ";

const ALTERNATIVE_PROMPT: &str = "You are the travel assistant of the RoadHog app. The user's chosen point of interest (POI) is closed because {{{reasonClosed}}}, and they need an alternative.

Using the user profile, the original POI and the reason for the closure, suggest an alternative POI that matches the user's interests and offers a similar experience.

User Profile:
{{#if userProfile.avatar}}Avatar: {{userProfile.avatar}}
{{/if}}{{#if userProfile.vehicleDetails}}Vehicle Details:
  Make: {{userProfile.vehicleDetails.make}}
  Model: {{userProfile.vehicleDetails.model}}
  Fuel Type: {{userProfile.vehicleDetails.fuelType}}
  MPG: {{userProfile.vehicleDetails.mpg}}
{{/if}}{{#if userProfile.homeLocation}}Home Location: {{userProfile.homeLocation}}
{{/if}}Hobbies and Interests:
{{#each userProfile.hobbiesAndInterests}}- {{{this}}}
{{/each}}{{#if userProfile.socialMediaLinks}}Social Media Links:
{{#if userProfile.socialMediaLinks.instagram}}  Instagram: {{userProfile.socialMediaLinks.instagram}}
{{/if}}{{#if userProfile.socialMediaLinks.facebook}}  Facebook: {{userProfile.socialMediaLinks.facebook}}
{{/if}}{{#if userProfile.socialMediaLinks.tiktok}}  TikTok: {{userProfile.socialMediaLinks.tiktok}}
{{/if}}{{#if userProfile.socialMediaLinks.linkedin}}  LinkedIn: {{userProfile.socialMediaLinks.linkedin}}
{{/if}}{{/if}}
Original POI:
Name: {{originalPoi.name}}
Type: {{originalPoi.type}}
{{#if originalPoi.description}}Description: {{originalPoi.description}}
{{/if}}Location: {{originalPoi.location}}
{{#if originalPoi.cuisine}}Cuisine: {{originalPoi.cuisine}}
{{/if}}
Describe the alternative with its name, type, description, location and reasonRecommended (why it suits this user given their profile and the original POI).
";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsRequest {
    pub poi_name: String,
    pub reviews: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub summary: String,
}

/// Vehicle as stored on a profile; every detail may be missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileVehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpg: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SocialMediaLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_details: Option<ProfileVehicle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_location: Option<String>,
    pub hobbies_and_interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media_links: Option<SocialMediaLinks>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OriginalPoi {
    pub name: String,
    #[serde(rename = "type")]
    pub poi_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativePoiRequest {
    pub user_profile: UserProfile,
    pub original_poi: OriginalPoi,
    pub reason_closed: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativePoi {
    pub name: String,
    #[serde(rename = "type")]
    pub poi_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    pub reason_recommended: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativePoiSuggestion {
    pub alternative_poi: AlternativePoi,
}

fn optional_string(
    schema: ObjectSchema,
    name: &str,
    description: &str,
) -> ObjectSchema {
    schema.optional(name, Schema::optional(Schema::string()), description)
}

pub fn reviews_input_schema() -> Schema {
    ObjectSchema::new()
        .required("poiName", Schema::string(), "The name of the point of interest.")
        .required("reviews", Schema::string(), "User reviews of the point of interest.")
        .into()
}

pub fn reviews_output_schema() -> Schema {
    ObjectSchema::new().required("summary", Schema::string(), "Summary of the user reviews.").into()
}

pub fn alternative_input_schema() -> Schema {
    let vehicle = ObjectSchema::new();
    let vehicle = optional_string(vehicle, "make", "Vehicle make.");
    let vehicle = optional_string(vehicle, "model", "Vehicle model.");
    let vehicle = optional_string(vehicle, "fuelType", "Fuel type.");
    let vehicle = vehicle.optional("mpg", Schema::optional(Schema::number()), "Miles per gallon.");

    let links = ObjectSchema::new();
    let links = optional_string(links, "instagram", "Instagram profile URL.");
    let links = optional_string(links, "facebook", "Facebook profile URL.");
    let links = optional_string(links, "tiktok", "TikTok profile URL.");
    let links = optional_string(links, "linkedin", "LinkedIn profile URL.");

    let profile = optional_string(ObjectSchema::new(), "avatar", "URL of the user's avatar image.")
        .optional("vehicleDetails", Schema::optional(vehicle.into()), "Vehicle details of the user.")
        .optional("homeLocation", Schema::optional(Schema::string()), "Home location of the user.")
        .required("hobbiesAndInterests", Schema::array(Schema::string()), "Hobbies and interests of the user.")
        .optional("socialMediaLinks", Schema::optional(links.into()), "Social media links of the user.");

    let poi = ObjectSchema::new()
        .required("name", Schema::string(), "Name of the closed point of interest.")
        .required("type", Schema::string(), "Type of the place, e.g. restaurant, hotel, event.");
    let poi = optional_string(poi, "description", "Description of the place.")
        .required("location", Schema::string(), "Location of the place.");
    let poi = optional_string(poi, "cuisine", "Cuisine, if the place is a restaurant.");

    ObjectSchema::new()
        .required("userProfile", profile.into(), "The user's profile.")
        .required("originalPoi", poi.into(), "The point of interest that is closed.")
        .required("reasonClosed", Schema::string(), "Why the original place is closed.")
        .into()
}

pub fn alternative_output_schema() -> Schema {
    let poi = ObjectSchema::new()
        .required("name", Schema::string(), "Name of the alternative.")
        .required("type", Schema::string(), "Type of the alternative.");
    let poi = optional_string(poi, "description", "Description of the alternative.")
        .required("location", Schema::string(), "Location of the alternative.")
        .required("reasonRecommended", Schema::string(), "Why this place is recommended for the user.");

    ObjectSchema::new().required("alternativePoi", poi.into(), "The suggested alternative.").into()
}

pub fn summarize_reviews_definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(
        SUMMARIZE_REVIEWS,
        reviews_input_schema(),
        reviews_output_schema(),
        Template::parse(SUMMARIZE_PROMPT)?,
    )
    .with_description("Summarizes user reviews of a point of interest."))
}

pub fn alternative_definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(
        SUGGEST_ALTERNATIVE,
        alternative_input_schema(),
        alternative_output_schema(),
        Template::parse(ALTERNATIVE_PROMPT)?,
    )
    .with_description("Suggests an alternative when a point of interest is closed."))
}

pub async fn summarize_poi_reviews(
    executor: &FlowExecutor,
    request: &ReviewsRequest,
) -> Result<ReviewSummary> {
    SUMMARIZE_REVIEWS_FLOW.invoke(executor, request).await
}

pub async fn suggest_alternative_poi(
    executor: &FlowExecutor,
    request: &AlternativePoiRequest,
) -> Result<AlternativePoiSuggestion> {
    SUGGEST_ALTERNATIVE_FLOW.invoke(executor, request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{RoadhogError, backend::MockBackend, flows::testing};

    fn request(profile: UserProfile) -> AlternativePoiRequest {
        AlternativePoiRequest {
            user_profile: profile,
            original_poi: OriginalPoi {
                name: "Desert Bistro".to_string(),
                poi_type: "restaurant".to_string(),
                description: None,
                location: "Moab, UT".to_string(),
                cuisine: Some("Southwestern".to_string()),
            },
            reason_closed: "a kitchen fire".to_string(),
        }
    }

    #[tokio::test]
    async fn test_summarize_reviews() {
        let backend = Arc::new(MockBackend::new().respond(json!({"summary": "Great views, long lines."})));
        let exec = testing::executor(backend.clone());

        let summary = summarize_poi_reviews(
            &exec,
            &ReviewsRequest {
                poi_name: "Delicate Arch".to_string(),
                reviews: "Stunning. <b>Crowded</b> at sunset.".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.summary, "Great views, long lines.");
        let prompt = &backend.requests()[0].prompt;
        assert!(prompt.contains("Summarize these reviews of Delicate Arch:"));
        assert!(prompt.contains("Reviews: Stunning. <b>Crowded</b> at sunset."));
    }

    #[tokio::test]
    async fn test_alternative_with_sparse_profile() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "alternativePoi": {
                "name": "Moab Brewery",
                "type": "restaurant",
                "location": "Moab, UT",
                "reasonRecommended": "Local food after a day of hiking."
            }
        })));
        let exec = testing::executor(backend.clone());

        let profile = UserProfile {
            hobbies_and_interests: vec!["Hiking".to_string(), "Craft Beer".to_string()],
            ..UserProfile::default()
        };
        let suggestion = suggest_alternative_poi(&exec, &request(profile)).await.unwrap();
        assert_eq!(suggestion.alternative_poi.name, "Moab Brewery");
        assert_eq!(suggestion.alternative_poi.description, None);

        let prompt = &backend.requests()[0].prompt;
        assert!(prompt.contains("closed because a kitchen fire"));
        assert!(prompt.contains("- Hiking\n- Craft Beer\n"));
        assert!(prompt.contains("Cuisine: Southwestern"));
        assert!(!prompt.contains("Avatar:"));
        assert!(!prompt.contains("Vehicle Details:"));
        assert!(!prompt.contains("Social Media Links:"));
        assert!(!prompt.contains("Description:"));
    }

    #[tokio::test]
    async fn test_alternative_with_full_profile() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "alternativePoi": {
                "name": "Sabaku Sushi",
                "type": "restaurant",
                "description": "Sushi in the desert.",
                "location": "Moab, UT",
                "reasonRecommended": "Open late."
            }
        })));
        let exec = testing::executor(backend.clone());

        let profile = UserProfile {
            avatar: Some("https://example.com/a.png".to_string()),
            vehicle_details: Some(ProfileVehicle {
                make: Some("Ford".to_string()),
                mpg: Some(22.0),
                ..ProfileVehicle::default()
            }),
            home_location: Some("Denver, CO".to_string()),
            hobbies_and_interests: vec![],
            social_media_links: Some(SocialMediaLinks {
                instagram: Some("https://instagram.com/roadie".to_string()),
                ..SocialMediaLinks::default()
            }),
        };
        suggest_alternative_poi(&exec, &request(profile)).await.unwrap();

        let prompt = &backend.requests()[0].prompt;
        assert!(prompt.contains("Avatar: https://example.com/a.png"));
        assert!(prompt.contains("Make: Ford\n  Model: \n"));
        assert!(prompt.contains("MPG: 22"));
        assert!(prompt.contains("Home Location: Denver, CO"));
        assert!(prompt.contains("Instagram: https://instagram.com/roadie"));
        assert!(!prompt.contains("Facebook:"));
    }

    #[tokio::test]
    async fn test_null_optional_fields_are_accepted() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "alternativePoi": {"name": "n", "type": "t", "description": null, "location": "l", "reasonRecommended": "r"}
        })));
        let exec = testing::executor(backend);

        let input = json!({
            "userProfile": {"hobbiesAndInterests": [], "vehicleDetails": null},
            "originalPoi": {"name": "x", "type": "museum", "location": "y", "cuisine": null},
            "reasonClosed": "renovation"
        });
        let output = exec.invoke(SUGGEST_ALTERNATIVE, Some(input)).await.unwrap();
        assert_eq!(output["alternativePoi"]["description"], json!(null));
    }

    #[tokio::test]
    async fn test_missing_hobbies_is_rejected() {
        let backend = Arc::new(MockBackend::new());
        let exec = testing::executor(backend.clone());

        let input = json!({
            "userProfile": {},
            "originalPoi": {"name": "x", "type": "museum", "location": "y"},
            "reasonClosed": "renovation"
        });
        let err = exec.invoke(SUGGEST_ALTERNATIVE, Some(input)).await.unwrap_err();
        assert!(matches!(err, RoadhogError::InputValidation { .. }));
        assert_eq!(err.violations()[0].path, "userProfile.hobbiesAndInterests");
        assert_eq!(backend.calls(), 0);
    }
}

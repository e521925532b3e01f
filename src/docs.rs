use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Tubely", description = "Video upload and publishing API"),
    paths(
        crate::routes::health,
        crate::modules::video::handler::upload_video,
    ),
    components(
        schemas(
            crate::routes::HealthStatus,
            crate::modules::video::model::Video,
            crate::modules::video::dto::UploadVideoForm,
            crate::modules::video::geometry::AspectClass,
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Video", description = "Upload, optimize and publish videos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the JWT bearer scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_upload_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/videos/{id}/upload"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}

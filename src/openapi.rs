use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::booking::BookingStatus;
use crate::handlers::ProfileUpdate;
use crate::models::{
    BookingResult, Class, ClassLevel, FilterState, Notification, NotificationKind, User,
};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_classes,
        crate::handlers::get_class,
        crate::handlers::list_instructors,
        crate::handlers::book_class,
        crate::handlers::list_notifications,
        crate::handlers::get_profile,
        crate::handlers::update_profile
    ),
    components(schemas(
        Class,
        ClassLevel,
        FilterState,
        User,
        BookingResult,
        BookingStatus,
        Notification,
        NotificationKind,
        ProfileUpdate
    )),
    tags(
        (name = "classes", description = "Class catalogue and filtering"),
        (name = "booking", description = "Optimistic class booking"),
        (name = "profile", description = "User profile"),
        (name = "health", description = "Liveness and readiness")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;
use mongodb::bson::oid::ObjectId;

use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::models::Role;
use crate::services::JwtService;

/// Identity decoded from the bearer token
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = &'static str;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(jwt) = req.rocket().state::<JwtService>() else {
            return Outcome::Error((Status::InternalServerError, "Token service unavailable"));
        };

        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => match jwt.verify_token(token) {
                Ok(claims) => match claims.user_id() {
                    Some(user_id) => Outcome::Success(AuthGuard {
                        user_id,
                        role: claims.role,
                    }),
                    None => Outcome::Error((Status::Unauthorized, "Invalid token")),
                },
                Err(_) => Outcome::Error((Status::Unauthorized, "Invalid token")),
            },
            None => Outcome::Error((Status::Unauthorized, "No token provided")),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let scheme = SecurityScheme {
            description: Some("JWT issued by /auth/register or /auth/login".to_owned()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_owned(),
                bearer_format: Some("JWT".to_owned()),
            },
            extensions: Object::default(),
        };

        let mut requirement = SecurityRequirement::new();
        requirement.insert("BearerAuth".to_owned(), Vec::new());

        Ok(RequestHeaderInput::Security(
            "BearerAuth".to_owned(),
            scheme,
            requirement,
        ))
    }
}

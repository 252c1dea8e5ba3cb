//! Visitor identity extractor.
//!
//! Every request to the account pages carries a session. The extractor reads
//! the signed-in user (if any) and the visitor id that selects the visitor's
//! store, minting a visitor id on first contact.
//!
//! It deliberately does not reject anonymous visitors: the profile screen
//! itself decides to redirect them to the login page.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::UserInfo;
use crate::models::session_keys;

/// The current visitor: session handle, visitor id, and signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(visitor: CurrentVisitor) -> impl IntoResponse {
///     match visitor.user_info {
///         Some(user) => format!("Hello, {}!", user.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct CurrentVisitor {
    pub session: Session,
    pub visitor_id: String,
    pub user_info: Option<UserInfo>,
}

/// Error returned when the session layer is missing or the store failed.
#[derive(Debug)]
pub enum VisitorRejection {
    /// No `SessionManagerLayer` in front of the handler.
    MissingSession,
    /// The session store could not be read or written.
    Session(tower_sessions::session::Error),
}

impl IntoResponse for VisitorRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => {
                tracing::error!("Session layer missing - middleware misconfigured");
            }
            Self::Session(e) => {
                tracing::error!(error = %e, "Session store error");
            }
        }
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentVisitor
where
    S: Send + Sync,
{
    type Rejection = VisitorRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(VisitorRejection::MissingSession)?;

        let visitor_id = visitor_id(&session)
            .await
            .map_err(VisitorRejection::Session)?;

        let user_info = session
            .get::<UserInfo>(session_keys::USER_INFO)
            .await
            .map_err(VisitorRejection::Session)?;

        Ok(Self {
            session,
            visitor_id,
            user_info,
        })
    }
}

/// Read the visitor id, creating one on first contact.
async fn visitor_id(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(id) = session.get::<String>(session_keys::VISITOR_ID).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    session.insert(session_keys::VISITOR_ID, &id).await?;
    Ok(id)
}

/// Store the signed-in user's identity in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_user_info(
    session: &Session,
    user_info: &UserInfo,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER_INFO, user_info).await
}

/// Sign the visitor out: forget the identity and the visitor id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_user_info(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserInfo>(session_keys::USER_INFO).await?;
    session.remove::<String>(session_keys::VISITOR_ID).await?;
    Ok(())
}

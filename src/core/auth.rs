//! Caller identity and authorization
//!
//! Token verification happens upstream. An [`AuthProvider`] turns what the
//! upstream collaborator forwards into an [`AuthContext`] (`{id, role}`), the
//! `resolve_caller` middleware stores it on the request, and handlers read it
//! back with the [`Caller`] extractor.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{ShopError, ShopResult};
use crate::core::service::UserStore;
use crate::entities::Role;

/// Header carrying the user id verified by the upstream identity service
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// Authenticated storefront customer
    Customer { user_id: Uuid },

    /// Back-office administrator
    Admin { admin_id: Uuid },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    pub fn for_user(user_id: Uuid, role: Role) -> Self {
        match role {
            Role::Admin => AuthContext::Admin { admin_id: user_id },
            Role::Customer => AuthContext::Customer { user_id },
        }
    }

    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthContext::Anonymous)
    }

    /// Get the caller's user id, for customers and admins alike
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::Customer { user_id } => Some(*user_id),
            AuthContext::Admin { admin_id } => Some(*admin_id),
            AuthContext::Anonymous => None,
        }
    }

    /// Whether the caller may act on a resource owned by `owner`
    pub fn can_access(&self, owner: &Uuid) -> bool {
        AuthPolicy::OwnerOrAdmin(*owner).check(self)
    }

    /// Fail with `Unauthorized` for anonymous callers
    pub fn require_user(&self) -> ShopResult<Uuid> {
        match self.user_id() {
            Some(id) if AuthPolicy::Authenticated.check(self) => Ok(id),
            _ => Err(ShopError::unauthorized("Please sign in to access this resource")),
        }
    }

    /// Fail with `Forbidden` unless the caller is an admin
    pub fn require_admin(&self, action: &str) -> ShopResult<()> {
        if AuthPolicy::AdminOnly.check(self) {
            Ok(())
        } else {
            Err(ShopError::forbidden(format!("Not authorized to {}", action)))
        }
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Any authenticated user
    Authenticated,

    /// Admin only
    AdminOnly,

    /// The owner of a resource, or an admin
    OwnerOrAdmin(Uuid),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Authenticated => context.is_authenticated(),

            AuthPolicy::AdminOnly => context.is_admin(),

            AuthPolicy::OwnerOrAdmin(owner) => match context {
                AuthContext::Admin { .. } => true,
                AuthContext::Customer { user_id } => user_id == owner,
                AuthContext::Anonymous => false,
            },
        }
    }
}

/// Trait for identity resolvers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Build the caller's context from request headers
    ///
    /// Returns `Anonymous` when the request carries no identity, and an
    /// `Unauthorized` error when it carries one that cannot be trusted.
    async fn resolve(&self, headers: &HeaderMap) -> ShopResult<AuthContext>;
}

/// Trusts the user id forwarded by the gateway and looks the role up locally
///
/// The role is never taken from the request: it comes from the stored user,
/// and unknown or deactivated users are rejected.
pub struct GatewayAuthProvider {
    users: Arc<dyn UserStore>,
}

impl GatewayAuthProvider {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AuthProvider for GatewayAuthProvider {
    async fn resolve(&self, headers: &HeaderMap) -> ShopResult<AuthContext> {
        let Some(raw) = headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ShopError::unauthorized("Invalid caller identity"))?;

        let user = self
            .users
            .get_user(&user_id)
            .await?
            .ok_or_else(|| ShopError::unauthorized("The user for this session no longer exists"))?;

        if !user.is_active {
            return Err(ShopError::unauthorized("This account has been deactivated"));
        }

        Ok(AuthContext::for_user(user.id, user.role))
    }
}

/// Default no-auth provider: every request is anonymous
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn resolve(&self, _headers: &HeaderMap) -> ShopResult<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

/// Middleware resolving the caller once per request
pub async fn resolve_caller(
    State(provider): State<Arc<dyn AuthProvider>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ShopError> {
    let context = provider.resolve(req.headers()).await?;
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Extractor for an authenticated caller
///
/// Rejects anonymous requests with `401`.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or(AuthContext::Anonymous);

        context.require_user()?;
        Ok(Caller(context))
    }
}

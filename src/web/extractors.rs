//! Request extractors shared by the route modules.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};

use crate::web::AppError;

/// Where the client address of a request is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientAddressSource {
    /// The TCP peer of the connection.
    #[default]
    Peer,
    /// The first `X-Forwarded-For` hop, falling back to the peer. Only sound
    /// behind a proxy that overwrites the header.
    ForwardedFor,
}

impl ClientAddressSource {
    pub fn from_trust_flag(trust_forwarded_for: bool) -> Self {
        if trust_forwarded_for {
            ClientAddressSource::ForwardedFor
        } else {
            ClientAddressSource::Peer
        }
    }
}

/// Identity of the submitting client, used as the owner of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
    ClientAddressSource: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if ClientAddressSource::from_ref(state) == ClientAddressSource::ForwardedFor {
            if let Some(forwarded) = forwarded_client(&parts.headers) {
                return Ok(OwnerId(forwarded));
            }
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| OwnerId(addr.ip().to_string()))
            .ok_or_else(|| {
                AppError::InternalServerError("Unable to determine client address".to_string())
            })
    }
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first_hop = value.split(',').next()?.trim();
    (!first_hop.is_empty()).then(|| first_hop.to_string())
}

/// Token carried as `Authorization: Bearer <token>`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

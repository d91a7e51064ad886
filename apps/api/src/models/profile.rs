//! Profile and authentication models
//!
//! This module contains the database models for:
//! - User profiles with privilege flags
//! - Sessions
//! - JWT claims and token structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User profile from the profiles table
///
/// `is_godmode` grants administrative actions; `is_authorized` grants
/// upload rights. Both are re-read from the database before every
/// privileged mutation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    /// Unique profile identifier
    pub id: Uuid,

    /// Display/login name (unique)
    pub username: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2 hashed password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Elevated-privilege flag for administrative actions
    pub is_godmode: bool,

    /// Upload authorization flag
    pub is_authorized: bool,

    /// Last time the profile was seen online
    pub last_seen_at: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last profile update timestamp
    pub updated_at: DateTime<Utc>,
}

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (profile ID)
    pub sub: Uuid,

    /// Profile's email
    pub email: String,

    /// Godmode flag at token issue time (fast rejection only; privileged
    /// paths re-read the database)
    pub god: bool,

    /// Session ID
    pub sid: Uuid,

    /// Issued at timestamp (Unix epoch)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch)
    pub exp: i64,

    /// Issuer
    #[serde(default = "default_issuer")]
    pub iss: String,

    /// Audience
    #[serde(default = "default_audience")]
    pub aud: String,
}

fn default_issuer() -> String {
    "raindrops".to_string()
}

fn default_audience() -> String {
    "raindrops".to_string()
}

impl Claims {
    /// Create new claims for a profile session
    pub fn new(profile: &Profile, session_id: Uuid, access_token_ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: profile.id,
            email: profile.email.clone(),
            god: profile.is_godmode,
            sid: session_id,
            iat: now,
            exp: now + access_token_ttl_secs,
            iss: default_issuer(),
            aud: default_audience(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Refresh token claims (simpler than access token claims)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (profile ID)
    pub sub: Uuid,

    /// Session ID
    pub sid: Uuid,

    /// JWT ID - unique identifier for token rotation
    pub jti: Uuid,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Token type identifier
    pub typ: String,

    /// Issuer
    #[serde(default = "default_issuer")]
    pub iss: String,

    /// Audience
    #[serde(default = "default_audience")]
    pub aud: String,
}

impl RefreshClaims {
    /// Create new refresh token claims
    pub fn new(profile_id: Uuid, session_id: Uuid, refresh_token_ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: profile_id,
            sid: session_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + refresh_token_ttl_secs,
            typ: "refresh".to_string(),
            iss: default_issuer(),
            aud: default_audience(),
        }
    }
}

/// Authentication tokens returned after login
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Access token expiration timestamp
    pub expires_at: DateTime<Utc>,

    /// Token type (always "Bearer")
    pub token_type: &'static str,
}

impl AuthTokens {
    /// Create a new AuthTokens instance
    pub fn new(access_token: String, refresh_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            token_type: "Bearer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: "drift".to_string(),
            email: "drift@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_godmode: true,
            is_authorized: true,
            last_seen_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_claims_carry_godmode_flag() {
        let profile = test_profile();
        let claims = Claims::new(&profile, Uuid::new_v4(), 900);
        assert_eq!(claims.sub, profile.id);
        assert!(claims.god);
        assert!(!claims.is_expired());
        assert_eq!(claims.iss, "raindrops");
    }

    #[test]
    fn test_refresh_claims_rotate_jti() {
        let id = Uuid::new_v4();
        let sid = Uuid::new_v4();
        let a = RefreshClaims::new(id, sid, 3600);
        let b = RefreshClaims::new(id, sid, 3600);
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.typ, "refresh");
    }

    #[test]
    fn test_auth_tokens_type() {
        let tokens = AuthTokens::new("a".into(), "r".into(), Utc::now());
        assert_eq!(tokens.token_type, "Bearer");
    }
}

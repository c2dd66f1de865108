use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use gamehub_tracker::{
    get_or_create_voter, PrimaryKey, VotedCache, VoterIdentity, VOTED_COOKIE, VOTER_COOKIE,
    VOTER_COOKIE_MAX_AGE_DAYS,
};

use crate::{
    cookies::{read_cookie, Cookie},
    errors::{ServerError, ServerResult},
};

/// The anonymous voter behind a request.
/// A voter without a usable cookie gets a fresh identity, which
/// [Voter::cookie_headers] hands back to the client.
pub struct Voter {
    pub identity: VoterIdentity,
    /// What the client believes it voted for
    pub voted: VotedCache,
}

#[async_trait]
impl<S> FromRequestParts<S> for Voter
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = get_or_create_voter(read_cookie(&parts.headers, VOTER_COOKIE));
        let voted = VotedCache::from_cookie(read_cookie(&parts.headers, VOTED_COOKIE));

        Ok(Self { identity, voted })
    }
}

impl Voter {
    /// Brings the client hint in line with what the server knows
    pub fn record(&mut self, request_id: PrimaryKey, voted: bool) {
        if voted {
            self.voted.mark_voted(request_id)
        } else {
            self.voted.unmark_voted(request_id)
        }
    }

    /// Set-Cookie headers for a minted identity and the voted cache
    pub fn cookie_headers(&self) -> ServerResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if self.identity.fresh {
            let cookie = Cookie::new(VOTER_COOKIE, self.identity.id.as_str())
                .max_age_days(VOTER_COOKIE_MAX_AGE_DAYS)
                .to_header_value()
                .map_err(|e| ServerError::Unknown(e.to_string()))?;

            headers.append(header::SET_COOKIE, cookie);
        }

        let voted = self.voted.to_cookie_value();
        let cookie = Cookie::new(VOTED_COOKIE, &voted)
            .max_age_days(VOTER_COOKIE_MAX_AGE_DAYS)
            .to_header_value()
            .map_err(|e| ServerError::Unknown(e.to_string()))?;

        headers.append(header::SET_COOKIE, cookie);

        Ok(headers)
    }
}
